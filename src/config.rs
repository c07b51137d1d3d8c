use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::pipeline::pipeline_config::DEFAULT_LOW_CONFIDENCE_THRESHOLD;
use crate::pipeline::processing::cleaning::{CleanerRegistry, FieldAliasCleaner};
use crate::pipeline::PipelineConfig;

/// Top-level `candidate_filings.toml`
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub paths: PathsConfig,
    pub standardization: StandardizationConfig,
    /// Per-jurisdiction overrides, keyed by jurisdiction directory name
    pub jurisdictions: BTreeMap<String, JurisdictionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// One subdirectory of JSON snapshots per jurisdiction
    pub raw_dir: PathBuf,
    pub final_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            final_path: PathBuf::from("data/final/candidates.jsonl"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StandardizationConfig {
    pub low_confidence_threshold: f64,
}

impl Default for StandardizationConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct JurisdictionConfig {
    /// Source column name -> standard field name
    pub field_aliases: BTreeMap<String, String>,
}

impl JurisdictionConfig {
    /// Two source columns feeding one standard field would make the winner
    /// depend on which columns a row happens to carry.
    fn validate(&self, jurisdiction: &str) -> Result<()> {
        let mut targets = HashSet::new();
        for (source, target) in &self.field_aliases {
            if !targets.insert(target.as_str()) {
                return Err(PipelineError::Config(format!(
                    "jurisdictions.{}.field_aliases maps more than one column onto '{}' (last: '{}')",
                    jurisdiction, target, source
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.pipeline.low_confidence_threshold = config.standardization.low_confidence_threshold;
        config.pipeline.validate()?;
        for (jurisdiction, overrides) in &config.jurisdictions {
            overrides.validate(jurisdiction)?;
        }
        Ok(config)
    }

    /// Cleaner registry with a [`FieldAliasCleaner`] for every jurisdiction
    /// that declares aliases.
    pub fn cleaner_registry(&self) -> CleanerRegistry {
        let mut registry = CleanerRegistry::new();
        for (jurisdiction, overrides) in &self.jurisdictions {
            if !overrides.field_aliases.is_empty() {
                registry.register(
                    jurisdiction.as_str(),
                    Arc::new(FieldAliasCleaner::new(overrides.field_aliases.clone())),
                );
            }
        }
        registry
    }
}
