use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::pipeline::Phase;

/// Default number of jurisdictions processed at once in the fan-out phases.
pub const DEFAULT_MAX_WORKERS: usize = 4;
/// Office matches below this confidence are reported in the audit.
pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f64 = 0.85;

/// Configuration for a complete pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Skip failed jurisdictions instead of aborting the run
    pub continue_on_error: bool,
    /// Upper bound on concurrently processed jurisdictions
    pub max_workers: usize,
    pub phases: PhaseToggles,
    /// Set from the `[standardization]` table
    #[serde(skip)]
    pub low_confidence_threshold: f64,
}

/// Strategy for handling per-jurisdiction failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorHandlingStrategy {
    /// Abort the run on the first failed jurisdiction
    StopOnFirstError,
    /// Drop the failed jurisdiction, record it, keep going
    ContinueOnError,
}

/// Per-phase on/off switches. Every phase is enabled unless configured off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseToggles {
    pub structural: bool,
    pub state_cleaning: bool,
    pub national_standardization: bool,
    pub deduplication: bool,
    pub final_assembly: bool,
}

impl Default for PhaseToggles {
    fn default() -> Self {
        Self {
            structural: true,
            state_cleaning: true,
            national_standardization: true,
            deduplication: true,
            final_assembly: true,
        }
    }
}

impl PhaseToggles {
    pub fn is_enabled(&self, phase: Phase) -> bool {
        match phase {
            Phase::Structural => self.structural,
            Phase::StateCleaning => self.state_cleaning,
            Phase::NationalStandardization => self.national_standardization,
            Phase::Deduplication => self.deduplication,
            Phase::FinalAssembly => self.final_assembly,
        }
    }

    pub fn set(&mut self, phase: Phase, enabled: bool) {
        match phase {
            Phase::Structural => self.structural = enabled,
            Phase::StateCleaning => self.state_cleaning = enabled,
            Phase::NationalStandardization => self.national_standardization = enabled,
            Phase::Deduplication => self.deduplication = enabled,
            Phase::FinalAssembly => self.final_assembly = enabled,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            max_workers: DEFAULT_MAX_WORKERS,
            phases: PhaseToggles::default(),
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn error_handling(&self) -> ErrorHandlingStrategy {
        if self.continue_on_error {
            ErrorHandlingStrategy::ContinueOnError
        } else {
            ErrorHandlingStrategy::StopOnFirstError
        }
    }

    pub fn with_phase(mut self, phase: Phase, enabled: bool) -> Self {
        self.phases.set(phase, enabled);
        self
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(PipelineError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            return Err(PipelineError::Config(format!(
                "low_confidence_threshold must be within 0..=1, got {}",
                self.low_confidence_threshold
            )));
        }
        Ok(())
    }
}
