use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::ports::Extractor;
use crate::domain::{RawCandidateRecord, SourceSnapshot};
use crate::error::{PipelineError, Result};
use crate::pipeline::PhaseContext;

static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])(20\d{2})(?:[^0-9]|$)").expect("valid year regex"));

/// Reads `<raw_dir>/<jurisdiction>/*.json`, one snapshot per file. Each file
/// holds a JSON array of row objects.
pub struct JsonSnapshotExtractor {
    raw_dir: PathBuf,
}

impl JsonSnapshotExtractor {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    fn jurisdiction_dir(&self, jurisdiction: &str) -> PathBuf {
        self.raw_dir.join(jurisdiction)
    }

    async fn snapshot_files(&self, dir: &Path, jurisdiction: &str) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| PipelineError::Extraction {
            jurisdiction: jurisdiction.to_string(),
            message: format!("cannot read {}: {}", dir.display(), e),
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn read_snapshot(&self, path: &Path, jurisdiction: &str) -> Result<SourceSnapshot> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extraction_error = |message: String| PipelineError::Extraction {
            jurisdiction: jurisdiction.to_string(),
            message: format!("{}: {}", source, message),
        };

        let metadata = tokio::fs::metadata(path).await?;
        let observed_at: DateTime<Utc> = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let content = tokio::fs::read_to_string(path).await?;
        let payload: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| extraction_error(e.to_string()))?;
        let rows = match payload {
            serde_json::Value::Array(rows) => rows,
            _ => return Err(extraction_error("expected a JSON array of rows".to_string())),
        };

        let file_year = year_from_source(&source);
        let records: Vec<RawCandidateRecord> = rows
            .into_iter()
            .map(|row| {
                let election_year = file_year.or_else(|| row_election_year(&row));
                RawCandidateRecord::from_payload(jurisdiction, &source, observed_at, election_year, row)
            })
            .collect();

        debug!(source = %source, records = records.len(), "Read snapshot");
        Ok(SourceSnapshot {
            source,
            observed_at,
            records,
        })
    }
}

#[async_trait]
impl Extractor for JsonSnapshotExtractor {
    async fn extract(&self, ctx: &PhaseContext) -> Result<Vec<SourceSnapshot>> {
        let dir = self.jurisdiction_dir(&ctx.jurisdiction);
        let files = self.snapshot_files(&dir, &ctx.jurisdiction).await?;
        if files.is_empty() {
            return Err(PipelineError::Extraction {
                jurisdiction: ctx.jurisdiction.clone(),
                message: format!("no snapshot files in {}", dir.display()),
            });
        }

        let mut snapshots = Vec::with_capacity(files.len());
        for file in &files {
            snapshots.push(self.read_snapshot(file, &ctx.jurisdiction).await?);
        }
        info!(snapshots = snapshots.len(), "Extracted jurisdiction snapshots");
        Ok(snapshots)
    }
}

/// Jurisdictions available under `raw_dir`: its subdirectories, sorted.
pub async fn discover_jurisdictions(raw_dir: &Path) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(raw_dir).await.map_err(|e| {
        PipelineError::Config(format!("cannot read raw_dir {}: {}", raw_dir.display(), e))
    })?;

    let mut jurisdictions = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            jurisdictions.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    jurisdictions.sort();
    Ok(jurisdictions)
}

/// Election year from a `20xx` token in a snapshot file name.
pub fn year_from_source(source: &str) -> Option<i32> {
    YEAR_TOKEN
        .captures(source)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn row_election_year(row: &serde_json::Value) -> Option<i32> {
    match row.get("election_year")? {
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Phase;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn ctx(jurisdiction: &str) -> PhaseContext {
        PhaseContext::new(Uuid::new_v4(), Phase::Structural, jurisdiction)
    }

    #[test]
    fn test_year_from_source() {
        assert_eq!(year_from_source("2024_filings.json"), Some(2024));
        assert_eq!(year_from_source("filings-2022-primary.json"), Some(2022));
        assert_eq!(year_from_source("filings.json"), None);
        assert_eq!(year_from_source("batch_120245.json"), None);
    }

    #[tokio::test]
    async fn test_extract_reads_every_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("alaska");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("2024_filings.json"),
            r#"[{"candidate_name": "Sam Reed", "office": "Governor"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("latest.json"),
            r#"[{"candidate_name": "Ann Lee", "office": "Mayor", "election_year": "2026"}]"#,
        )
        .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let extractor = JsonSnapshotExtractor::new(temp_dir.path());
        let snapshots = extractor.extract(&ctx("alaska")).await.unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].source, "2024_filings.json");
        assert_eq!(snapshots[0].records[0].election_year, Some(2024));
        assert_eq!(snapshots[1].records[0].election_year, Some(2026));
        assert_eq!(snapshots[1].records[0].jurisdiction, "alaska");
    }

    #[tokio::test]
    async fn test_non_array_file_is_an_extraction_error() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("ohio");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("2024.json"), r#"{"candidate_name": "Ann Lee"}"#).unwrap();

        let extractor = JsonSnapshotExtractor::new(temp_dir.path());
        let result = extractor.extract(&ctx("ohio")).await;
        assert!(matches!(result, Err(PipelineError::Extraction { .. })));
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_extraction_error() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = JsonSnapshotExtractor::new(temp_dir.path());
        let result = extractor.extract(&ctx("guam")).await;
        assert!(matches!(result, Err(PipelineError::Extraction { .. })));
    }

    #[tokio::test]
    async fn test_discover_jurisdictions_lists_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("ohio")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("alaska")).unwrap();
        std::fs::write(temp_dir.path().join("README"), "x").unwrap();

        let found = discover_jurisdictions(temp_dir.path()).await.unwrap();
        assert_eq!(found, vec!["alaska".to_string(), "ohio".to_string()]);
    }
}
