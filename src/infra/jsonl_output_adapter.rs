use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::app::ports::PersistenceSink;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::audit::CanonicalRow;

/// Writes the final table as NDJSON, one canonical row per line.
///
/// Rows go to a sibling temp file that is renamed over the target once fully
/// written, so a failed run leaves the previous artifact intact.
pub struct JsonLinesSink {
    pub output_path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .output_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.output_path.with_file_name(name)
    }

    async fn ensure_output_directory(&self) -> Result<()> {
        if let Some(parent_dir) = self.output_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                tokio::fs::create_dir_all(parent_dir).await.map_err(|e| {
                    PipelineError::Persistence(format!(
                        "Failed to create output directory {:?}: {}",
                        parent_dir, e
                    ))
                })?;
                debug!("Created output directory: {:?}", parent_dir);
            }
        }
        Ok(())
    }

    async fn write_rows(&self, path: &Path, rows: &[CanonicalRow]) -> Result<()> {
        let mut buffer = String::new();
        for row in rows {
            buffer.push_str(&serde_json::to_string(row)?);
            buffer.push('\n');
        }
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for JsonLinesSink {
    async fn persist(&self, rows: &[CanonicalRow]) -> Result<()> {
        self.ensure_output_directory().await?;
        let temp_path = self.temp_path();

        if let Err(e) = self.write_rows(&temp_path, rows).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(PipelineError::Persistence(format!(
                "Failed to write {:?}: {}",
                temp_path, e
            )));
        }
        tokio::fs::rename(&temp_path, &self.output_path).await.map_err(|e| {
            PipelineError::Persistence(format!(
                "Failed to move {:?} into place: {}",
                temp_path, e
            ))
        })?;

        debug!(rows = rows.len(), "Wrote final rows to {:?}", self.output_path);
        Ok(())
    }
}

/// Read back a file written by [`JsonLinesSink`].
pub async fn read_rows(path: &Path) -> Result<Vec<CanonicalRow>> {
    let content = tokio::fs::read_to_string(path).await?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(PipelineError::from))
        .collect()
}
