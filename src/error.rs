use thiserror::Error;

use crate::pipeline::Phase;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Extraction failed for {jurisdiction}: {message}")]
    Extraction { jurisdiction: String, message: String },

    #[error("Cleaning failed for {jurisdiction}: {message}")]
    Cleaning { jurisdiction: String, message: String },

    #[error("Jurisdiction {jurisdiction} failed during {phase}: {cause}")]
    JurisdictionAborted {
        jurisdiction: String,
        phase: Phase,
        cause: String,
    },

    #[error("Aggregate integrity violation during {phase}: {message}")]
    AggregateIntegrity { phase: Phase, message: String },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Aggregate failures abort the run regardless of `continue_on_error`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::AggregateIntegrity { .. } | PipelineError::JurisdictionAborted { .. }
        )
    }

    pub fn integrity(phase: Phase, message: impl Into<String>) -> Self {
        PipelineError::AggregateIntegrity {
            phase,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
