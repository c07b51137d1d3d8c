// Candidate pipeline: phase model, processing stages and orchestration

pub mod manager;
pub mod pipeline_config;
pub mod processing;
pub mod status;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use manager::PipelineManager;
pub use pipeline_config::{ErrorHandlingStrategy, PhaseToggles, PipelineConfig};
pub use status::{
    JurisdictionFailure, PersistenceOutcome, PipelineStatus, RunOutcome, RunSummary, StatusHandle,
};

/// The five sequential phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Structural,
    StateCleaning,
    NationalStandardization,
    Deduplication,
    FinalAssembly,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Structural,
        Phase::StateCleaning,
        Phase::NationalStandardization,
        Phase::Deduplication,
        Phase::FinalAssembly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Structural => "STRUCTURAL",
            Phase::StateCleaning => "STATE_CLEANING",
            Phase::NationalStandardization => "NATIONAL_STANDARDIZATION",
            Phase::Deduplication => "DEDUPLICATION",
            Phase::FinalAssembly => "FINAL_ASSEMBLY",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit context handed to every port call.
#[derive(Debug, Clone)]
pub struct PhaseContext {
    pub run_id: Uuid,
    pub phase: Phase,
    pub jurisdiction: String,
}

impl PhaseContext {
    pub fn new(run_id: Uuid, phase: Phase, jurisdiction: impl Into<String>) -> Self {
        Self {
            run_id,
            phase,
            jurisdiction: jurisdiction.into(),
        }
    }
}
