//! Run status snapshots and the final run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::CandidateRecord;
use crate::pipeline::processing::audit::{AuditReport, CanonicalRow};
use crate::pipeline::processing::national::RejectedRecord;
use crate::pipeline::Phase;

/// Point-in-time view of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineStatus {
    pub run_id: Uuid,
    pub current_phase: Option<Phase>,
    pub completed_phases: Vec<Phase>,
    pub raw_records: usize,
    pub processed_records: usize,
    pub final_records: usize,
    pub report_artifacts: usize,
    pub log_artifacts: usize,
    pub failed_jurisdictions: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineStatus {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            current_phase: None,
            completed_phases: Vec::new(),
            raw_records: 0,
            processed_records: 0,
            final_records: 0,
            report_artifacts: 0,
            log_artifacts: 0,
            failed_jurisdictions: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Cloneable handle onto the live status of a run. Readers get snapshots;
/// only the manager writes.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    inner: Arc<Mutex<PipelineStatus>>,
}

impl StatusHandle {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PipelineStatus::new(run_id))),
        }
    }

    pub fn snapshot(&self) -> PipelineStatus {
        self.lock().clone()
    }

    pub(crate) fn update<F: FnOnce(&mut PipelineStatus)>(&self, f: F) {
        f(&mut self.lock());
    }

    pub(crate) fn enter_phase(&self, phase: Phase) {
        self.update(|s| s.current_phase = Some(phase));
    }

    pub(crate) fn complete_phase(&self, phase: Phase) {
        self.update(|s| {
            s.completed_phases.push(phase);
            s.current_phase = None;
        });
    }

    pub(crate) fn record_failure(&self, jurisdiction: &str) {
        self.update(|s| {
            if !s.failed_jurisdictions.iter().any(|j| j == jurisdiction) {
                s.failed_jurisdictions.push(jurisdiction.to_string());
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, PipelineStatus> {
        // A panicking writer leaves plain counters behind; keep reading them.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A jurisdiction dropped from the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JurisdictionFailure {
    pub jurisdiction: String,
    pub phase: Phase,
    pub cause: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// At least one jurisdiction was skipped
    PartialSuccess,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PersistenceOutcome {
    Persisted { rows: usize },
    /// No sink configured, or FINAL_ASSEMBLY disabled
    Skipped,
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub failures: Vec<JurisdictionFailure>,
    pub rejected: Vec<RejectedRecord>,
    /// Deduplicated records, available even when assembly is disabled
    pub records: Vec<CandidateRecord>,
    /// Assembled rows; empty when FINAL_ASSEMBLY is disabled
    pub rows: Vec<CanonicalRow>,
    pub audit: Option<AuditReport>,
    pub persistence: PersistenceOutcome,
    pub status: PipelineStatus,
}

impl RunSummary {
    /// True when every jurisdiction succeeded and nothing failed to persist.
    pub fn is_clean(&self) -> bool {
        self.outcome == RunOutcome::Success
            && !matches!(self.persistence, PersistenceOutcome::Failed { .. })
    }
}
