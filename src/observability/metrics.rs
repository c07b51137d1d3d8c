//! Pipeline metrics recorded through the `metrics` facade.
//!
//! No exporter is installed here; the binary or an embedding service decides
//! where the numbers go. Without a recorder every call is a no-op.

use std::fmt;

/// Every metric name the pipeline emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Phase metrics
    PhaseRunsCompleted,
    PhaseRunsSkipped,
    PhaseDuration,
    PhaseRecordsIn,
    PhaseRecordsOut,

    // Jurisdiction metrics
    JurisdictionFailures,

    // Standardization metrics
    StandardizeOfficeConfidence,
    StandardizeUnknownOffices,
    StandardizeRecordsRejected,

    // Dedup metrics
    DedupRecordsCollapsed,

    // Audit metrics
    AuditQualityScore,
    AuditIssuesDetected,

    // Persistence metrics
    PersistenceRowsWritten,
    PersistenceErrors,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::PhaseRunsCompleted => "cf_phase_runs_completed_total",
            MetricName::PhaseRunsSkipped => "cf_phase_runs_skipped_total",
            MetricName::PhaseDuration => "cf_phase_duration_seconds",
            MetricName::PhaseRecordsIn => "cf_phase_records_in_total",
            MetricName::PhaseRecordsOut => "cf_phase_records_out_total",

            MetricName::JurisdictionFailures => "cf_jurisdiction_failures_total",

            MetricName::StandardizeOfficeConfidence => "cf_standardize_office_confidence",
            MetricName::StandardizeUnknownOffices => "cf_standardize_unknown_offices_total",
            MetricName::StandardizeRecordsRejected => "cf_standardize_records_rejected_total",

            MetricName::DedupRecordsCollapsed => "cf_dedup_records_collapsed_total",

            MetricName::AuditQualityScore => "cf_audit_quality_score",
            MetricName::AuditIssuesDetected => "cf_audit_issues_detected_total",

            MetricName::PersistenceRowsWritten => "cf_persistence_rows_written_total",
            MetricName::PersistenceErrors => "cf_persistence_errors_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Phase Metrics
// ============================================================================

pub mod phase {
    use super::MetricName;
    use crate::pipeline::Phase;

    /// Record a finished phase and how long it took
    pub fn completed(phase: Phase, secs: f64) {
        ::metrics::counter!(MetricName::PhaseRunsCompleted.as_str(), "phase" => phase.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PhaseDuration.as_str(), "phase" => phase.as_str()).record(secs);
    }

    /// Record a phase that was switched off for this run
    pub fn skipped(phase: Phase) {
        ::metrics::counter!(MetricName::PhaseRunsSkipped.as_str(), "phase" => phase.as_str()).increment(1);
    }

    pub fn records_in(phase: Phase, count: usize) {
        ::metrics::counter!(MetricName::PhaseRecordsIn.as_str(), "phase" => phase.as_str())
            .increment(count as u64);
    }

    pub fn records_out(phase: Phase, count: usize) {
        ::metrics::counter!(MetricName::PhaseRecordsOut.as_str(), "phase" => phase.as_str())
            .increment(count as u64);
    }
}

// ============================================================================
// Jurisdiction Metrics
// ============================================================================

pub mod jurisdiction {
    use super::MetricName;
    use crate::pipeline::Phase;

    /// Record a jurisdiction dropped from the run
    pub fn failure(phase: Phase, jurisdiction: &str) {
        ::metrics::counter!(MetricName::JurisdictionFailures.as_str(),
            "phase" => phase.as_str(),
            "jurisdiction" => jurisdiction.to_string()
        )
        .increment(1);
    }
}

// ============================================================================
// Standardization Metrics
// ============================================================================

pub mod standardization {
    use super::MetricName;

    pub fn office_confidence(confidence: f64) {
        ::metrics::histogram!(MetricName::StandardizeOfficeConfidence.as_str()).record(confidence);
    }

    pub fn unknown_offices(jurisdiction: &str, count: usize) {
        ::metrics::counter!(MetricName::StandardizeUnknownOffices.as_str(), "jurisdiction" => jurisdiction.to_string())
            .increment(count as u64);
    }

    pub fn records_rejected(jurisdiction: &str, count: usize) {
        ::metrics::counter!(MetricName::StandardizeRecordsRejected.as_str(), "jurisdiction" => jurisdiction.to_string())
            .increment(count as u64);
    }
}

// ============================================================================
// Dedup Metrics
// ============================================================================

pub mod dedup {
    use super::MetricName;

    /// Record how many rows were folded into existing identities
    pub fn records_collapsed(count: usize) {
        ::metrics::counter!(MetricName::DedupRecordsCollapsed.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Audit Metrics
// ============================================================================

pub mod audit {
    use super::MetricName;

    pub fn quality_score(score: f64) {
        ::metrics::histogram!(MetricName::AuditQualityScore.as_str()).record(score);
    }

    pub fn issues_detected(count: usize) {
        ::metrics::counter!(MetricName::AuditIssuesDetected.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Persistence Metrics
// ============================================================================

pub mod persistence {
    use super::MetricName;

    pub fn rows_written(count: usize) {
        ::metrics::counter!(MetricName::PersistenceRowsWritten.as_str()).increment(count as u64);
    }

    pub fn error() {
        ::metrics::counter!(MetricName::PersistenceErrors.as_str()).increment(1);
    }
}
