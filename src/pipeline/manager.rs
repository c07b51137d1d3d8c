//! Five-phase pipeline run: per-jurisdiction fan-out for the first three
//! phases, aggregate processing for the last two.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::app::ports::{Extractor, PersistenceSink};
use crate::domain::{CandidateRecord, CleanedRecord, OfficeCategory, RawCandidateRecord};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::pipeline_config::{ErrorHandlingStrategy, PipelineConfig};
use crate::pipeline::processing::audit::{self, AuditReport, CanonicalRow};
use crate::pipeline::processing::cleaning::CleanerRegistry;
use crate::pipeline::processing::dedup;
use crate::pipeline::processing::national::{self, NationalStandardizer, RejectedRecord};
use crate::pipeline::status::{
    JurisdictionFailure, PersistenceOutcome, RunOutcome, RunSummary, StatusHandle,
};
use crate::pipeline::{Phase, PhaseContext};

type Standardized = (Vec<CandidateRecord>, Vec<RejectedRecord>);

/// Drives one pipeline run. Build it with the extractors, cleaners and sink
/// for the run, then call [`PipelineManager::run`].
pub struct PipelineManager {
    config: PipelineConfig,
    run_id: Uuid,
    extractors: HashMap<String, Arc<dyn Extractor>>,
    seeded: HashMap<String, Vec<RawCandidateRecord>>,
    cleaners: Arc<CleanerRegistry>,
    national: Arc<NationalStandardizer>,
    sink: Option<Arc<dyn PersistenceSink>>,
    status: StatusHandle,
}

impl PipelineManager {
    pub fn new(config: PipelineConfig) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            config,
            run_id,
            extractors: HashMap::new(),
            seeded: HashMap::new(),
            cleaners: Arc::new(CleanerRegistry::new()),
            national: Arc::new(NationalStandardizer::default()),
            sink: None,
            status: StatusHandle::new(run_id),
        }
    }

    pub fn with_extractor(mut self, jurisdiction: impl Into<String>, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.insert(jurisdiction.into(), extractor);
        self
    }

    /// Raw input used in place of extraction when STRUCTURAL is disabled.
    pub fn with_seeded_records(
        mut self,
        jurisdiction: impl Into<String>,
        records: Vec<RawCandidateRecord>,
    ) -> Self {
        self.seeded.entry(jurisdiction.into()).or_default().extend(records);
        self
    }

    pub fn with_cleaners(mut self, cleaners: CleanerRegistry) -> Self {
        self.cleaners = Arc::new(cleaners);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Cloneable handle for reading the run status from another task.
    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Execute every phase in order.
    ///
    /// Returns `Err` for aggregate failures (DEDUPLICATION, FINAL_ASSEMBLY)
    /// and for the first jurisdiction failure when `continue_on_error` is
    /// off. Persistence failures are reported in the summary instead.
    pub async fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        let span = info_span!("pipeline_run", run_id = %self.run_id);
        let result = self.execute().instrument(span).await;
        self.status.update(|s| {
            s.current_phase = None;
            s.finished_at = Some(chrono::Utc::now());
        });
        if let Err(e) = &result {
            error!(run_id = %self.run_id, error = %e, "Pipeline run aborted");
        }
        result
    }

    async fn execute(&self) -> Result<RunSummary> {
        info!(
            workers = self.config.max_workers,
            continue_on_error = self.config.continue_on_error,
            "Starting pipeline run"
        );
        let mut failures = Vec::new();

        let raw = self.structural(&mut failures).await?;
        let cleaned = self.state_cleaning(raw, &mut failures).await?;
        let (candidates, rejected) = self.national_standardization(cleaned, &mut failures).await?;
        let records = self.deduplication(candidates)?;
        let (rows, audit, persistence) = self.final_assembly(&records).await?;

        failures.sort_by(|a: &JurisdictionFailure, b| {
            (a.phase, &a.jurisdiction).cmp(&(b.phase, &b.jurisdiction))
        });
        let outcome = if failures.is_empty() {
            RunOutcome::Success
        } else {
            RunOutcome::PartialSuccess
        };
        info!(
            outcome = ?outcome,
            final_records = records.len(),
            failed_jurisdictions = failures.len(),
            rejected = rejected.len(),
            "Pipeline run finished"
        );

        Ok(RunSummary {
            run_id: self.run_id,
            outcome,
            failures,
            rejected,
            records,
            rows,
            audit,
            persistence,
            status: self.status.snapshot(),
        })
    }

    async fn structural(
        &self,
        failures: &mut Vec<JurisdictionFailure>,
    ) -> Result<BTreeMap<String, Vec<RawCandidateRecord>>> {
        let phase = Phase::Structural;
        let started = self.begin(phase);

        let raw = if self.enabled(phase) {
            let inputs = self
                .extractors
                .iter()
                .map(|(j, e)| (j.clone(), Arc::clone(e)))
                .collect();
            self.fan_out(phase, inputs, failures, |ctx, extractor: Arc<dyn Extractor>| async move {
                let snapshots = extractor.extract(&ctx).await?;
                Ok::<_, PipelineError>(dedup::merge_snapshots(snapshots))
            })
            .await?
        } else {
            self.seeded
                .iter()
                .map(|(j, records)| (j.clone(), records.clone()))
                .collect()
        };

        let total: usize = raw.values().map(Vec::len).sum();
        metrics::phase::records_out(phase, total);
        self.status.update(|s| s.raw_records = total);
        self.finish(phase, started, total);
        Ok(raw)
    }

    async fn state_cleaning(
        &self,
        raw: BTreeMap<String, Vec<RawCandidateRecord>>,
        failures: &mut Vec<JurisdictionFailure>,
    ) -> Result<BTreeMap<String, Vec<CleanedRecord>>> {
        let phase = Phase::StateCleaning;
        let started = self.begin(phase);
        metrics::phase::records_in(phase, raw.values().map(Vec::len).sum());

        let dedicated = self.enabled(phase);
        let cleaners = Arc::clone(&self.cleaners);
        let cleaned = self
            .fan_out(phase, raw.into_iter().collect(), failures, move |ctx, records| {
                let cleaner = if dedicated {
                    cleaners.get_or_generic(&ctx.jurisdiction)
                } else {
                    cleaners.generic()
                };
                async move { cleaner.clean(&ctx, records) }
            })
            .await?;

        let total = cleaned.values().map(Vec::len).sum();
        metrics::phase::records_out(phase, total);
        self.finish(phase, started, total);
        Ok(cleaned)
    }

    async fn national_standardization(
        &self,
        cleaned: BTreeMap<String, Vec<CleanedRecord>>,
        failures: &mut Vec<JurisdictionFailure>,
    ) -> Result<Standardized> {
        let phase = Phase::NationalStandardization;
        let started = self.begin(phase);
        metrics::phase::records_in(phase, cleaned.values().map(Vec::len).sum());

        let standardize = self.enabled(phase);
        let national = Arc::clone(&self.national);
        let outputs = self
            .fan_out(phase, cleaned.into_iter().collect(), failures, move |_ctx, records| {
                let national = Arc::clone(&national);
                async move {
                    if standardize {
                        Ok::<_, PipelineError>(national.standardize_batch(records))
                    } else {
                        let (named, rejected) = national::split_nameless(records);
                        Ok((named.into_iter().map(national::passthrough).collect(), rejected))
                    }
                }
            })
            .await?;

        let mut candidates = Vec::new();
        let mut rejected = Vec::new();
        for (jurisdiction, (accepted, dropped)) in outputs {
            if standardize {
                self.report_offices(&jurisdiction, &accepted);
            }
            if !dropped.is_empty() {
                warn!(
                    jurisdiction = %jurisdiction,
                    phase = %phase,
                    rejected = dropped.len(),
                    "Dropped records with blank candidate names"
                );
                metrics::standardization::records_rejected(&jurisdiction, dropped.len());
                self.status.update(|s| s.log_artifacts += 1);
            }
            candidates.extend(accepted);
            rejected.extend(dropped);
        }

        metrics::phase::records_out(phase, candidates.len());
        self.status.update(|s| s.processed_records = candidates.len());
        self.finish(phase, started, candidates.len());
        Ok((candidates, rejected))
    }

    fn deduplication(&self, candidates: Vec<CandidateRecord>) -> Result<Vec<CandidateRecord>> {
        let phase = Phase::Deduplication;
        let started = self.begin(phase);
        let before = candidates.len();
        metrics::phase::records_in(phase, before);

        let records = if self.enabled(phase) {
            dedup::deduplicate(candidates)?
        } else {
            dedup::assign_stable_ids(candidates)?
        };

        metrics::dedup::records_collapsed(before - records.len());
        metrics::phase::records_out(phase, records.len());
        self.status.update(|s| s.final_records = records.len());
        self.finish(phase, started, records.len());
        Ok(records)
    }

    async fn final_assembly(
        &self,
        records: &[CandidateRecord],
    ) -> Result<(Vec<CanonicalRow>, Option<AuditReport>, PersistenceOutcome)> {
        let phase = Phase::FinalAssembly;
        let started = self.begin(phase);
        if !self.enabled(phase) {
            self.finish(phase, started, 0);
            return Ok((Vec::new(), None, PersistenceOutcome::Skipped));
        }

        metrics::phase::records_in(phase, records.len());
        let assembly = audit::assemble(records, self.config.low_confidence_threshold)?;
        let report = assembly.report;
        let rows = assembly.rows;

        metrics::audit::quality_score(report.quality_score);
        metrics::audit::issues_detected(report.issues.len());
        for issue in &report.issues {
            info!(
                issue_type = ?issue.issue_type,
                severity = ?issue.severity,
                count = issue.count,
                "{}",
                issue.description
            );
        }
        self.status.update(|s| s.report_artifacts += 1);

        let persistence = match &self.sink {
            Some(sink) => match sink.persist(&rows).await {
                Ok(()) => {
                    metrics::persistence::rows_written(rows.len());
                    info!(rows = rows.len(), "Persisted final rows");
                    PersistenceOutcome::Persisted { rows: rows.len() }
                }
                Err(e) => {
                    metrics::persistence::error();
                    error!(error = %e, "Persisting final rows failed");
                    self.status.update(|s| s.log_artifacts += 1);
                    PersistenceOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            },
            None => PersistenceOutcome::Skipped,
        };

        metrics::phase::records_out(phase, rows.len());
        self.finish(phase, started, rows.len());
        Ok((rows, Some(report), persistence))
    }

    /// Run `work` once per jurisdiction on the bounded worker pool.
    ///
    /// Each unit runs in its own task so a panic only takes down that
    /// jurisdiction. Results come back keyed by jurisdiction in sorted order.
    async fn fan_out<I, T, F, Fut>(
        &self,
        phase: Phase,
        inputs: Vec<(String, I)>,
        failures: &mut Vec<JurisdictionFailure>,
        work: F,
    ) -> Result<BTreeMap<String, T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(PhaseContext, I) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut set = JoinSet::new();

        for (jurisdiction, input) in inputs {
            let ctx = PhaseContext::new(self.run_id, phase, jurisdiction.clone());
            let span = info_span!(
                "jurisdiction",
                run_id = %self.run_id,
                phase = %phase,
                jurisdiction = %jurisdiction
            );
            let unit = work(ctx, input).instrument(span);
            let semaphore = Arc::clone(&semaphore);

            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (jurisdiction, Err(PipelineError::Config(e.to_string()))),
                };
                // Own task so a panic is reported against this jurisdiction.
                let mut unit = AbortOnDrop(tokio::spawn(unit));
                let outcome = match (&mut unit.0).await {
                    Ok(result) => result,
                    Err(e) => Err(unit_failure(phase, &jurisdiction, e)),
                };
                (jurisdiction, outcome)
            });
        }

        let mut outputs = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            let (jurisdiction, outcome) = joined.map_err(|e| {
                PipelineError::integrity(phase, format!("worker pool task failed: {}", e))
            })?;

            match outcome {
                Ok(value) => {
                    debug!(jurisdiction = %jurisdiction, phase = %phase, "Jurisdiction unit finished");
                    outputs.insert(jurisdiction, value);
                }
                Err(error) => match self.config.error_handling() {
                    ErrorHandlingStrategy::ContinueOnError => {
                        warn!(
                            jurisdiction = %jurisdiction,
                            phase = %phase,
                            error = %error,
                            "Skipping failed jurisdiction"
                        );
                        metrics::jurisdiction::failure(phase, &jurisdiction);
                        self.status.record_failure(&jurisdiction);
                        self.status.update(|s| s.log_artifacts += 1);
                        failures.push(JurisdictionFailure {
                            jurisdiction,
                            phase,
                            cause: error.to_string(),
                        });
                    }
                    ErrorHandlingStrategy::StopOnFirstError => {
                        set.abort_all();
                        metrics::jurisdiction::failure(phase, &jurisdiction);
                        self.status.record_failure(&jurisdiction);
                        return Err(PipelineError::JurisdictionAborted {
                            jurisdiction,
                            phase,
                            cause: error.to_string(),
                        });
                    }
                },
            }
        }
        Ok(outputs)
    }

    fn report_offices(&self, jurisdiction: &str, candidates: &[CandidateRecord]) {
        let threshold = self.config.low_confidence_threshold;
        let mut unknown = 0;
        for candidate in candidates {
            let office = &candidate.office;
            metrics::standardization::office_confidence(office.confidence);
            if office.category == OfficeCategory::Unknown {
                unknown += 1;
            } else if office.confidence < threshold {
                debug!(
                    jurisdiction = %jurisdiction,
                    office = %office.label,
                    source_office = ?candidate.source_office,
                    confidence = office.confidence,
                    "Low-confidence office match"
                );
            }
        }
        if unknown > 0 {
            metrics::standardization::unknown_offices(jurisdiction, unknown);
        }
    }

    fn enabled(&self, phase: Phase) -> bool {
        self.config.phases.is_enabled(phase)
    }

    fn begin(&self, phase: Phase) -> Instant {
        if self.enabled(phase) {
            info!(phase = %phase, "Entering phase");
        } else {
            info!(phase = %phase, "Phase disabled, applying fallback");
        }
        self.status.enter_phase(phase);
        Instant::now()
    }

    fn finish(&self, phase: Phase, started: Instant, records: usize) {
        if self.enabled(phase) {
            metrics::phase::completed(phase, started.elapsed().as_secs_f64());
            self.status.complete_phase(phase);
        } else {
            metrics::phase::skipped(phase);
            self.status.update(|s| s.current_phase = None);
        }
        info!(phase = %phase, records, elapsed_ms = started.elapsed().as_millis() as u64, "Phase finished");
    }
}

/// Aborts the wrapped task when dropped, so aborting the pool task that
/// awaits it also stops the unit itself.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn unit_failure(phase: Phase, jurisdiction: &str, error: tokio::task::JoinError) -> PipelineError {
    let message = if error.is_panic() {
        let payload = error.into_panic();
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        format!("panicked: {}", detail)
    } else {
        format!("task cancelled: {}", error)
    };
    match phase {
        Phase::Structural => PipelineError::Extraction {
            jurisdiction: jurisdiction.to_string(),
            message,
        },
        _ => PipelineError::Cleaning {
            jurisdiction: jurisdiction.to_string(),
            message,
        },
    }
}
