use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use candidate_filings::app::ports::{Extractor, PersistenceSink, StateCleaner};
use candidate_filings::config::Config;
use candidate_filings::domain::{CleanedRecord, OfficeCategory, RawCandidateRecord, SourceSnapshot};
use candidate_filings::error::PipelineError;
use candidate_filings::infra::jsonl_output_adapter::read_rows;
use candidate_filings::infra::{JsonLinesSink, JsonSnapshotExtractor};
use candidate_filings::pipeline::processing::audit::CanonicalRow;
use candidate_filings::pipeline::processing::cleaning::CleanerRegistry;
use candidate_filings::pipeline::{
    PersistenceOutcome, Phase, PhaseContext, PipelineConfig, PipelineManager, RunOutcome,
};

/// Serves prepared snapshots, stamping them with the requested jurisdiction.
struct StaticExtractor {
    snapshots: Vec<(&'static str, DateTime<Utc>, Vec<serde_json::Value>)>,
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, ctx: &PhaseContext) -> candidate_filings::error::Result<Vec<SourceSnapshot>> {
        Ok(self
            .snapshots
            .iter()
            .map(|(source, observed_at, rows)| SourceSnapshot {
                source: source.to_string(),
                observed_at: *observed_at,
                records: rows
                    .iter()
                    .map(|row| {
                        RawCandidateRecord::from_payload(&ctx.jurisdiction, source, *observed_at, Some(2024), row.clone())
                    })
                    .collect(),
            })
            .collect())
    }
}

struct FailingExtractor;

#[async_trait]
impl Extractor for FailingExtractor {
    async fn extract(&self, ctx: &PhaseContext) -> candidate_filings::error::Result<Vec<SourceSnapshot>> {
        Err(PipelineError::Extraction {
            jurisdiction: ctx.jurisdiction.clone(),
            message: "source site unavailable".to_string(),
        })
    }
}

struct PanickingExtractor;

#[async_trait]
impl Extractor for PanickingExtractor {
    async fn extract(&self, _ctx: &PhaseContext) -> candidate_filings::error::Result<Vec<SourceSnapshot>> {
        panic!("malformed source table");
    }
}

/// Sleeps before answering and records whether it ever got to answer.
struct SlowExtractor {
    finished: Arc<AtomicBool>,
}

#[async_trait]
impl Extractor for SlowExtractor {
    async fn extract(&self, _ctx: &PhaseContext) -> candidate_filings::error::Result<Vec<SourceSnapshot>> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

struct FailingCleaner;

impl StateCleaner for FailingCleaner {
    fn clean(
        &self,
        ctx: &PhaseContext,
        _records: Vec<RawCandidateRecord>,
    ) -> candidate_filings::error::Result<Vec<CleanedRecord>> {
        Err(PipelineError::Cleaning {
            jurisdiction: ctx.jurisdiction.clone(),
            message: "unexpected column layout".to_string(),
        })
    }
}

struct PanickingCleaner;

impl StateCleaner for PanickingCleaner {
    fn clean(
        &self,
        _ctx: &PhaseContext,
        _records: Vec<RawCandidateRecord>,
    ) -> candidate_filings::error::Result<Vec<CleanedRecord>> {
        panic!("cleaner index out of range");
    }
}

struct FailingSink;

#[async_trait]
impl PersistenceSink for FailingSink {
    async fn persist(&self, _rows: &[CanonicalRow]) -> candidate_filings::error::Result<()> {
        Err(PipelineError::Persistence("disk full".to_string()))
    }
}

fn at(month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, 1, 12, 0, 0).unwrap()
}

fn single(rows: Vec<serde_json::Value>) -> Arc<dyn Extractor> {
    Arc::new(StaticExtractor {
        snapshots: vec![("2024_filings.json", at(1), rows)],
    })
}

fn mayor_rows() -> Vec<serde_json::Value> {
    vec![json!({"candidate_name": "Ann Lee", "office": "Mayor", "party": "Nonpartisan"})]
}

#[tokio::test]
async fn test_senate_candidate_snapshots_merge_into_one_record() -> Result<()> {
    let extractor = Arc::new(StaticExtractor {
        snapshots: vec![
            (
                "2024_march.json",
                at(3),
                vec![json!({
                    "candidate_name": "Lisa Murkowski",
                    "office": "US Senator",
                    "party": "REP",
                    "phone": "(907) 555-0100",
                })],
            ),
            (
                "2024_may.json",
                at(5),
                vec![json!({
                    "candidate_name": "Lisa Murkowski",
                    "office": "US Senator",
                    "party": "REP",
                    "phone": "",
                })],
            ),
        ],
    });

    let manager = PipelineManager::new(PipelineConfig::default()).with_extractor("alaska", extractor);
    let summary = manager.run().await?;

    assert_eq!(summary.outcome, RunOutcome::Success);
    assert_eq!(summary.records.len(), 1);
    let record = &summary.records[0];
    assert_eq!(record.office.category, OfficeCategory::UsSenate);
    assert_eq!(record.office.confidence, 1.0);
    assert_eq!(record.phone.as_deref(), Some("907-555-0100"));
    assert_eq!(record.first_added_date, at(3));
    assert_eq!(record.last_updated_date, at(5));
    assert_eq!(record.contributing_sources.len(), 2);
    assert_eq!(record.stable_id.as_ref().map(String::len), Some(16));

    assert_eq!(summary.rows.len(), 1);
    assert_eq!(summary.rows[0].office, "US Senate");
    assert_eq!(summary.rows[0].party.as_deref(), Some("Republican"));
    Ok(())
}

#[tokio::test]
async fn test_primary_and_general_filings_become_one_candidacy() -> Result<()> {
    let extractor = Arc::new(StaticExtractor {
        snapshots: vec![
            (
                "2024_primary.json",
                at(3),
                vec![json!({
                    "candidate_name": "MARY PELTOLA",
                    "office": "US Representative",
                    "election_type": "Primary",
                    "mailing_address": "PO Box 200, BETHEL, AK 99559",
                })],
            ),
            (
                "2024_general.json",
                at(9),
                vec![json!({
                    "candidate_name": "Mary Peltola",
                    "office": "US Representative",
                    "election_type": "General",
                })],
            ),
        ],
    });

    let manager = PipelineManager::new(PipelineConfig::default()).with_extractor("alaska", extractor);
    let summary = manager.run().await?;

    assert_eq!(summary.records.len(), 1);
    let record = &summary.records[0];
    assert_eq!(record.name.display_name, "Mary Peltola");
    assert_eq!(record.address.city.as_deref(), Some("Bethel"));
    assert!(record.election_types.ran_in_primary);
    assert!(record.election_types.ran_in_general);
    assert!(!record.election_types.ran_in_special);
    assert_eq!(summary.rows[0].full_name_display, "Mary Peltola");
    Ok(())
}

#[tokio::test]
async fn test_continue_on_error_skips_failed_jurisdictions() -> Result<()> {
    let manager = PipelineManager::new(PipelineConfig::default())
        .with_extractor("alaska", single(mayor_rows()))
        .with_extractor("ohio", Arc::new(FailingExtractor))
        .with_extractor("texas", Arc::new(PanickingExtractor));

    let summary = manager.run().await?;

    assert_eq!(summary.outcome, RunOutcome::PartialSuccess);
    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.records[0].jurisdiction, "alaska");

    let failed: Vec<&str> = summary.failures.iter().map(|f| f.jurisdiction.as_str()).collect();
    assert_eq!(failed, vec!["ohio", "texas"]);
    assert!(summary.failures.iter().all(|f| f.phase == Phase::Structural));
    assert!(summary.failures[0].cause.contains("source site unavailable"));
    assert!(summary.failures[1].cause.contains("malformed source table"));

    let status = manager.status_handle().snapshot();
    assert_eq!(status.failed_jurisdictions.len(), 2);
    assert!(status.log_artifacts >= 2);
    assert_eq!(status.completed_phases, Phase::ALL.to_vec());
    Ok(())
}

#[tokio::test]
async fn test_stop_on_error_aborts_before_deduplication() -> Result<()> {
    let config = PipelineConfig {
        continue_on_error: false,
        ..PipelineConfig::default()
    };
    let manager = PipelineManager::new(config)
        .with_extractor("alaska", single(mayor_rows()))
        .with_extractor("ohio", Arc::new(FailingExtractor));
    let status = manager.status_handle();

    let result = manager.run().await;

    match result {
        Err(PipelineError::JurisdictionAborted { jurisdiction, phase, .. }) => {
            assert_eq!(jurisdiction, "ohio");
            assert_eq!(phase, Phase::Structural);
        }
        other => panic!("expected an aborted run, got {:?}", other.map(|s| s.outcome)),
    }
    let snapshot = status.snapshot();
    assert!(!snapshot.completed_phases.contains(&Phase::Deduplication));
    assert_eq!(snapshot.final_records, 0);
    assert!(snapshot.finished_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_stop_on_error_cancels_units_still_running() -> Result<()> {
    let config = PipelineConfig {
        continue_on_error: false,
        ..PipelineConfig::default()
    };
    let finished = Arc::new(AtomicBool::new(false));
    let manager = PipelineManager::new(config)
        .with_extractor("alaska", Arc::new(SlowExtractor { finished: Arc::clone(&finished) }))
        .with_extractor("ohio", Arc::new(FailingExtractor));

    let result = manager.run().await;
    assert!(matches!(result, Err(PipelineError::JurisdictionAborted { .. })));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!finished.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn test_cleaner_failures_skip_only_their_jurisdiction() -> Result<()> {
    let mut cleaners = CleanerRegistry::new();
    cleaners.register("ohio", Arc::new(FailingCleaner));
    cleaners.register("texas", Arc::new(PanickingCleaner));
    let manager = PipelineManager::new(PipelineConfig::default())
        .with_extractor("alaska", single(mayor_rows()))
        .with_extractor("ohio", single(mayor_rows()))
        .with_extractor("texas", single(mayor_rows()))
        .with_cleaners(cleaners);

    let summary = manager.run().await?;

    assert_eq!(summary.outcome, RunOutcome::PartialSuccess);
    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.records[0].jurisdiction, "alaska");

    let failed: Vec<&str> = summary.failures.iter().map(|f| f.jurisdiction.as_str()).collect();
    assert_eq!(failed, vec!["ohio", "texas"]);
    assert!(summary.failures.iter().all(|f| f.phase == Phase::StateCleaning));
    assert!(summary.failures[0].cause.contains("unexpected column layout"));
    assert!(summary.failures[1].cause.contains("cleaner index out of range"));
    Ok(())
}

#[tokio::test]
async fn test_cleaner_failure_stops_the_run_when_configured() -> Result<()> {
    let config = PipelineConfig {
        continue_on_error: false,
        ..PipelineConfig::default()
    };
    let mut cleaners = CleanerRegistry::new();
    cleaners.register("ohio", Arc::new(FailingCleaner));
    let manager = PipelineManager::new(config)
        .with_extractor("alaska", single(mayor_rows()))
        .with_extractor("ohio", single(mayor_rows()))
        .with_cleaners(cleaners);
    let status = manager.status_handle();

    match manager.run().await {
        Err(PipelineError::JurisdictionAborted { jurisdiction, phase, cause }) => {
            assert_eq!(jurisdiction, "ohio");
            assert_eq!(phase, Phase::StateCleaning);
            assert!(cause.contains("unexpected column layout"));
        }
        other => panic!("expected an aborted run, got {:?}", other.map(|s| s.outcome)),
    }
    let snapshot = status.snapshot();
    assert!(snapshot.completed_phases.contains(&Phase::Structural));
    assert!(!snapshot.completed_phases.contains(&Phase::NationalStandardization));
    Ok(())
}

#[tokio::test]
async fn test_persistence_failure_is_reported_not_fatal() -> Result<()> {
    let manager = PipelineManager::new(PipelineConfig::default())
        .with_extractor("alaska", single(mayor_rows()))
        .with_sink(Arc::new(FailingSink));

    let summary = manager.run().await?;

    assert_eq!(summary.outcome, RunOutcome::Success);
    assert!(matches!(summary.persistence, PersistenceOutcome::Failed { ref message } if message.contains("disk full")));
    assert_eq!(summary.rows.len(), 1);
    assert!(!summary.is_clean());
    Ok(())
}

#[tokio::test]
async fn test_blank_names_are_rejected_and_counted() -> Result<()> {
    let rows = vec![
        json!({"candidate_name": "Ann Lee", "office": "Mayor"}),
        json!({"candidate_name": "   ", "office": "Mayor"}),
    ];
    let manager = PipelineManager::new(PipelineConfig::default()).with_extractor("alaska", single(rows));

    let summary = manager.run().await?;

    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].jurisdiction, "alaska");
    assert_eq!(summary.status.raw_records, 2);
    assert_eq!(summary.status.processed_records, 1);
    Ok(())
}

#[tokio::test]
async fn test_files_in_files_out() -> Result<()> {
    let temp_dir = tempdir()?;
    let raw_dir = temp_dir.path().join("raw");
    std::fs::create_dir_all(raw_dir.join("montana"))?;
    std::fs::create_dir_all(raw_dir.join("idaho"))?;
    std::fs::write(
        raw_dir.join("montana").join("2024_filings.json"),
        serde_json::to_string(&json!([
            {"Candidate Name": "Steve Daines", "Office Title": "U.S. Senator", "party": "R",
             "address": "PO Box 1234, Bozeman, MT 59771"},
            {"Candidate Name": "Jon Tester", "Office Title": "U.S. Senator", "party": "D"}
        ]))?,
    )?;
    std::fs::write(
        raw_dir.join("idaho").join("2024_filings.json"),
        serde_json::to_string(&json!([
            {"candidate_name": "Brad Little", "office": "Governor", "party": "Republican", "zip": "83702.0"}
        ]))?,
    )?;

    let final_path = temp_dir.path().join("final").join("candidates.jsonl");
    let config = Config::from_toml(
        r#"
        [jurisdictions.montana.field_aliases]
        "Candidate Name" = "candidate_name"
        "Office Title" = "office"
        "#,
    )?;

    let extractor = Arc::new(JsonSnapshotExtractor::new(&raw_dir));
    let manager = PipelineManager::new(config.pipeline.clone())
        .with_cleaners(config.cleaner_registry())
        .with_sink(Arc::new(JsonLinesSink::new(&final_path)))
        .with_extractor("montana", extractor.clone())
        .with_extractor("idaho", extractor);

    let summary = manager.run().await?;
    assert!(summary.is_clean());
    assert_eq!(summary.persistence, PersistenceOutcome::Persisted { rows: 3 });

    let rows = read_rows(&final_path).await?;
    assert_eq!(rows, summary.rows);
    assert_eq!(rows.len(), 3);

    let daines = rows
        .iter()
        .find(|r| r.last_name.as_deref() == Some("Daines"))
        .expect("montana row present");
    assert_eq!(daines.office, "US Senate");
    assert_eq!(daines.city.as_deref(), Some("Bozeman"));
    assert_eq!(daines.address_region.as_deref(), Some("Montana"));
    assert_eq!(daines.postal_code.as_deref(), Some("59771"));

    let little = rows
        .iter()
        .find(|r| r.last_name.as_deref() == Some("Little"))
        .expect("idaho row present");
    assert_eq!(little.postal_code.as_deref(), Some("83702"));
    assert_eq!(little.office, "Governor");
    Ok(())
}
