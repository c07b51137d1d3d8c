use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use candidate_filings::config::Config;
use candidate_filings::infra::{discover_jurisdictions, JsonLinesSink, JsonSnapshotExtractor};
use candidate_filings::observability::init_logging;
use candidate_filings::pipeline::{Phase, PersistenceOutcome, PipelineManager, RunOutcome};

#[derive(Parser)]
#[command(name = "candidate_filings")]
#[command(about = "Normalize and deduplicate U.S. candidate filing data")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "candidate_filings.toml")]
    config: PathBuf,

    /// Override `[paths] raw_dir`
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Override `[paths] final_path`
    #[arg(long)]
    final_path: Option<PathBuf>,

    /// Abort on the first failed jurisdiction
    #[arg(long)]
    stop_on_error: bool,

    /// Override `[pipeline] max_workers`
    #[arg(long)]
    max_workers: Option<usize>,

    /// Phases to skip (comma-separated). Available: structural, state_cleaning,
    /// national_standardization, deduplication, final_assembly
    #[arg(long, value_delimiter = ',')]
    disable_phase: Vec<String>,

    /// Restrict the run to these jurisdictions (comma-separated)
    #[arg(long, value_delimiter = ',')]
    jurisdictions: Vec<String>,
}

fn parse_phase(name: &str) -> anyhow::Result<Phase> {
    let wanted = name.trim().to_uppercase();
    Phase::ALL
        .into_iter()
        .find(|p| p.as_str() == wanted)
        .with_context(|| format!("unknown phase '{}'", name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(raw_dir) = cli.raw_dir {
        config.paths.raw_dir = raw_dir;
    }
    if let Some(final_path) = cli.final_path {
        config.paths.final_path = final_path;
    }
    if cli.stop_on_error {
        config.pipeline.continue_on_error = false;
    }
    if let Some(workers) = cli.max_workers {
        config.pipeline.max_workers = workers;
    }
    for name in &cli.disable_phase {
        config.pipeline.phases.set(parse_phase(name)?, false);
    }

    init_logging(&config.paths.log_dir)?;
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    let jurisdictions = if cli.jurisdictions.is_empty() {
        discover_jurisdictions(&config.paths.raw_dir).await?
    } else {
        cli.jurisdictions.clone()
    };
    info!(count = jurisdictions.len(), raw_dir = %config.paths.raw_dir.display(), "Discovered jurisdictions");

    let extractor = Arc::new(JsonSnapshotExtractor::new(&config.paths.raw_dir));
    let mut manager = PipelineManager::new(config.pipeline.clone())
        .with_cleaners(config.cleaner_registry())
        .with_sink(Arc::new(JsonLinesSink::new(&config.paths.final_path)));
    for jurisdiction in jurisdictions {
        manager = manager.with_extractor(jurisdiction, extractor.clone());
    }

    info!(run_id = %manager.run_id(), "Pipeline configured");

    let summary = match manager.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!(run_id = %manager.run_id(), "Pipeline failed: {}", e);
            return Err(e).context("pipeline run aborted");
        }
    };

    println!("\n📊 Pipeline Results (run {}):", summary.run_id);
    println!("   Raw records: {}", summary.status.raw_records);
    println!("   Processed: {}", summary.status.processed_records);
    println!("   Final records: {}", summary.records.len());
    println!("   Rejected: {}", summary.rejected.len());
    if let Some(audit) = &summary.audit {
        println!("   Quality score: {:.1}", audit.quality_score);
        println!("   Unknown offices: {}", audit.unknown_offices);
    }
    if summary.outcome == RunOutcome::PartialSuccess {
        println!("\n⚠️  Skipped jurisdictions:");
        for failure in &summary.failures {
            println!("   - {} ({}): {}", failure.jurisdiction, failure.phase, failure.cause);
        }
    }

    match &summary.persistence {
        PersistenceOutcome::Persisted { rows } => {
            println!("   Output file: {} ({} rows)", config.paths.final_path.display(), rows);
            Ok(())
        }
        PersistenceOutcome::Skipped => {
            println!("   Output: skipped");
            Ok(())
        }
        PersistenceOutcome::Failed { message } => {
            anyhow::bail!("persisting final rows failed: {}", message)
        }
    }
}
