use async_trait::async_trait;

use crate::domain::{CleanedRecord, RawCandidateRecord, SourceSnapshot};
use crate::error::Result;
use crate::pipeline::processing::audit::CanonicalRow;
use crate::pipeline::PhaseContext;

/// Produces the raw snapshots for one jurisdiction.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, ctx: &PhaseContext) -> Result<Vec<SourceSnapshot>>;
}

/// Jurisdiction-specific mapping of raw rows onto standard fields.
pub trait StateCleaner: Send + Sync {
    fn clean(&self, ctx: &PhaseContext, records: Vec<RawCandidateRecord>) -> Result<Vec<CleanedRecord>>;
}

/// Destination for the final assembled rows.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn persist(&self, rows: &[CanonicalRow]) -> Result<()>;
}
