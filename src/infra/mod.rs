// Filesystem adapters for the pipeline ports

pub mod json_snapshot_extractor;
pub mod jsonl_output_adapter;

pub use json_snapshot_extractor::{discover_jurisdictions, JsonSnapshotExtractor};
pub use jsonl_output_adapter::JsonLinesSink;
