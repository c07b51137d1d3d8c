pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;

// Ports and the filesystem adapters behind them
pub mod app;
pub mod infra;

pub mod observability;
