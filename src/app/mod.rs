pub mod ports;

pub use ports::{Extractor, PersistenceSink, StateCleaner};
