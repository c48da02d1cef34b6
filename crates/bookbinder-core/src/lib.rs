//! bookbinder core: audiobook file models, grouping, cache and record log.

pub mod cache;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod probe;
pub mod records;
pub mod scan;
pub mod similarity;

pub use cache::{CacheStore, hash_key, identifier_for};
pub use config::{AppConfig, CacheConfig, CoreConfig, MatchingConfig};
pub use error::{BinderError, Result};
pub use grouping::{FileGrouper, is_collection};
pub use models::*;
pub use probe::FfprobeTagReader;
pub use records::{LOG_HEADERS, LogRecord, append_records, read_records};
pub use scan::{TagReader, scan_directory};
