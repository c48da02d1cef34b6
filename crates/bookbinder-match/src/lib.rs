//! bookbinder match: metadata lookup and best-match selection for grouped books.

pub mod error;
pub mod pipeline;
pub mod selector;
pub mod sources;

pub use error::{MatchError, Result};
pub use pipeline::{MatchPipeline, ResolvedBook, RunReport, SourceResult};
pub use selector::{MatchTarget, pick_best, rank, select_best};
pub use sources::{FetchQuery, MetadataFetcher, StaticFetcher};
