use bookbinder_core::BinderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Core(#[from] BinderError),

    #[error("fetch from {source_name} failed: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, MatchError>;
