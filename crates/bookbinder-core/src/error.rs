use thiserror::Error;

/// All errors that can occur in bookbinder-core.
#[derive(Debug, Error)]
pub enum BinderError {
    #[error("Cache entry not found: {category}/{key}")]
    CacheMiss { category: String, key: String },

    #[error("Unknown log field: {0}")]
    UnknownLogField(String),

    #[error("Tag extraction failed for {path}: {reason}")]
    TagExtraction { path: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl BinderError {
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss { .. })
    }
}

pub type Result<T> = std::result::Result<T, BinderError>;
