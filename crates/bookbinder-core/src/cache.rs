//! Content-addressed JSON cache.
//!
//! Entries live at `<root>/<category>/<key>.json`, where `key` is normally
//! [`hash_key`] of an identifying string and `category` names the metadata
//! source the payload came from. Entries never expire; clearing is manual.
//!
//! There is no cross-process locking. Every write goes to its own temp file in
//! the category directory and is renamed into place, so concurrent writers to
//! the same entry are last-write-wins but never leave a torn file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{BinderError, Result};

/// Lowercase hex SHA-256 of the UTF-8 `identifier`.
pub fn hash_key(identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Normalized `title|authors` string used to address a book in the cache.
pub fn identifier_for(title: &str, authors: &[String]) -> String {
    let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    let authors = authors
        .iter()
        .map(|a| collapse(a))
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}|{}", collapse(title), authors).to_lowercase()
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    enabled: bool,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self::at(&config.directory, config.enabled)
    }

    pub fn at(root: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            root: root.into(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(path_component(category))
    }

    fn entry_path(&self, key: &str, category: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.json", path_component(key)))
    }

    /// Whether an entry exists. Always false while caching is disabled.
    pub fn has(&self, key: &str, category: &str) -> bool {
        self.enabled && self.entry_path(key, category).is_file()
    }

    /// Store `payload` as JSON. Returns whether the entry is on disk
    /// afterwards; `Ok(false)` without touching disk while disabled.
    pub fn put<T>(&self, key: &str, category: &str, payload: &T) -> Result<bool>
    where
        T: Serialize + ?Sized,
    {
        if !self.enabled {
            return Ok(false);
        }

        let dir = self.category_dir(category);
        let path = self.entry_path(key, category);
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string(payload)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(category, key, "cached entry");
        Ok(path.is_file())
    }

    /// Load a stored payload.
    ///
    /// `Ok(None)` while caching is disabled, even if the entry exists on
    /// disk. A missing entry is [`BinderError::CacheMiss`].
    pub fn get<T: DeserializeOwned>(&self, key: &str, category: &str) -> Result<Option<T>> {
        if !self.enabled {
            return Ok(None);
        }

        let path = self.entry_path(key, category);
        if !path.is_file() {
            return Err(BinderError::CacheMiss {
                category: category.to_string(),
                key: key.to_string(),
            });
        }

        let contents = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&contents)?;
        Ok(Some(value))
    }

    /// Remove every entry in `category`, returning how many were removed.
    pub fn clear_category(&self, category: &str) -> Result<usize> {
        let dir = self.category_dir(category);
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Reduce `raw` to a single safe path component.
fn path_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
