use bookbinder_core::models::{BookCluster, MetadataCandidate, MetadataSource};
use bookbinder_core::normalize::{cleanse_author, cleanse_title, search_keywords};
use bookbinder_core::{hash_key, identifier_for};

use crate::error::Result;

/// What a fetcher is asked to look up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchQuery {
    pub isbn: Option<String>,
    pub asin: Option<String>,
    pub title: String,
    pub author: String,
    /// Free-form search terms built from the title, author and folder name.
    pub keywords: String,
}

impl FetchQuery {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    /// Query for a cluster's representative file, falling back to the cluster
    /// name when the file carries no tags.
    pub fn for_cluster(cluster: &BookCluster, keyword_delimiter: &str) -> Self {
        let representative = cluster.representative();
        let Some(tags) = representative.tags.as_ref() else {
            let title = cleanse_title(&cluster.name, true);
            return Self {
                keywords: search_keywords(&[cluster.name.as_str()], keyword_delimiter),
                title,
                ..Default::default()
            };
        };

        let title = if tags.title.trim().is_empty() {
            cleanse_title(&cluster.name, true)
        } else {
            cleanse_title(&tags.title, true)
        };
        let author = tags
            .authors
            .first()
            .map(|a| cleanse_author(a))
            .unwrap_or_default();
        let keywords = search_keywords(
            &[title.as_str(), author.as_str(), cluster.name.as_str()],
            keyword_delimiter,
        );

        Self {
            isbn: non_empty(&tags.isbn),
            asin: non_empty(&tags.asin),
            title,
            author,
            keywords,
        }
    }

    /// Normalized identifying string the cache is addressed by.
    pub fn identifier(&self) -> String {
        if let Some(isbn) = &self.isbn {
            return format!("isbn:{}", isbn.trim().to_lowercase());
        }
        if let Some(asin) = &self.asin {
            return format!("asin:{}", asin.trim().to_lowercase());
        }
        identifier_for(&self.title, std::slice::from_ref(&self.author))
    }

    pub fn cache_key(&self) -> String {
        hash_key(&self.identifier())
    }

    pub fn is_empty(&self) -> bool {
        self.isbn.is_none()
            && self.asin.is_none()
            && self.title.trim().is_empty()
            && self.keywords.trim().is_empty()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// An external metadata service. Implementations own their transport
/// (HTTP search, browser automation) and report failures as errors; an empty
/// list means the source answered but knows nothing.
pub trait MetadataFetcher: Send + Sync {
    fn source(&self) -> MetadataSource;

    fn fetch(&self, query: &FetchQuery) -> Result<Vec<MetadataCandidate>>;
}

/// Fixed answers, keyed by the query identifier. Handy for offline runs and
/// replaying exported results.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    source: MetadataSource,
    records: Vec<(String, Vec<MetadataCandidate>)>,
}

impl StaticFetcher {
    pub fn new(source: MetadataSource) -> Self {
        Self {
            source,
            records: Vec::new(),
        }
    }

    pub fn with_records(mut self, query: &FetchQuery, candidates: Vec<MetadataCandidate>) -> Self {
        self.records.push((query.identifier(), candidates));
        self
    }
}

impl MetadataFetcher for StaticFetcher {
    fn source(&self) -> MetadataSource {
        self.source
    }

    fn fetch(&self, query: &FetchQuery) -> Result<Vec<MetadataCandidate>> {
        let id = query.identifier();
        Ok(self
            .records
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, candidates)| candidates.clone())
            .unwrap_or_default())
    }
}
