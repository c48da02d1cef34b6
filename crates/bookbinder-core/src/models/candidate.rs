use serde::{Deserialize, Serialize};

use crate::models::FileTags;

/// Where a metadata record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// Tags embedded in the media files themselves.
    Id3,
    Mam,
    Audible,
    Goodreads,
}

impl MetadataSource {
    /// Cache namespace for records fetched from this source.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Id3 => "id3",
            Self::Mam => "mam",
            Self::Audible => "audible",
            Self::Goodreads => "goodreads",
        }
    }

    /// Column prefix in the record log, if the source is logged at all.
    pub fn column_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Id3 => Some("id3"),
            Self::Mam => Some("mam"),
            Self::Audible => Some("adb"),
            Self::Goodreads => None,
        }
    }
}

impl std::fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.category())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(default)]
    pub part: String,
}

impl Series {
    pub fn new(name: impl Into<String>, part: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            part: part.into(),
        }
    }
}

impl std::fmt::Display for Series {
    /// `name #part`, or just the name when the part is unknown.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.part.trim().is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} #{}", self.name, self.part.trim())
        }
    }
}

/// A metadata record proposed as a match for a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataCandidate {
    pub source: MetadataSource,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub narrators: Vec<String>,

    #[serde(default)]
    pub series: Vec<Series>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_name: Option<String>,

    /// Human readable running time as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,

    /// Running time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl MetadataCandidate {
    pub fn new(source: MetadataSource, title: impl Into<String>) -> Self {
        Self {
            source,
            title: title.into(),
            subtitle: None,
            authors: Vec::new(),
            narrators: Vec::new(),
            series: Vec::new(),
            asin: None,
            isbn: None,
            publication_name: None,
            length: None,
            duration: None,
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_series(mut self, name: impl Into<String>, part: impl Into<String>) -> Self {
        self.series.push(Series::new(name, part));
        self
    }

    /// The book described by a file's own tags.
    pub fn from_tags(tags: &FileTags) -> Self {
        let mut candidate = Self::new(MetadataSource::Id3, tags.title.trim());
        candidate.authors = tags.authors.clone();
        candidate.narrators = tags.narrators.clone();
        if !tags.series.trim().is_empty() {
            candidate
                .series
                .push(Series::new(tags.series.trim(), tags.series_part.trim()));
        }
        candidate.asin = non_empty(&tags.asin);
        candidate.isbn = non_empty(&tags.isbn);
        candidate.publication_name = non_empty(&tags.album);
        candidate.duration = tags.duration;
        candidate
    }

    pub fn authors_joined(&self) -> String {
        self.authors.join(",")
    }

    pub fn series_names(&self) -> String {
        self.series
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `name #part` pairs in list order.
    pub fn series_parts(&self) -> String {
        self.series
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A candidate paired with the similarity score it earned against a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: MetadataCandidate,
    pub score: u8,
}
