use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tags extracted from a single media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTags {
    pub title: String,
    pub album: String,
    pub series: String,
    pub series_part: String,
    pub authors: Vec<String>,
    pub narrators: Vec<String>,
    pub asin: String,
    pub isbn: String,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl FileTags {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Every identifying field except the title, joined by spaces.
    ///
    /// Duration is per-file and would keep parts of one book apart, so it is
    /// left out.
    pub fn signature(&self) -> String {
        let authors = self.authors.join(",");
        let narrators = self.narrators.join(",");
        [
            self.album.as_str(),
            self.series.as_str(),
            self.series_part.as_str(),
            authors.as_str(),
            narrators.as_str(),
            self.asin.as_str(),
            self.isbn.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.signature().is_empty()
    }
}

/// One scanned media file. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFile {
    pub path: PathBuf,

    /// `None` when tag extraction failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<FileTags>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

impl RawFile {
    pub fn new(path: impl Into<PathBuf>, tags: FileTags) -> Self {
        let signature = Some(tags.signature());
        Self {
            path: path.into(),
            tags: Some(tags),
            signature,
        }
    }

    /// A file whose tags could not be read. It never matches anything.
    pub fn untagged(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tags: None,
            signature: None,
        }
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tag title, falling back to the file stem.
    pub fn display_title(&self) -> String {
        self.tags
            .as_ref()
            .map(|t| t.title.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default()
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    M4b,
    M4a,
    Mp3,
    Mp4,
    Flac,
    Ogg,
    Opus,
    Aac,
    Wma,
    Other,
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::M4b => "m4b",
            Self::M4a => "m4a",
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Wma => "wma",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "m4b" => Self::M4b,
            "m4a" => Self::M4a,
            "mp3" => Self::Mp3,
            "mp4" => Self::Mp4,
            "flac" => Self::Flac,
            "ogg" | "oga" => Self::Ogg,
            "opus" => Self::Opus,
            "aac" => Self::Aac,
            "wma" => Self::Wma,
            _ => Self::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .map(|ext| Self::from_extension(&ext.to_string_lossy()))
            .unwrap_or(Self::Other)
    }

    pub fn is_audio(&self) -> bool {
        !matches!(self, Self::Other)
    }
}
