//! Tag extraction through `ffprobe`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::{BinderError, Result};
use crate::models::FileTags;
use crate::scan::TagReader;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Runs `ffprobe` and maps its format tags onto [`FileTags`].
#[derive(Debug, Clone)]
pub struct FfprobeTagReader {
    binary: PathBuf,
}

impl Default for FfprobeTagReader {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }
}

impl FfprobeTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl TagReader for FfprobeTagReader {
    fn read_tags(&self, path: &Path) -> Result<FileTags> {
        let output = Command::new(&self.binary)
            .args([
                "-loglevel",
                "error",
                "-show_entries",
                "format_tags:format=duration",
                "-show_format",
                "-print_format",
                "json",
            ])
            .arg(path)
            .output()?;

        if !output.status.success() {
            return Err(BinderError::TagExtraction {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ffprobe_output(&stdout).map_err(|e| BinderError::TagExtraction {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Parse the JSON that `ffprobe -print_format json -show_format` prints.
///
/// Tag keys are matched case-insensitively. Absent tags stay empty.
pub fn parse_ffprobe_output(json: &str) -> Result<FileTags> {
    let output: ProbeOutput = serde_json::from_str(json)?;
    let Some(format) = output.format else {
        return Ok(FileTags::default());
    };

    let tags: HashMap<String, String> = format
        .tags
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
        .collect();

    Ok(FileTags {
        title: first_tag(&tags, &["title"]),
        album: first_tag(&tags, &["album"]),
        series: first_tag(&tags, &["series", "mvnm"]),
        series_part: first_tag(&tags, &["series-part", "part", "mvin"]),
        authors: split_people(&first_tag(&tags, &["artist", "album_artist", "author"])),
        narrators: split_people(&first_tag(&tags, &["composer", "narrator", "narratedby"])),
        asin: first_tag(&tags, &["asin", "audible_asin"]),
        isbn: first_tag(&tags, &["isbn"]),
        duration: format.duration.and_then(|d| d.trim().parse::<f64>().ok()),
    })
}

fn first_tag(tags: &HashMap<String, String>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| tags.get(*k))
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn split_people(raw: &str) -> Vec<String> {
    raw.split([',', ';', '/'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_output() {
        let json = r#"{
            "format": {
                "filename": "01.m4b",
                "duration": "3671.250000",
                "tags": {
                    "TITLE": "Dune - Part 1",
                    "album": "Dune",
                    "artist": "Frank Herbert",
                    "composer": "Scott Brick; Orlagh Cassidy",
                    "SERIES": "Dune",
                    "series-part": "1",
                    "AUDIBLE_ASIN": "B002V1OF70"
                }
            }
        }"#;

        let tags = parse_ffprobe_output(json).unwrap();
        assert_eq!(tags.title, "Dune - Part 1");
        assert_eq!(tags.album, "Dune");
        assert_eq!(tags.authors, vec!["Frank Herbert"]);
        assert_eq!(tags.narrators, vec!["Scott Brick", "Orlagh Cassidy"]);
        assert_eq!(tags.series, "Dune");
        assert_eq!(tags.series_part, "1");
        assert_eq!(tags.asin, "B002V1OF70");
        assert_eq!(tags.duration, Some(3671.25));
    }

    #[test]
    fn test_parse_missing_tags_defaults_empty() {
        let tags = parse_ffprobe_output(r#"{"format": {"duration": "n/a"}}"#).unwrap();
        assert!(tags.is_empty());
        assert_eq!(tags.duration, None);

        let tags = parse_ffprobe_output("{}").unwrap();
        assert_eq!(tags, FileTags::default());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_ffprobe_output("not json").is_err());
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let reader = FfprobeTagReader::with_binary("/nonexistent/ffprobe");
        assert!(reader.read_tags(Path::new("/tmp/a.mp3")).is_err());
    }
}
