//! Append-only CSV log of resolved books.
//!
//! Every writer shares [`LOG_HEADERS`], so logs from different runs can be
//! concatenated. A header row is written only when the log file is created.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::{BinderError, Result};
use crate::models::{MetadataCandidate, ScoredCandidate};

/// Per-source column suffixes, in column order.
pub const SOURCE_FIELDS: [&str; 11] = [
    "matchRate",
    "asin",
    "title",
    "subtitle",
    "publicationName",
    "length",
    "duration",
    "series",
    "authors",
    "narrators",
    "seriesparts",
];

/// Fixed, order-significant column list of the record log.
pub const LOG_HEADERS: [&str; 41] = [
    "book",
    "file",
    "isMatched",
    "isHardLinked",
    "mamCount",
    "audibleMatchCount",
    "metadatasource",
    "paths",
    "id3-matchRate",
    "id3-asin",
    "id3-title",
    "id3-subtitle",
    "id3-publicationName",
    "id3-length",
    "id3-duration",
    "id3-series",
    "id3-authors",
    "id3-narrators",
    "id3-seriesparts",
    "mam-matchRate",
    "mam-asin",
    "mam-title",
    "mam-subtitle",
    "mam-publicationName",
    "mam-length",
    "mam-duration",
    "mam-series",
    "mam-authors",
    "mam-narrators",
    "mam-seriesparts",
    "adb-matchRate",
    "adb-asin",
    "adb-title",
    "adb-subtitle",
    "adb-publicationName",
    "adb-length",
    "adb-duration",
    "adb-series",
    "adb-authors",
    "adb-narrators",
    "adb-seriesparts",
];

/// One log row. Unset fields render as empty cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    fields: HashMap<&'static str, String>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<()> {
        let Some(name) = LOG_HEADERS.iter().copied().find(|h| *h == field) else {
            return Err(BinderError::UnknownLogField(field.to_string()));
        };
        self.fields.insert(name, value.into());
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Fill the per-source columns under `prefix` from `candidate`.
    pub fn set_candidate_fields(
        &mut self,
        prefix: &str,
        candidate: &MetadataCandidate,
        match_rate: Option<u8>,
    ) -> Result<()> {
        let values: [String; 11] = [
            match_rate.map(|r| r.to_string()).unwrap_or_default(),
            candidate.asin.clone().unwrap_or_default(),
            candidate.title.clone(),
            candidate.subtitle.clone().unwrap_or_default(),
            candidate.publication_name.clone().unwrap_or_default(),
            candidate.length.clone().unwrap_or_default(),
            candidate
                .duration
                .map(|d| format!("{d:.0}"))
                .unwrap_or_default(),
            candidate.series_names(),
            candidate.authors_joined(),
            candidate.narrators.join(","),
            candidate.series_parts(),
        ];

        for (suffix, value) in SOURCE_FIELDS.iter().zip(values) {
            self.set(&format!("{prefix}-{suffix}"), value)?;
        }
        Ok(())
    }

    pub fn set_scored_fields(&mut self, prefix: &str, scored: &ScoredCandidate) -> Result<()> {
        self.set_candidate_fields(prefix, &scored.candidate, Some(scored.score))
    }

    /// Cells in [`LOG_HEADERS`] order.
    pub fn to_row(&self) -> Vec<&str> {
        LOG_HEADERS
            .iter()
            .map(|h| self.fields.get(h).map(String::as_str).unwrap_or(""))
            .collect()
    }
}

/// Append `records` to the log at `log_path`, creating it with a header row
/// if needed.
pub fn append_records(log_path: &Path, records: &[LogRecord]) -> Result<()> {
    let write_headers = !log_path.exists();

    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let mut writer = csv::Writer::from_writer(file);

    if write_headers {
        writer.write_record(LOG_HEADERS)?;
    }
    for record in records {
        writer.write_record(record.to_row())?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a log back as header-keyed rows. A missing log has no rows.
pub fn read_records(log_path: &Path) -> Result<Vec<HashMap<String, String>>> {
    if !log_path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(log_path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
