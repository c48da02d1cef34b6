//! Discover audiobook files and read their tags.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::models::{AudioFormat, FileTags, RawFile};

/// NAS housekeeping folders that never contain books.
const IGNORED_DIRS: &[&str] = &["@eaDir", "#recycle"];

/// Reads tags from one media file.
pub trait TagReader: Send + Sync {
    fn read_tags(&self, path: &Path) -> Result<FileTags>;
}

/// Walk `root` recursively and build a [`RawFile`] for every audio file.
///
/// Entries are visited in sorted order. A tag read failure yields an
/// untagged file and a warning; it never aborts the scan.
pub fn scan_directory(root: &Path, reader: &dyn TagReader) -> Result<Vec<RawFile>> {
    let mut files = Vec::new();
    if !root.is_dir() {
        return Ok(files);
    }
    scan_into(root, reader, &mut files)?;
    Ok(files)
}

fn scan_into(dir: &Path, reader: &dyn TagReader, files: &mut Vec<RawFile>) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            let ignored = path
                .file_name()
                .is_some_and(|n| IGNORED_DIRS.iter().any(|d| n == *d));
            if !ignored {
                scan_into(&path, reader, files)?;
            }
        } else if path.is_file() && is_audio_file(&path) {
            let file = match reader.read_tags(&path) {
                Ok(tags) => RawFile::new(path, tags),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "tag extraction failed");
                    RawFile::untagged(path)
                }
            };
            files.push(file);
        }
    }
    Ok(())
}

pub fn is_audio_file(path: &Path) -> bool {
    AudioFormat::from_path(path).is_audio()
}
