//! Cleanup helpers for tag values and search queries.

use std::path::Path;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Words that carry no signal in a search query.
const STOP_WORDS: &[&str] = &[
    "the",
    "and",
    "m4b",
    "series",
    "audiobook",
    "audiobooks",
    "book",
    "part",
];

pub fn strip_accents(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Canonical author name: no accents, editor markers or apostrophes, initials
/// separated by single spaces.
pub fn cleanse_author(author: &str) -> String {
    let mut cleaned = strip_accents(author);
    for pattern in ["- editor", " - ", "'"] {
        cleaned = cleaned.replace(pattern, "");
    }
    cleaned
        .replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title without accents and without any subtitle after a colon.
pub fn cleanse_title(title: &str, strip_unabridged: bool) -> String {
    let mut cleaned = title.to_string();
    if strip_unabridged {
        cleaned = cleaned.replace(" (Unabridged)", "").replace("m4b", "");
    }
    let cleaned = strip_accents(&cleaned);
    cleaned
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub fn cleanse_series(series: &str) -> String {
    series.replace([':', '\''], "").trim().to_string()
}

/// Drop the GraphicAudio label and brackets from an author credit.
pub fn remove_graphic_audio(author: &str) -> String {
    author
        .replace("GraphicAudio", "")
        .replace(['[', ']'], "")
        .trim()
        .to_string()
}

/// Lowercase search keywords from free-form fragments such as folder names.
///
/// Splits on brackets, punctuation and dashes, and drops pure numbers,
/// single characters and [`STOP_WORDS`].
pub fn search_keywords<S: AsRef<str>>(fragments: &[S], delimiter: &str) -> String {
    let mut keywords = Vec::new();
    for fragment in fragments {
        let spaced: String = fragment
            .as_ref()
            .chars()
            .map(|c| match c {
                '[' | ']' | '{' | '}' | '(' | ')' | '.' | '_' | ':' | ',' | ';' | '-' => ' ',
                other => other,
            })
            .collect();

        for word in spaced.split_whitespace() {
            if word.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let lower = word.to_lowercase();
            if lower.chars().count() > 1 && !STOP_WORDS.contains(&lower.as_str()) {
                keywords.push(lower);
            }
        }
    }
    keywords.join(delimiter)
}

/// Name of the folder that holds `file`.
///
/// A file sitting directly in `source_root` has no book folder; its own file
/// name stands in for one.
pub fn parent_folder(file: &Path, source_root: &Path) -> String {
    match file.parent() {
        Some(parent) if parent != source_root => parent
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        _ => file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}
