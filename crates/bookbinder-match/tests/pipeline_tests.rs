use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::tempdir;

use bookbinder_core::{
    CacheStore, FileTags, MetadataCandidate, MetadataSource, TagReader, read_records,
};
use bookbinder_match::{
    FetchQuery, MatchError, MatchPipeline, MetadataFetcher, Result, StaticFetcher,
};

/// Every file is part of Frank Herbert's Dune.
struct DuneReader;

impl TagReader for DuneReader {
    fn read_tags(&self, _path: &Path) -> bookbinder_core::Result<FileTags> {
        let mut tags = FileTags::new("Dune");
        tags.album = "Dune".to_string();
        tags.authors = vec!["Frank Herbert".to_string()];
        tags.narrators = vec!["Scott Brick".to_string()];
        Ok(tags)
    }
}

/// Wraps a fetcher and counts how often it is actually asked.
struct Counting<F> {
    inner: F,
    calls: Arc<AtomicUsize>,
}

impl<F: MetadataFetcher> MetadataFetcher for Counting<F> {
    fn source(&self) -> MetadataSource {
        self.inner.source()
    }

    fn fetch(&self, query: &FetchQuery) -> Result<Vec<MetadataCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(query)
    }
}

struct Unreachable;

impl MetadataFetcher for Unreachable {
    fn source(&self) -> MetadataSource {
        MetadataSource::Mam
    }

    fn fetch(&self, _query: &FetchQuery) -> Result<Vec<MetadataCandidate>> {
        Err(MatchError::Fetch {
            source_name: "mam".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

fn create_library(root: &Path) {
    let book = root.join("Dune");
    fs::create_dir_all(&book).unwrap();
    File::create(book.join("01.m4b")).unwrap();
    File::create(book.join("02.m4b")).unwrap();
}

fn audible_fetcher(calls: Arc<AtomicUsize>) -> Counting<StaticFetcher> {
    let query = FetchQuery::new("Dune", "Frank Herbert");
    let candidates = vec![
        MetadataCandidate::new(MetadataSource::Audible, "Children of Dune")
            .with_authors(["Frank Herbert"])
            .with_series("Dune", "3"),
        MetadataCandidate::new(MetadataSource::Audible, "Dune")
            .with_authors(["Frank Herbert"])
            .with_series("Dune", "1"),
    ];
    Counting {
        inner: StaticFetcher::new(MetadataSource::Audible).with_records(&query, candidates),
        calls,
    }
}

#[test]
fn test_second_run_is_served_from_cache() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("library");
    create_library(&root);
    let log_path = tmp.path().join("log.csv");

    let audible_calls = Arc::new(AtomicUsize::new(0));
    let mam_calls = Arc::new(AtomicUsize::new(0));
    let pipeline = MatchPipeline::with_cache(CacheStore::at(tmp.path().join("cache"), true))
        .with_fetcher(Counting {
            inner: Unreachable,
            calls: mam_calls.clone(),
        })
        .with_fetcher(audible_fetcher(audible_calls.clone()));

    let first = pipeline.run_directory(&root, &DuneReader, &log_path).unwrap();
    assert_eq!(first.books.len(), 1);
    assert_eq!(first.matched(), 1);
    assert!(first.log_failures.is_empty());
    assert_eq!(audible_calls.load(Ordering::SeqCst), 1);

    let book = &first.books[0];
    assert_eq!(book.cluster.name, "Dune");
    assert_eq!(book.cluster.len(), 2);
    let best = book.best_match().unwrap();
    assert_eq!(best.candidate.title, "Dune");
    assert!(best.score > 0 && best.score < 100);

    let mam = &book.sources[0];
    assert_eq!(mam.candidate_count, 0);
    assert!(mam.best.is_none());
    assert!(mam.error.as_deref().unwrap().contains("connection refused"));
    assert!(!book.sources[1].from_cache);

    let second = pipeline.run_directory(&root, &DuneReader, &log_path).unwrap();
    assert_eq!(audible_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mam_calls.load(Ordering::SeqCst), 2);
    let audible = &second.books[0].sources[1];
    assert!(audible.from_cache);
    assert_eq!(audible.candidate_count, 2);
    assert_eq!(audible.best, first.books[0].sources[1].best);
}

#[test]
fn test_run_writes_one_row_per_file() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("library");
    create_library(&root);
    let log_path = tmp.path().join("out").join("log.csv");

    let pipeline = MatchPipeline::with_cache(CacheStore::at(tmp.path().join("cache"), true))
        .with_fetcher(Unreachable)
        .with_fetcher(audible_fetcher(Arc::new(AtomicUsize::new(0))));
    pipeline.run_directory(&root, &DuneReader, &log_path).unwrap();

    let rows = read_records(&log_path).unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row["book"], "Dune");
        assert_eq!(row["isMatched"], "true");
        assert_eq!(row["isHardLinked"], "false");
        assert_eq!(row["mamCount"], "0");
        assert_eq!(row["audibleMatchCount"], "2");
        assert_eq!(row["metadatasource"], "audible");
        assert_eq!(row["paths"], "Frank Herbert/Dune/Dune #1 - Dune");
        assert_eq!(row["id3-title"], "Dune");
        assert_eq!(row["id3-narrators"], "Scott Brick");
        assert_eq!(row["adb-title"], "Dune");
        assert_eq!(row["adb-seriesparts"], "Dune #1");
        assert_eq!(row["mam-title"], "");
    }
    assert!(rows[0]["file"].ends_with("01.m4b"));
    assert!(rows[1]["file"].ends_with("02.m4b"));
}

#[test]
fn test_disabled_cache_fetches_every_run() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("library");
    create_library(&root);
    let log_path = tmp.path().join("log.csv");
    let cache_dir = tmp.path().join("cache");

    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = MatchPipeline::with_cache(CacheStore::at(&cache_dir, false))
        .with_fetcher(audible_fetcher(calls.clone()));

    pipeline.run_directory(&root, &DuneReader, &log_path).unwrap();
    pipeline.run_directory(&root, &DuneReader, &log_path).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!cache_dir.exists());
}

#[test]
fn test_unwritable_log_is_reported_and_run_continues() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("library");
    create_library(&root);
    let other = root.join("Emma");
    fs::create_dir_all(&other).unwrap();
    File::create(other.join("01.mp3")).unwrap();

    // A directory where the log file should be.
    let log_path = tmp.path().join("log.csv");
    fs::create_dir_all(&log_path).unwrap();

    let pipeline = MatchPipeline::with_cache(CacheStore::at(tmp.path().join("cache"), false));
    let report = pipeline.run_directory(&root, &DuneReader, &log_path).unwrap();

    assert_eq!(report.books.len(), 2);
    assert_eq!(report.matched(), 0);
    let failed: Vec<&str> = report.log_failures.iter().map(|(b, _)| b.as_str()).collect();
    assert_eq!(failed, vec!["Dune", "Emma"]);
}
