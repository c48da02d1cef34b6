//! Scan → group → cache/fetch → select → log.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bookbinder_core::models::{
    BookCluster, MetadataCandidate, MetadataSource, RawFile, ScoredCandidate,
};
use bookbinder_core::normalize::{cleanse_author, cleanse_series, cleanse_title};
use bookbinder_core::records::{LogRecord, append_records};
use bookbinder_core::{AppConfig, CacheStore, FileGrouper, TagReader, scan_directory};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::selector::{pick_best, rank};
use crate::sources::{FetchQuery, MetadataFetcher};

/// Outcome of asking one source about one book.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult {
    pub source: MetadataSource,
    pub candidate_count: usize,
    /// Every candidate with its score, in the order the source returned them.
    pub ranked: Vec<ScoredCandidate>,
    pub best: Option<ScoredCandidate>,
    pub from_cache: bool,
    /// Set when the fetch failed and the source was treated as empty.
    pub error: Option<String>,
}

impl SourceResult {
    fn empty(source: MetadataSource) -> Self {
        Self {
            source,
            candidate_count: 0,
            ranked: Vec::new(),
            best: None,
            from_cache: false,
            error: None,
        }
    }
}

/// A cluster together with what every source said about it.
#[derive(Debug, Clone)]
pub struct ResolvedBook {
    pub cluster: BookCluster,
    /// The book as described by the representative file's tags.
    pub target: MetadataCandidate,
    pub sources: Vec<SourceResult>,
}

impl ResolvedBook {
    pub fn is_matched(&self) -> bool {
        self.sources.iter().any(|s| s.best.is_some())
    }

    /// Best match across all sources; earlier sources win ties.
    pub fn best_match(&self) -> Option<&ScoredCandidate> {
        let mut best: Option<&ScoredCandidate> = None;
        for scored in self.sources.iter().filter_map(|s| s.best.as_ref()) {
            if best.is_none_or(|b| scored.score > b.score) {
                best = Some(scored);
            }
        }
        best
    }

    /// Matched metadata, or the file tags when nothing matched.
    pub fn chosen(&self) -> &MetadataCandidate {
        self.best_match()
            .map(|s| &s.candidate)
            .unwrap_or(&self.target)
    }

    pub fn candidate_count(&self, source: MetadataSource) -> usize {
        self.sources
            .iter()
            .filter(|s| s.source == source)
            .map(|s| s.candidate_count)
            .sum()
    }

    /// Library-relative destinations: `Author/Series/Series #n - Title` for
    /// each series, or `Author/Title` for standalone books.
    pub fn target_paths(&self) -> Vec<PathBuf> {
        let book = self.chosen();
        let author = book
            .authors
            .first()
            .map(|a| cleanse_author(a))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let title = cleanse_title(&book.title, true);
        let title = if title.is_empty() {
            self.cluster.name.clone()
        } else {
            title
        };

        if book.series.is_empty() {
            return vec![
                PathBuf::from(path_safe(&author)).join(path_safe(&title)),
            ];
        }

        book.series
            .iter()
            .map(|series| {
                let name = cleanse_series(&series.name);
                let entry = format!("{} - {}", cleanse_series(&series.to_string()), title);
                PathBuf::from(path_safe(&author))
                    .join(path_safe(&name))
                    .join(path_safe(&entry))
            })
            .collect()
    }

    /// One log row per file in the cluster.
    pub fn log_records(&self) -> bookbinder_core::Result<Vec<LogRecord>> {
        let chosen_source = self
            .best_match()
            .map(|s| s.candidate.source)
            .unwrap_or(MetadataSource::Id3);
        let paths = self
            .target_paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(";");

        let mut records = Vec::with_capacity(self.cluster.len());
        for file in self.cluster.files() {
            let mut record = LogRecord::new();
            record.set("book", self.cluster.name.clone())?;
            record.set("file", file.path().display().to_string())?;
            record.set("isMatched", self.is_matched().to_string())?;
            record.set("isHardLinked", "false")?;
            record.set("mamCount", self.candidate_count(MetadataSource::Mam).to_string())?;
            record.set(
                "audibleMatchCount",
                self.candidate_count(MetadataSource::Audible).to_string(),
            )?;
            record.set("metadatasource", chosen_source.category())?;
            record.set("paths", paths.clone())?;

            if let Some(tags) = file.tags.as_ref() {
                record.set_candidate_fields("id3", &MetadataCandidate::from_tags(tags), None)?;
            }
            for source in &self.sources {
                if let (Some(prefix), Some(best)) = (source.source.column_prefix(), &source.best)
                {
                    record.set_scored_fields(prefix, best)?;
                }
            }
            records.push(record);
        }
        Ok(records)
    }
}

fn path_safe(component: &str) -> String {
    component.replace(['/', '\\'], "_").trim().to_string()
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub books: Vec<ResolvedBook>,
    /// Books whose log rows could not be written, with the reason.
    pub log_failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn matched(&self) -> usize {
        self.books.iter().filter(|b| b.is_matched()).count()
    }

    pub fn elapsed_display(&self) -> String {
        let total = self.elapsed.as_secs_f64();
        let hours = (total / 3600.0).floor();
        let minutes = ((total - hours * 3600.0) / 60.0).floor();
        let seconds = total - hours * 3600.0 - minutes * 60.0;
        format!("Elapsed time: {hours} hours, {minutes} minutes, {seconds:.2} seconds")
    }
}

pub struct MatchPipeline {
    cache: CacheStore,
    fetchers: Vec<Box<dyn MetadataFetcher>>,
    grouper: FileGrouper,
    keyword_delimiter: String,
}

impl MatchPipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            cache: CacheStore::new(&config.cache),
            fetchers: Vec::new(),
            grouper: FileGrouper::new(),
            keyword_delimiter: config.matching.keyword_delimiter.clone(),
        }
    }

    pub fn with_cache(cache: CacheStore) -> Self {
        Self {
            cache,
            fetchers: Vec::new(),
            grouper: FileGrouper::new(),
            keyword_delimiter: " ".to_string(),
        }
    }

    /// Add a source. Sources are consulted in the order they were added.
    pub fn with_fetcher(mut self, fetcher: impl MetadataFetcher + 'static) -> Self {
        self.fetchers.push(Box::new(fetcher));
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Candidates for `query` from `fetcher`, served from the cache when
    /// possible. A failed fetch is logged and yields no candidates.
    fn lookup(
        &self,
        fetcher: &dyn MetadataFetcher,
        query: &FetchQuery,
    ) -> (Vec<MetadataCandidate>, bool, Option<String>) {
        let source = fetcher.source();
        let category = source.category();
        let key = query.cache_key();

        if self.cache.has(&key, category) {
            match self.cache.get::<Vec<MetadataCandidate>>(&key, category) {
                Ok(Some(candidates)) => {
                    debug!(%source, key = %key, "cache hit");
                    return (candidates, true, None);
                }
                Ok(None) => {}
                Err(e) => warn!(%source, key = %key, error = %e, "unreadable cache entry, refetching"),
            }
        }

        match fetcher.fetch(query) {
            Ok(candidates) => {
                if !candidates.is_empty()
                    && let Err(e) = self.cache.put(&key, category, &candidates)
                {
                    warn!(%source, key = %key, error = %e, "failed to cache candidates");
                }
                (candidates, false, None)
            }
            Err(e) => {
                warn!(%source, title = %query.title, error = %e, "metadata fetch failed");
                (Vec::new(), false, Some(e.to_string()))
            }
        }
    }

    /// Ask every source about `cluster` and pick the best match per source.
    pub fn resolve_cluster(&self, cluster: BookCluster) -> ResolvedBook {
        let target = cluster
            .representative()
            .tags
            .as_ref()
            .map(MetadataCandidate::from_tags)
            .filter(|t| !t.title.trim().is_empty())
            .unwrap_or_else(|| MetadataCandidate::new(MetadataSource::Id3, cluster.name.clone()));

        let query = FetchQuery::for_cluster(&cluster, &self.keyword_delimiter);
        let mut sources = Vec::with_capacity(self.fetchers.len());

        for fetcher in &self.fetchers {
            let mut result = SourceResult::empty(fetcher.source());
            if query.is_empty() {
                sources.push(result);
                continue;
            }

            let (candidates, from_cache, error) = self.lookup(fetcher.as_ref(), &query);
            result.candidate_count = candidates.len();
            result.ranked = rank(&target, &candidates);
            result.best = pick_best(result.ranked.iter().cloned());
            result.from_cache = from_cache;
            result.error = error;
            sources.push(result);
        }

        let resolved = ResolvedBook {
            cluster,
            target,
            sources,
        };
        info!(
            book = %resolved.cluster.name,
            files = resolved.cluster.len(),
            matched = resolved.is_matched(),
            "resolved book"
        );
        resolved
    }

    /// Group `files`, resolve every cluster and append its rows to `log_path`.
    ///
    /// A failed log write is recorded in the report; the remaining books are
    /// still processed.
    pub fn run(&self, files: Vec<RawFile>, source_root: &Path, log_path: &Path) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::default();

        for cluster in self.grouper.group_folders(files, source_root) {
            let book = self.resolve_cluster(cluster);
            let written = book
                .log_records()
                .and_then(|records| append_records(log_path, &records));
            if let Err(e) = written {
                warn!(book = %book.cluster.name, error = %e, "failed to write log records");
                report
                    .log_failures
                    .push((book.cluster.name.clone(), e.to_string()));
            }
            report.books.push(book);
        }

        report.elapsed = started.elapsed();
        info!(
            books = report.books.len(),
            matched = report.matched(),
            elapsed = %report.elapsed_display(),
            "run finished"
        );
        report
    }

    /// Scan `source_root` with `reader`, then [`Self::run`].
    pub fn run_directory(
        &self,
        source_root: &Path,
        reader: &dyn TagReader,
        log_path: &Path,
    ) -> Result<RunReport> {
        let files = scan_directory(source_root, reader)?;
        Ok(self.run(files, source_root, log_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookbinder_core::models::FileTags;

    fn resolved(sources: Vec<SourceResult>) -> ResolvedBook {
        let mut tags = FileTags::new("Dune");
        tags.authors = vec!["Frank Herbert".to_string()];
        let cluster = BookCluster::named("Dune", RawFile::new("/l/Dune/01.m4b", tags.clone()));
        ResolvedBook {
            cluster,
            target: MetadataCandidate::from_tags(&tags),
            sources,
        }
    }

    fn source_with(source: MetadataSource, title: &str, score: u8) -> SourceResult {
        let candidate = MetadataCandidate::new(source, title).with_authors(["Frank Herbert"]);
        let scored = ScoredCandidate { candidate, score };
        SourceResult {
            source,
            candidate_count: 1,
            ranked: vec![scored.clone()],
            best: Some(scored),
            from_cache: false,
            error: None,
        }
    }

    #[test]
    fn best_match_prefers_earlier_source_on_tie() {
        let book = resolved(vec![
            source_with(MetadataSource::Mam, "Dune", 80),
            source_with(MetadataSource::Audible, "Dune", 80),
        ]);
        assert_eq!(book.best_match().unwrap().candidate.source, MetadataSource::Mam);

        let book = resolved(vec![
            source_with(MetadataSource::Mam, "Dune", 70),
            source_with(MetadataSource::Audible, "Dune", 95),
        ]);
        assert_eq!(book.best_match().unwrap().candidate.source, MetadataSource::Audible);
    }

    #[test]
    fn unmatched_book_falls_back_to_tags() {
        let book = resolved(vec![SourceResult::empty(MetadataSource::Mam)]);
        assert!(!book.is_matched());
        assert_eq!(book.chosen().source, MetadataSource::Id3);
        assert_eq!(book.target_paths(), vec![PathBuf::from("Frank Herbert/Dune")]);
    }

    #[test]
    fn target_paths_per_series() {
        let mut source = source_with(MetadataSource::Audible, "Dune (Unabridged)", 90);
        if let Some(best) = source.best.as_mut() {
            best.candidate = best
                .candidate
                .clone()
                .with_series("Dune: Chronicles", "1")
                .with_series("Sci/Fi Classics", "");
        }
        let book = resolved(vec![source]);
        assert_eq!(
            book.target_paths(),
            vec![
                PathBuf::from("Frank Herbert/Dune Chronicles/Dune Chronicles #1 - Dune"),
                PathBuf::from("Frank Herbert/Sci_Fi Classics/Sci_Fi Classics - Dune"),
            ]
        );
    }

    #[test]
    fn log_records_fill_counts_and_source_columns() {
        let book = resolved(vec![
            SourceResult::empty(MetadataSource::Mam),
            source_with(MetadataSource::Audible, "Dune", 91),
            source_with(MetadataSource::Goodreads, "Dune", 50),
        ]);
        let records = book.log_records().unwrap();
        assert_eq!(records.len(), 1);

        let row = &records[0];
        assert_eq!(row.get("isMatched"), Some("true"));
        assert_eq!(row.get("mamCount"), Some("0"));
        assert_eq!(row.get("audibleMatchCount"), Some("1"));
        assert_eq!(row.get("metadatasource"), Some("audible"));
        assert_eq!(row.get("adb-matchRate"), Some("91"));
        assert_eq!(row.get("id3-title"), Some("Dune"));
        assert_eq!(row.get("id3-matchRate"), Some(""));
        assert_eq!(row.get("mam-title"), None);
    }

    #[test]
    fn pipeline_from_config_without_fetchers() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.cache.enabled = false;
        config.cache.directory = dir.path().join("cache").to_string_lossy().to_string();

        let pipeline = MatchPipeline::new(&config);
        assert!(!pipeline.cache().is_enabled());
        assert_eq!(pipeline.cache().root(), config.cache_dir());

        let cluster = BookCluster::new(RawFile::untagged("/l/Dune/01.m4b"));
        let book = pipeline.resolve_cluster(cluster);
        assert!(book.sources.is_empty());
        assert!(!book.is_matched());
        assert_eq!(book.target.title, "01");
        assert_eq!(book.target_paths(), vec![PathBuf::from("Unknown/01")]);
    }

    #[test]
    fn elapsed_display_format() {
        let report = RunReport {
            elapsed: Duration::from_millis(3_723_500),
            ..Default::default()
        };
        assert_eq!(
            report.elapsed_display(),
            "Elapsed time: 1 hours, 2 minutes, 3.50 seconds"
        );
    }
}
