//! Best-candidate selection.
//!
//! A target and every candidate are rendered as `title|authors|series`
//! strings and compared with the similarity scorer. Scores are returned next
//! to the candidates; the candidates themselves are never modified.

use bookbinder_core::models::{FileTags, MetadataCandidate, ScoredCandidate, Series};
use bookbinder_core::similarity;

/// Anything that can be compared against metadata candidates.
pub trait MatchTarget {
    fn title(&self) -> &str;
    fn authors(&self) -> Vec<String>;
    fn series(&self) -> Vec<Series>;

    /// `title|authors|series` with list order preserved.
    fn composite(&self) -> String {
        let series = self
            .series()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        [self.title().to_string(), self.authors().join(","), series].join("|")
    }
}

impl MatchTarget for MetadataCandidate {
    fn title(&self) -> &str {
        &self.title
    }

    fn authors(&self) -> Vec<String> {
        self.authors.clone()
    }

    fn series(&self) -> Vec<Series> {
        self.series.clone()
    }
}

impl MatchTarget for FileTags {
    fn title(&self) -> &str {
        &self.title
    }

    fn authors(&self) -> Vec<String> {
        self.authors.clone()
    }

    fn series(&self) -> Vec<Series> {
        if self.series.trim().is_empty() {
            Vec::new()
        } else {
            vec![Series::new(self.series.trim(), self.series_part.trim())]
        }
    }
}

/// Score every candidate against `target`, in input order.
pub fn rank<T>(target: &T, candidates: &[MetadataCandidate]) -> Vec<ScoredCandidate>
where
    T: MatchTarget + ?Sized,
{
    let target_string = target.composite();
    candidates
        .iter()
        .map(|candidate| ScoredCandidate {
            score: similarity::score(&target_string, &candidate.composite()),
            candidate: candidate.clone(),
        })
        .collect()
}

/// Highest-scoring candidate, or `None` for an empty list or when nothing
/// scores above 0. Ties keep the earlier candidate.
pub fn select_best<T>(target: &T, candidates: &[MetadataCandidate]) -> Option<ScoredCandidate>
where
    T: MatchTarget + ?Sized,
{
    pick_best(rank(target, candidates))
}

/// Running-maximum pick over already scored candidates. Only a strictly
/// greater score replaces the current best.
pub fn pick_best<I>(scored: I) -> Option<ScoredCandidate>
where
    I: IntoIterator<Item = ScoredCandidate>,
{
    let mut best: Option<ScoredCandidate> = None;
    let mut best_score = 0u8;
    for item in scored {
        if item.score > best_score {
            best_score = item.score;
            best = Some(item);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookbinder_core::models::MetadataSource;

    fn candidate(title: &str, author: &str) -> MetadataCandidate {
        MetadataCandidate::new(MetadataSource::Audible, title).with_authors([author])
    }

    fn scored(asin: &str, score: u8) -> ScoredCandidate {
        let mut c = candidate("Dune", "Frank Herbert");
        c.asin = Some(asin.to_string());
        ScoredCandidate {
            candidate: c,
            score,
        }
    }

    #[test]
    fn composite_string_layout() {
        let target = candidate("Dune", "Frank Herbert");
        assert_eq!(target.composite(), "Dune|Frank Herbert|");

        let with_series = candidate("Dune", "Frank Herbert")
            .with_series("Dune", "1")
            .with_series("Classics", "");
        assert_eq!(with_series.composite(), "Dune|Frank Herbert|Dune #1,Classics");
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let target = candidate("Dune", "Frank Herbert");
        assert!(select_best(&target, &[]).is_none());
    }

    #[test]
    fn tie_keeps_first_seen() {
        let best = pick_best(vec![scored("a", 40), scored("b", 90), scored("c", 90)]).unwrap();
        assert_eq!(best.score, 90);
        assert_eq!(best.candidate.asin.as_deref(), Some("b"));
    }

    #[test]
    fn all_zero_scores_select_nothing() {
        assert!(pick_best(vec![scored("a", 0), scored("b", 0)]).is_none());
    }

    #[test]
    fn dune_prefers_higher_token_overlap() {
        let target = candidate("Dune", "Frank Herbert");
        let candidates = vec![
            candidate("Dune", "Frank Herbert").with_series("Dune", "1"),
            candidate("Children of Dune", "Frank Herbert").with_series("Dune", "3"),
        ];

        let best = select_best(&target, &candidates).unwrap();
        assert_eq!(best.candidate, candidates[0]);

        let ranked = rank(&target, &candidates);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn identical_candidates_tie_on_first() {
        let target = candidate("Dune", "Frank Herbert");
        let mut first = candidate("Dune", "Frank Herbert");
        first.asin = Some("first".to_string());
        let mut second = first.clone();
        second.asin = Some("second".to_string());

        let best = select_best(&target, &[candidate("Emma", "Jane Austen"), first, second])
            .unwrap();
        assert_eq!(best.score, 100);
        assert_eq!(best.candidate.asin.as_deref(), Some("first"));
    }

    #[test]
    fn file_tags_are_a_target() {
        let mut tags = FileTags::new("Dune");
        tags.authors = vec!["Frank Herbert".to_string()];
        tags.series = "Dune".to_string();
        tags.series_part = "1".to_string();
        assert_eq!(tags.composite(), "Dune|Frank Herbert|Dune #1");
    }

    #[test]
    fn ranking_leaves_candidates_untouched() {
        let target = candidate("Dune", "Frank Herbert");
        let candidates = vec![candidate("Dune Messiah", "Frank Herbert")];
        let before = candidates.clone();
        let _ = rank(&target, &candidates);
        assert_eq!(candidates, before);
    }
}
