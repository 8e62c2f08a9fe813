//! Disambiguation scoring.
//!
//! When a search tier returns more than one candidate, each candidate is
//! scored independently against the query's token set:
//!
//! | Signal | Default contribution |
//! |--------|----------------------|
//! | Language hint | +10 |
//! | Ecosystem hint | +10 |
//! | Keyword overlap | +1 per keyword |
//! | Description overlap | +0.5 per word |
//! | Popularity | `popularity / 100 × 5` |
//! | Status | −20 deprecated, −50 archived |
//!
//! Candidates are then ordered by total score (desc), popularity (desc), and
//! canonical id (asc). The last key makes the order total, so resolution is
//! deterministic for a given store state.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::hints::QueryHints;
use crate::models::{LibraryRecord, LibraryStatus};

/// Weights for each scoring signal, decoupled from application config.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub language_hint: f64,
    pub ecosystem_hint: f64,
    pub keyword_match: f64,
    pub description_match: f64,
    /// Bonus at `popularity_score == 100`; scales linearly from 0.
    pub popularity_max: f64,
    pub deprecated_penalty: f64,
    pub archived_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            language_hint: 10.0,
            ecosystem_hint: 10.0,
            keyword_match: 1.0,
            description_match: 0.5,
            popularity_max: 5.0,
            deprecated_penalty: -20.0,
            archived_penalty: -50.0,
        }
    }
}

/// A query prepared for scoring: its token set and inferred hints.
#[derive(Debug, Clone)]
pub struct QueryContext {
    tokens: HashSet<String>,
    hints: QueryHints,
}

impl QueryContext {
    /// Lower-case and whitespace-split `query`.
    pub fn new(query: &str) -> Self {
        let tokens: HashSet<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let hints = QueryHints::from_tokens(tokens.iter().map(String::as_str));
        Self { tokens, hints }
    }

    pub fn tokens(&self) -> &HashSet<String> {
        &self.tokens
    }

    pub fn hints(&self) -> &QueryHints {
        &self.hints
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Per-signal contributions for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub language: f64,
    pub ecosystem: f64,
    pub keywords: f64,
    pub description: f64,
    pub popularity: f64,
    pub status: f64,
    pub total: f64,
}

/// A candidate together with its score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub canonical_id: String,
    pub name: String,
    pub popularity_score: u8,
    pub status: LibraryStatus,
    pub score: ScoreBreakdown,
}

/// Score one candidate against the query.
pub fn score_candidate(
    record: &LibraryRecord,
    query: &QueryContext,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let hints = query.hints();

    let language = if hints.matches_language(&record.language) {
        weights.language_hint
    } else {
        0.0
    };

    let ecosystem = if hints.matches_ecosystem(&record.ecosystem) {
        weights.ecosystem_hint
    } else {
        0.0
    };

    let keyword_hits = record
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .collect::<HashSet<_>>()
        .iter()
        .filter(|k| query.tokens().contains(k.as_str()))
        .count();
    let keywords = keyword_hits as f64 * weights.keyword_match;

    let description_hits = record
        .description
        .to_lowercase()
        .split_whitespace()
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|w| query.tokens().contains(*w))
        .count();
    let description = description_hits as f64 * weights.description_match;

    let popularity_score = record.popularity_score.min(100);
    let popularity = f64::from(popularity_score) / 100.0 * weights.popularity_max;

    let status = match record.status {
        LibraryStatus::Active => 0.0,
        LibraryStatus::Deprecated => weights.deprecated_penalty,
        LibraryStatus::Archived => weights.archived_penalty,
    };

    ScoreBreakdown {
        language,
        ecosystem,
        keywords,
        description,
        popularity,
        status,
        total: language + ecosystem + keywords + description + popularity + status,
    }
}

/// Total order for scored candidates: best first.
pub fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then(b.popularity_score.cmp(&a.popularity_score))
        .then_with(|| a.canonical_id.cmp(&b.canonical_id))
}

/// Score every candidate and sort best first.
pub fn rank_candidates(
    records: &[LibraryRecord],
    query: &QueryContext,
    weights: &ScoringWeights,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = records
        .iter()
        .map(|r| ScoredCandidate {
            canonical_id: r.canonical_id.clone(),
            name: r.name.clone(),
            popularity_score: r.popularity_score,
            status: r.status,
            score: score_candidate(r, query, weights),
        })
        .collect();
    scored.sort_by(compare_candidates);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(canonical_id: &str, language: &str, ecosystem: &str) -> LibraryRecord {
        LibraryRecord {
            id: format!("lib{}", canonical_id.replace('/', "-")),
            name: "requests".into(),
            canonical_id: canonical_id.into(),
            aliases: vec![],
            language: language.into(),
            ecosystem: ecosystem.into(),
            keywords: vec![],
            description: String::new(),
            popularity_score: 0,
            status: LibraryStatus::Active,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_query_tokens_lowercased() {
        let q = QueryContext::new("  Python   HTTP client ");
        assert_eq!(q.tokens().len(), 3);
        assert!(q.tokens().contains("python"));
        assert!(q.tokens().contains("http"));
        assert!(QueryContext::new("   ").is_empty());
    }

    #[test]
    fn test_language_and_ecosystem_hints() {
        let w = ScoringWeights::default();
        let q = QueryContext::new("pip install for python");
        let py = score_candidate(&lib("/pypi/requests", "Python", "pypi"), &q, &w);
        assert!(approx(py.language, 10.0));
        assert!(approx(py.ecosystem, 10.0));

        let js = score_candidate(&lib("/npm/requests", "JavaScript", "npm"), &q, &w);
        assert!(approx(js.language, 0.0));
        assert!(approx(js.ecosystem, 0.0));
    }

    #[test]
    fn test_keyword_overlap_counts_distinct_keywords() {
        let w = ScoringWeights::default();
        let mut rec = lib("/pypi/requests", "Python", "pypi");
        rec.keywords = vec!["HTTP".into(), "client".into(), "http".into(), "async".into()];
        let q = QueryContext::new("an http client");
        let s = score_candidate(&rec, &q, &w);
        assert!(approx(s.keywords, 2.0));
    }

    #[test]
    fn test_description_overlap_half_point_per_word() {
        let w = ScoringWeights::default();
        let mut rec = lib("/pypi/requests", "Elixir", "hex");
        rec.description = "Simple HTTP library, simple and elegant".into();
        let q = QueryContext::new("simple http library");
        let s = score_candidate(&rec, &q, &w);
        // "simple", "http" match; "library," keeps its comma so it does not.
        assert!(approx(s.description, 1.0));
    }

    #[test]
    fn test_popularity_linear() {
        let w = ScoringWeights::default();
        let q = QueryContext::new("");
        let mut rec = lib("/pypi/requests", "Python", "pypi");
        rec.popularity_score = 100;
        assert!(approx(score_candidate(&rec, &q, &w).popularity, 5.0));
        rec.popularity_score = 40;
        assert!(approx(score_candidate(&rec, &q, &w).popularity, 2.0));
        rec.popularity_score = 0;
        assert!(approx(score_candidate(&rec, &q, &w).popularity, 0.0));
    }

    #[test]
    fn test_status_penalties() {
        let w = ScoringWeights::default();
        let q = QueryContext::new("");
        let mut rec = lib("/pypi/requests", "Python", "pypi");
        assert!(approx(score_candidate(&rec, &q, &w).status, 0.0));
        rec.status = LibraryStatus::Deprecated;
        assert!(approx(score_candidate(&rec, &q, &w).status, -20.0));
        rec.status = LibraryStatus::Archived;
        let s = score_candidate(&rec, &q, &w);
        assert!(approx(s.status, -50.0));
        assert!(s.total < 0.0);
    }

    #[test]
    fn test_total_is_sum_of_signals() {
        let w = ScoringWeights::default();
        let mut rec = lib("/pypi/requests", "Python", "pypi");
        rec.keywords = vec!["http".into()];
        rec.description = "HTTP for humans".into();
        rec.popularity_score = 80;
        rec.status = LibraryStatus::Deprecated;
        let s = score_candidate(&rec, &QueryContext::new("python http"), &w);
        // 10 (lang) + 0 (eco) + 1 (kw) + 0.5 (desc) + 4 (pop) - 20
        assert!(approx(s.total, -4.5));
    }

    #[test]
    fn test_rank_tie_breaks_popularity_then_id() {
        let w = ScoringWeights {
            popularity_max: 0.0,
            ..ScoringWeights::default()
        };
        let q = QueryContext::new("");
        let mut a = lib("/npm/b-lib", "JavaScript", "npm");
        a.popularity_score = 50;
        let mut b = lib("/npm/a-lib", "JavaScript", "npm");
        b.popularity_score = 50;
        let mut c = lib("/npm/c-lib", "JavaScript", "npm");
        c.popularity_score = 70;

        let ranked = rank_candidates(&[a, b, c], &q, &w);
        let order: Vec<&str> = ranked.iter().map(|r| r.canonical_id.as_str()).collect();
        assert_eq!(order, vec!["/npm/c-lib", "/npm/a-lib", "/npm/b-lib"]);
    }

    #[test]
    fn test_deprecated_never_beats_identical_active() {
        let w = ScoringWeights::default();
        let q = QueryContext::new("python http client");
        let active = lib("/pypi/z-requests", "Python", "pypi");
        let mut deprecated = lib("/pypi/a-requests", "Python", "pypi");
        deprecated.status = LibraryStatus::Deprecated;

        let ranked = rank_candidates(&[deprecated, active], &q, &w);
        assert_eq!(ranked[0].canonical_id, "/pypi/z-requests");
    }
}
