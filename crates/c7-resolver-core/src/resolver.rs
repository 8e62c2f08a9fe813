//! Library name resolution.
//!
//! [`LibraryResolver::resolve`] maps a user-supplied library name plus
//! free-text query context to one canonical library id.
//!
//! # Algorithm
//!
//! 1. Trim `library_name`; reject it if empty.
//! 2. Search tiers in order, stopping at the first tier with results:
//!    exact name, alias, bounded name substring.
//! 3. No candidates → [`ResolveError::NotFound`]. Store failures in any tier
//!    are returned as-is; later tiers are not tried.
//! 4. One candidate → its `canonical_id`.
//! 5. Several → score each (see [`crate::scoring`]) and return the best.
//!
//! The resolver holds no mutable state. Every call re-queries the store, so a
//! single instance can serve any number of concurrent callers.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{LibraryFilter, LibraryRecord};
use crate::scoring::{rank_candidates, QueryContext, ScoredCandidate, ScoringWeights};
use crate::store::MetadataStore;

/// Errors returned by [`LibraryResolver::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The request was rejected before any store query.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No search tier produced a candidate. Carries `library_name` exactly
    /// as the caller passed it, untrimmed.
    #[error("library not found: {library_name}")]
    NotFound { library_name: String },

    /// The store failed; passed through unchanged.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ResolveError {
    /// Machine-readable error code, sent as `error.code` by the tool server.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::InvalidInput(_) => "bad_request",
            ResolveError::NotFound { .. } => "not_found",
            ResolveError::Store(_) => "store_error",
        }
    }
}

/// Search tier that produced the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    Alias,
    Fuzzy,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchTier::Exact => "exact",
            MatchTier::Alias => "alias",
            MatchTier::Fuzzy => "fuzzy",
        })
    }
}

/// Resolution tuning parameters, decoupled from application config.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverParams {
    /// Maximum candidates returned by the substring tier.
    pub fuzzy_limit: usize,
    pub weights: ScoringWeights,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            fuzzy_limit: 10,
            weights: ScoringWeights::default(),
        }
    }
}

/// Full ranking for one request.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub tier: MatchTier,
    /// Best first. Never empty.
    pub candidates: Vec<ScoredCandidate>,
}

impl Ranking {
    /// The winning canonical id.
    pub fn best(&self) -> &str {
        &self.candidates[0].canonical_id
    }
}

/// Resolves library names to canonical ids against a shared store.
#[derive(Clone)]
pub struct LibraryResolver {
    store: Arc<dyn MetadataStore>,
    params: ResolverParams,
}

impl LibraryResolver {
    pub fn new(store: Arc<dyn MetadataStore>, params: ResolverParams) -> Self {
        Self { store, params }
    }

    /// Resolver with default parameters.
    pub fn with_defaults(store: Arc<dyn MetadataStore>) -> Self {
        Self::new(store, ResolverParams::default())
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub fn params(&self) -> &ResolverParams {
        &self.params
    }

    /// Resolve `library_name` to a canonical id, using `query` to break
    /// ambiguity.
    pub async fn resolve(&self, library_name: &str, query: &str) -> Result<String, ResolveError> {
        let name = normalize_name(library_name)?;
        let (tier, candidates) = self.find_candidates(library_name, name).await?;

        if candidates.len() == 1 {
            debug!(library_name = name, %tier, canonical_id = %candidates[0].canonical_id, "single candidate");
            return Ok(candidates[0].canonical_id.clone());
        }

        let ranking = self.score(tier, &candidates, query);
        Ok(ranking.best().to_string())
    }

    /// Score every candidate of the first non-empty tier.
    ///
    /// Unlike [`resolve`](Self::resolve), a single candidate is still scored so
    /// callers always get a breakdown.
    pub async fn rank(&self, library_name: &str, query: &str) -> Result<Ranking, ResolveError> {
        let name = normalize_name(library_name)?;
        let (tier, candidates) = self.find_candidates(library_name, name).await?;
        Ok(self.score(tier, &candidates, query))
    }

    /// Search the tiers for `name` (already trimmed). `requested` is the
    /// caller's original input, reported back on a miss.
    async fn find_candidates(
        &self,
        requested: &str,
        name: &str,
    ) -> Result<(MatchTier, Vec<LibraryRecord>), ResolveError> {
        let filter = LibraryFilter::none();

        let exact = self.store.find_by_exact_name(name, &filter).await?;
        if !exact.is_empty() {
            return Ok((MatchTier::Exact, exact));
        }

        let alias = self.store.find_by_alias(name, &filter).await?;
        if !alias.is_empty() {
            return Ok((MatchTier::Alias, alias));
        }

        let fuzzy = self
            .store
            .find_by_name_substring(name, self.params.fuzzy_limit, &filter)
            .await?;
        if !fuzzy.is_empty() {
            return Ok((MatchTier::Fuzzy, fuzzy));
        }

        debug!(library_name = name, "no candidates in any tier");
        Err(ResolveError::NotFound {
            library_name: requested.to_string(),
        })
    }

    fn score(&self, tier: MatchTier, candidates: &[LibraryRecord], query: &str) -> Ranking {
        let ctx = QueryContext::new(query);
        let ranked = rank_candidates(candidates, &ctx, &self.params.weights);
        for c in &ranked {
            debug!(
                %tier,
                canonical_id = %c.canonical_id,
                total = c.score.total,
                popularity = c.popularity_score,
                status = %c.status,
                "scored candidate"
            );
        }
        Ranking {
            tier,
            candidates: ranked,
        }
    }
}

fn normalize_name(library_name: &str) -> Result<&str, ResolveError> {
    let name = library_name.trim();
    if name.is_empty() {
        return Err(ResolveError::InvalidInput(
            "library_name must not be empty".to_string(),
        ));
    }
    Ok(name)
}
