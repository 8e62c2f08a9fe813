//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/c7.sqlite"
//!
//! [resolver]
//! fuzzy_limit = 10
//!
//! [scoring]
//! language_hint = 10.0
//! deprecated_penalty = -20.0
//!
//! [server]
//! bind = "127.0.0.1:7331"
//!
//! [catalog]
//! seed_path = "./catalog.json"
//! ```
//!
//! Only `[db]` and `[server]` are required. Missing scoring weights fall back
//! to the defaults in [`ScoringWeights`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use c7_resolver_core::resolver::ResolverParams;
use c7_resolver_core::scoring::ScoringWeights;

/// Top-level configuration, one field per TOML section.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database settings. Required.
    pub db: DbConfig,
    /// Candidate search tuning.
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Disambiguation weights.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// HTTP tool server settings. Required.
    pub server: ServerConfig,
    /// Catalog seeding.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// `[db]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Path to the SQLite file. Parent directories are created on connect.
    pub path: PathBuf,
}

/// `[resolver]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    /// Maximum candidates taken from the substring tier. Must be at least 1.
    #[serde(default = "default_fuzzy_limit")]
    pub fuzzy_limit: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_limit: default_fuzzy_limit(),
        }
    }
}

fn default_fuzzy_limit() -> usize {
    10
}

/// `[scoring]` section. Every weight is optional.
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Bonus when the query hints at the record's language.
    #[serde(default = "default_hint")]
    pub language_hint: f64,
    /// Bonus when the query hints at the record's ecosystem.
    #[serde(default = "default_hint")]
    pub ecosystem_hint: f64,
    /// Bonus per record keyword present in the query.
    #[serde(default = "default_keyword_match")]
    pub keyword_match: f64,
    /// Bonus per description word present in the query.
    #[serde(default = "default_description_match")]
    pub description_match: f64,
    /// Bonus at `popularity_score = 100`, scaled linearly below that.
    #[serde(default = "default_popularity_max")]
    pub popularity_max: f64,
    /// Added for `deprecated` records. Must be `<= 0`.
    #[serde(default = "default_deprecated_penalty")]
    pub deprecated_penalty: f64,
    /// Added for `archived` records. Must be `<= 0`.
    #[serde(default = "default_archived_penalty")]
    pub archived_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            language_hint: default_hint(),
            ecosystem_hint: default_hint(),
            keyword_match: default_keyword_match(),
            description_match: default_description_match(),
            popularity_max: default_popularity_max(),
            deprecated_penalty: default_deprecated_penalty(),
            archived_penalty: default_archived_penalty(),
        }
    }
}

fn default_hint() -> f64 {
    10.0
}
fn default_keyword_match() -> f64 {
    1.0
}
fn default_description_match() -> f64 {
    0.5
}
fn default_popularity_max() -> f64 {
    5.0
}
fn default_deprecated_penalty() -> f64 {
    -20.0
}
fn default_archived_penalty() -> f64 {
    -50.0
}

/// `[server]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on, e.g. `"127.0.0.1:7331"`.
    pub bind: String,
}

/// `[catalog]` section.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// JSON array of libraries registered at server start.
    pub seed_path: Option<PathBuf>,
}

impl ScoringConfig {
    pub fn weights(&self) -> ScoringWeights {
        ScoringWeights {
            language_hint: self.language_hint,
            ecosystem_hint: self.ecosystem_hint,
            keyword_match: self.keyword_match,
            description_match: self.description_match,
            popularity_max: self.popularity_max,
            deprecated_penalty: self.deprecated_penalty,
            archived_penalty: self.archived_penalty,
        }
    }
}

impl Config {
    /// Resolver tuning derived from `[resolver]` and `[scoring]`.
    pub fn resolver_params(&self) -> ResolverParams {
        ResolverParams {
            fuzzy_limit: self.resolver.fuzzy_limit,
            weights: self.scoring.weights(),
        }
    }

    /// Check the invariants `load_config` enforces.
    pub fn validate(&self) -> Result<()> {
        if self.resolver.fuzzy_limit == 0 {
            anyhow::bail!("resolver.fuzzy_limit must be >= 1");
        }

        let s = &self.scoring;
        let weights = [
            ("language_hint", s.language_hint),
            ("ecosystem_hint", s.ecosystem_hint),
            ("keyword_match", s.keyword_match),
            ("description_match", s.description_match),
            ("popularity_max", s.popularity_max),
            ("deprecated_penalty", s.deprecated_penalty),
            ("archived_penalty", s.archived_penalty),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                anyhow::bail!("scoring.{} must be a finite number", name);
            }
        }
        for (name, value) in &weights[..5] {
            if *value < 0.0 {
                anyhow::bail!("scoring.{} must be >= 0", name);
            }
        }
        for (name, value) in &weights[5..] {
            if *value > 0.0 {
                anyhow::bail!("scoring.{} must be <= 0", name);
            }
        }

        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }

        Ok(())
    }
}

/// Load, parse, and validate a TOML config file.
///
/// # Arguments
///
/// - `path`: the config file to read.
///
/// # Returns
///
/// The validated [`Config`], or an error naming the file that could not be
/// read, the parse failure, or the first invalid setting.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
