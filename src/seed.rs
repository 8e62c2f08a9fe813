//! Catalog seeding from a JSON file.
//!
//! The seed file is a JSON array of library entries in the same shape the
//! registration API accepts:
//!
//! ```json
//! [
//!   {
//!     "name": "requests",
//!     "language": "Python",
//!     "ecosystem": "PyPI",
//!     "aliases": ["python-requests"],
//!     "keywords": ["http", "client"],
//!     "description": "HTTP for Humans",
//!     "popularity_score": 95
//!   }
//! ]
//! ```
//!
//! Entries that are already registered are skipped with a warning, so seeding
//! an existing database is a no-op. Validation failures abort the run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use c7_resolver_core::catalog::{register_library, CatalogError, NewLibrary};
use c7_resolver_core::store::MetadataStore;

/// Outcome of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse a seed file into registration requests.
pub fn load_seed_file(path: &Path) -> Result<Vec<NewLibrary>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let entries: Vec<NewLibrary> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;
    Ok(entries)
}

/// Register every entry in `entries`, skipping ones that conflict with
/// existing records.
pub async fn seed_entries<S>(store: &S, entries: &[NewLibrary]) -> Result<SeedReport>
where
    S: MetadataStore + ?Sized,
{
    let mut report = SeedReport::default();

    for entry in entries {
        match register_library(store, entry).await {
            Ok(record) => {
                report.inserted += 1;
                tracing::debug!(canonical_id = %record.canonical_id, "seeded library");
            }
            Err(CatalogError::Conflict(msg)) => {
                report.skipped += 1;
                warn!(name = %entry.name, ecosystem = %entry.ecosystem, "skipping seed entry: {}", msg);
            }
            Err(CatalogError::Validation(msg)) => {
                anyhow::bail!("invalid seed entry '{}': {}", entry.name, msg);
            }
            Err(CatalogError::Store(e)) => return Err(e),
        }
    }

    Ok(report)
}

/// Load `path` and register its entries into `store`.
pub async fn seed_catalog<S>(store: &S, path: &Path) -> Result<SeedReport>
where
    S: MetadataStore + ?Sized,
{
    let entries = load_seed_file(path)?;
    let report = seed_entries(store, &entries).await?;
    info!(
        path = %path.display(),
        inserted = report.inserted,
        skipped = report.skipped,
        "catalog seeded"
    );
    Ok(report)
}
