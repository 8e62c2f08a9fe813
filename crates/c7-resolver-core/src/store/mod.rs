//! Storage abstraction for library metadata.
//!
//! The [`MetadataStore`] trait defines the lookups the resolver needs plus
//! the small write/read surface the catalog uses. Backends (SQLite,
//! in-memory) must be `Send + Sync` and handle their own read concurrency;
//! the resolver shares one store handle across all concurrent calls.
//!
//! # Matching contract
//!
//! All name and alias comparisons are case-insensitive. Result order is
//! deterministic:
//!
//! | Method | Order |
//! |--------|-------|
//! | [`find_by_exact_name`](MetadataStore::find_by_exact_name) | `canonical_id` asc |
//! | [`find_by_alias`](MetadataStore::find_by_alias) | `canonical_id` asc |
//! | [`find_by_name_substring`](MetadataStore::find_by_name_substring) | `popularity_score` desc, `canonical_id` asc, then truncated to `limit` |
//! | [`list_libraries`](MetadataStore::list_libraries) | `canonical_id` asc |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{LibraryFilter, LibraryRecord};

/// Abstract storage backend for the library catalog.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Records whose `name` equals `name`, ignoring case.
    async fn find_by_exact_name(
        &self,
        name: &str,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>>;

    /// Records whose `aliases` contain `name`, ignoring case.
    async fn find_by_alias(&self, name: &str, filter: &LibraryFilter)
        -> Result<Vec<LibraryRecord>>;

    /// Records whose `name` contains `name` as a substring, ignoring case.
    /// Returns at most `limit` records.
    async fn find_by_name_substring(
        &self,
        name: &str,
        limit: usize,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>>;

    /// Look a record up by its internal `id` (exact, case-sensitive).
    async fn get_by_id(&self, id: &str) -> Result<Option<LibraryRecord>>;

    /// Look a record up by its canonical id (exact, case-sensitive).
    async fn get_by_canonical_id(&self, canonical_id: &str) -> Result<Option<LibraryRecord>>;

    /// All records matching `filter`.
    async fn list_libraries(&self, filter: &LibraryFilter) -> Result<Vec<LibraryRecord>>;

    /// Insert a record, or replace the record with the same `id`.
    async fn upsert_library(&self, record: &LibraryRecord) -> Result<()>;
}
