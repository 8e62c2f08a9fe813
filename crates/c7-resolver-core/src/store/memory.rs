//! In-memory [`MetadataStore`] implementation for tests and embedding.
//!
//! Records live in a `HashMap` keyed by `id` behind `std::sync::RwLock`.
//! Every lookup is a linear scan.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{LibraryFilter, LibraryRecord};

use super::MetadataStore;

/// In-memory library catalog.
pub struct InMemoryStore {
    libraries: RwLock<HashMap<String, LibraryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            libraries: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store pre-populated with `records`.
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = LibraryRecord>,
    {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            libraries: RwLock::new(map),
        }
    }

    /// Number of stored records. A poisoned lock still reports the map's
    /// contents; lookups surface the poisoning as an error.
    pub fn len(&self) -> usize {
        match self.libraries.read() {
            Ok(libraries) => libraries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn scan<F>(&self, filter: &LibraryFilter, pred: F) -> Result<Vec<LibraryRecord>>
    where
        F: Fn(&LibraryRecord) -> bool,
    {
        let libraries = self
            .libraries
            .read()
            .map_err(|_| anyhow!("library store lock poisoned"))?;
        let mut found: Vec<LibraryRecord> = libraries
            .values()
            .filter(|r| filter.matches(r) && pred(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.canonical_id.cmp(&b.canonical_id));
        Ok(found)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn find_by_exact_name(
        &self,
        name: &str,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>> {
        let needle = name.to_lowercase();
        self.scan(filter, |r| r.name.to_lowercase() == needle)
    }

    async fn find_by_alias(
        &self,
        name: &str,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>> {
        let needle = name.to_lowercase();
        self.scan(filter, |r| {
            r.aliases.iter().any(|a| a.to_lowercase() == needle)
        })
    }

    async fn find_by_name_substring(
        &self,
        name: &str,
        limit: usize,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>> {
        let needle = name.to_lowercase();
        let mut found = self.scan(filter, |r| r.name.to_lowercase().contains(&needle))?;
        found.sort_by(|a, b| {
            b.popularity_score
                .cmp(&a.popularity_score)
                .then_with(|| a.canonical_id.cmp(&b.canonical_id))
        });
        found.truncate(limit);
        Ok(found)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<LibraryRecord>> {
        let libraries = self
            .libraries
            .read()
            .map_err(|_| anyhow!("library store lock poisoned"))?;
        Ok(libraries.get(id).cloned())
    }

    async fn get_by_canonical_id(&self, canonical_id: &str) -> Result<Option<LibraryRecord>> {
        let libraries = self
            .libraries
            .read()
            .map_err(|_| anyhow!("library store lock poisoned"))?;
        Ok(libraries
            .values()
            .find(|r| r.canonical_id == canonical_id)
            .cloned())
    }

    async fn list_libraries(&self, filter: &LibraryFilter) -> Result<Vec<LibraryRecord>> {
        self.scan(filter, |_| true)
    }

    async fn upsert_library(&self, record: &LibraryRecord) -> Result<()> {
        let mut libraries = self
            .libraries
            .write()
            .map_err(|_| anyhow!("library store lock poisoned"))?;
        if let Some(other) = libraries
            .values()
            .find(|r| r.canonical_id == record.canonical_id && r.id != record.id)
        {
            anyhow::bail!(
                "canonical_id '{}' already belongs to library '{}'",
                record.canonical_id,
                other.id
            );
        }
        libraries.insert(record.id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LibraryStatus;

    fn rec(id: &str, name: &str, canonical_id: &str, popularity: u8) -> LibraryRecord {
        LibraryRecord {
            id: id.into(),
            name: name.into(),
            canonical_id: canonical_id.into(),
            aliases: vec![],
            language: "JavaScript".into(),
            ecosystem: "npm".into(),
            keywords: vec![],
            description: String::new(),
            popularity_score: popularity,
            status: LibraryStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_exact_name_is_case_insensitive() {
        let store = InMemoryStore::with_records([rec("a", "React", "/npm/react", 90)]);
        let found = store
            .find_by_exact_name("REACT", &LibraryFilter::none())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(store
            .find_by_exact_name("reac", &LibraryFilter::none())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = InMemoryStore::with_records([rec("lib-npm-react", "React", "/npm/react", 90)]);
        let got = store.get_by_id("lib-npm-react").await.unwrap().unwrap();
        assert_eq!(got.canonical_id, "/npm/react");
        assert!(store.get_by_id("lib-npm-vue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_poisoned_lock() {
        let store = std::sync::Arc::new(InMemoryStore::with_records([
            rec("a", "react", "/npm/react", 90),
            rec("b", "vue", "/npm/vue", 80),
        ]));
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.libraries.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(store.len(), 2);
        let err = store.get_by_id("a").await.unwrap_err();
        assert!(err.to_string().contains("poisoned"));
        assert!(store
            .find_by_exact_name("react", &LibraryFilter::none())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_alias_lookup() {
        let mut r = rec("a", "Next.js", "/npm/next", 90);
        r.aliases = vec!["NextJS".into(), "next".into()];
        let store = InMemoryStore::with_records([r]);
        let found = store
            .find_by_alias("nextjs", &LibraryFilter::none())
            .await
            .unwrap();
        assert_eq!(found[0].canonical_id, "/npm/next");
    }

    #[tokio::test]
    async fn test_substring_orders_by_popularity_and_limits() {
        let store = InMemoryStore::with_records([
            rec("a", "react-router", "/npm/react-router", 60),
            rec("b", "react-router-dom", "/npm/react-router-dom", 80),
            rec("c", "preact-router", "/npm/preact-router", 20),
            rec("d", "vue-router", "/npm/vue-router", 90),
        ]);
        let found = store
            .find_by_name_substring("REACT-ROUTER", 2, &LibraryFilter::none())
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["/npm/react-router-dom", "/npm/react-router"]);
    }

    #[tokio::test]
    async fn test_filter_applies_to_lookups() {
        let mut old = rec("a", "request", "/npm/request", 70);
        old.status = LibraryStatus::Deprecated;
        let store = InMemoryStore::with_records([old]);
        let active_only = LibraryFilter::none().with_status(LibraryStatus::Active);
        assert!(store
            .find_by_exact_name("request", &active_only)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .find_by_exact_name("request", &LibraryFilter::none())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_upsert_rejects_duplicate_canonical_id() {
        let store = InMemoryStore::new();
        store
            .upsert_library(&rec("a", "react", "/npm/react", 90))
            .await
            .unwrap();
        assert!(store
            .upsert_library(&rec("b", "React", "/npm/react", 10))
            .await
            .is_err());
        // Same id replaces in place.
        store
            .upsert_library(&rec("a", "react", "/npm/react", 95))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        let got = store.get_by_canonical_id("/npm/react").await.unwrap().unwrap();
        assert_eq!(got.popularity_score, 95);
    }
}
