//! SQLite-backed [`MetadataStore`] implementation.
//!
//! Maps each store operation onto the `libraries` / `library_aliases` schema
//! created by [`db::run_migrations`](crate::db::run_migrations). Aliases are
//! folded back into each record with `json_group_array`, so every lookup is a
//! single round-trip.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use c7_resolver_core::models::{LibraryFilter, LibraryRecord, LibraryStatus};
use c7_resolver_core::store::MetadataStore;

use crate::config::Config;
use crate::db;

const SELECT_LIBRARY: &str = r#"
    SELECT l.id, l.name, l.canonical_id, l.language, l.ecosystem,
           l.keywords_json, l.description, l.popularity_score, l.status,
           (SELECT json_group_array(alias)
              FROM (SELECT alias FROM library_aliases a
                     WHERE a.library_id = l.id
                     ORDER BY a.position)) AS aliases_json
    FROM libraries l
"#;

/// SQLite implementation of the [`MetadataStore`] trait.
///
/// The pool is safe to share; `SqliteStore` is used behind an `Arc` by the
/// resolver and the tool server.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `[db].path` and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        db::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch(&self, mut qb: QueryBuilder<'_, Sqlite>) -> Result<Vec<LibraryRecord>> {
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &SqliteRow) -> Result<LibraryRecord> {
    let id: String = row.get("id");
    let keywords_json: String = row.get("keywords_json");
    let aliases_json: String = row.get("aliases_json");
    let status: String = row.get("status");
    let popularity: i64 = row.get("popularity_score");

    Ok(LibraryRecord {
        keywords: serde_json::from_str(&keywords_json)
            .with_context(|| format!("library {}: malformed keywords_json", id))?,
        aliases: serde_json::from_str(&aliases_json)
            .with_context(|| format!("library {}: malformed aliases", id))?,
        status: status.parse::<LibraryStatus>()?,
        popularity_score: u8::try_from(popularity)
            .with_context(|| format!("library {}: popularity_score {} out of range", id, popularity))?,
        name: row.get("name"),
        canonical_id: row.get("canonical_id"),
        language: row.get("language"),
        ecosystem: row.get("ecosystem"),
        description: row.get("description"),
        id,
    })
}

/// Append `AND ...` clauses for every constraint set on `filter`.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &LibraryFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND l.status = ");
        qb.push_bind(status.as_str());
    }
    if let Some(ref language) = filter.language {
        qb.push(" AND lower(l.language) = ");
        qb.push_bind(language.to_ascii_lowercase());
    }
    if let Some(ref ecosystem) = filter.ecosystem {
        qb.push(" AND lower(l.ecosystem) = ");
        qb.push_bind(ecosystem.to_ascii_lowercase());
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn find_by_exact_name(
        &self,
        name: &str,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>> {
        let mut qb = QueryBuilder::new(SELECT_LIBRARY);
        qb.push(" WHERE l.name_lower = ");
        qb.push_bind(name.to_lowercase());
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY l.canonical_id ASC");
        self.fetch(qb).await
    }

    async fn find_by_alias(
        &self,
        name: &str,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>> {
        let mut qb = QueryBuilder::new(SELECT_LIBRARY);
        qb.push(" WHERE l.id IN (SELECT library_id FROM library_aliases WHERE alias_lower = ");
        qb.push_bind(name.to_lowercase());
        qb.push(")");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY l.canonical_id ASC");
        self.fetch(qb).await
    }

    async fn find_by_name_substring(
        &self,
        name: &str,
        limit: usize,
        filter: &LibraryFilter,
    ) -> Result<Vec<LibraryRecord>> {
        // instr() rather than LIKE: names may contain '%' or '_'.
        let mut qb = QueryBuilder::new(SELECT_LIBRARY);
        qb.push(" WHERE instr(l.name_lower, ");
        qb.push_bind(name.to_lowercase());
        qb.push(") > 0");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY l.popularity_score DESC, l.canonical_id ASC LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        self.fetch(qb).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<LibraryRecord>> {
        let mut qb = QueryBuilder::new(SELECT_LIBRARY);
        qb.push(" WHERE l.id = ");
        qb.push_bind(id.to_string());
        Ok(self.fetch(qb).await?.into_iter().next())
    }

    async fn get_by_canonical_id(&self, canonical_id: &str) -> Result<Option<LibraryRecord>> {
        let mut qb = QueryBuilder::new(SELECT_LIBRARY);
        qb.push(" WHERE l.canonical_id = ");
        qb.push_bind(canonical_id.to_string());
        Ok(self.fetch(qb).await?.into_iter().next())
    }

    async fn list_libraries(&self, filter: &LibraryFilter) -> Result<Vec<LibraryRecord>> {
        let mut qb = QueryBuilder::new(SELECT_LIBRARY);
        qb.push(" WHERE 1 = 1");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY l.canonical_id ASC");
        self.fetch(qb).await
    }

    async fn upsert_library(&self, record: &LibraryRecord) -> Result<()> {
        let keywords_json = serde_json::to_string(&record.keywords)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO libraries (id, name, name_lower, canonical_id, language, ecosystem,
                                   keywords_json, description, popularity_score, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                name_lower = excluded.name_lower,
                canonical_id = excluded.canonical_id,
                language = excluded.language,
                ecosystem = excluded.ecosystem,
                keywords_json = excluded.keywords_json,
                description = excluded.description,
                popularity_score = excluded.popularity_score,
                status = excluded.status
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(record.name.to_lowercase())
        .bind(&record.canonical_id)
        .bind(&record.language)
        .bind(&record.ecosystem)
        .bind(&keywords_json)
        .bind(&record.description)
        .bind(i64::from(record.popularity_score))
        .bind(record.status.as_str())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to store library {}", record.canonical_id))?;

        sqlx::query("DELETE FROM library_aliases WHERE library_id = ?")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        for (position, alias) in record.aliases.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO library_aliases (library_id, position, alias, alias_lower)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(library_id, alias_lower) DO NOTHING
                "#,
            )
            .bind(&record.id)
            .bind(position as i64)
            .bind(alias)
            .bind(alias.to_lowercase())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
