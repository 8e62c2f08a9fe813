//! SQLite connection and schema.
//!
//! # Schema
//!
//! ```text
//! libraries                       library_aliases
//! ─────────────────────────       ──────────────────────────
//! id TEXT PK                ◀──── library_id TEXT FK
//! name, name_lower                alias, alias_lower
//! canonical_id UNIQUE             PK(library_id, alias_lower)
//! language, ecosystem
//! keywords_json, description
//! popularity_score, status
//! ```
//!
//! Case-insensitive lookups compare against the `*_lower` columns, which are
//! filled in Rust at write time so that non-ASCII names fold the same way as
//! the in-memory store.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Open (creating if missing) the database named in `[db].path`.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create all tables and indexes. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS libraries (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_lower TEXT NOT NULL,
            canonical_id TEXT NOT NULL UNIQUE,
            language TEXT NOT NULL,
            ecosystem TEXT NOT NULL,
            keywords_json TEXT NOT NULL DEFAULT '[]',
            description TEXT NOT NULL DEFAULT '',
            popularity_score INTEGER NOT NULL DEFAULT 0
                CHECK (popularity_score BETWEEN 0 AND 100),
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'deprecated', 'archived'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Alias order is preserved through `position`.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS library_aliases (
            library_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            alias TEXT NOT NULL,
            alias_lower TEXT NOT NULL,
            PRIMARY KEY (library_id, alias_lower),
            FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_libraries_name_lower ON libraries(name_lower)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_library_aliases_alias_lower ON library_aliases(alias_lower)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_libraries_popularity ON libraries(popularity_score DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
