//! Validated library registration.
//!
//! [`register_library`] turns a caller-supplied [`NewLibrary`] into a
//! [`LibraryRecord`], deriving the record id and (unless given) the canonical
//! id from the ecosystem and name:
//!
//! ```text
//! name = "FastAPI", ecosystem = "PyPI"
//!   → id           = "lib-pypi-fastapi"
//!   → canonical_id = "/pypi/fastapi"
//! ```
//!
//! Registration never replaces a stored record. It rejects a derived id or
//! canonical id that is already taken, and a name that already exists within
//! the same ecosystem. Names that slugify alike (`React Router`,
//! `react-router`) share an id, so only the first is accepted. The same name in a different
//! ecosystem is allowed; that ambiguity is what the resolver handles.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{LibraryFilter, LibraryRecord, LibraryStatus};
use crate::store::MetadataStore;

const MAX_NAME_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 100;

/// Errors returned by [`register_library`].
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Input for registering a library.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLibrary {
    pub name: String,
    pub language: String,
    pub ecosystem: String,
    #[serde(default)]
    pub canonical_id: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub popularity_score: u8,
    #[serde(default)]
    pub status: LibraryStatus,
}

/// Lower-case `s` and collapse runs of characters outside
/// `[a-z0-9._]` into single dashes.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;
    for ch in s.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn validate(new: &NewLibrary) -> Result<(), CatalogError> {
    let name = new.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(CatalogError::Validation(format!(
            "name must be 1-{} characters",
            MAX_NAME_LEN
        )));
    }
    for (field, value) in [("language", &new.language), ("ecosystem", &new.ecosystem)] {
        let value = value.trim();
        if value.is_empty() || value.chars().count() > MAX_LABEL_LEN {
            return Err(CatalogError::Validation(format!(
                "{} must be 1-{} characters",
                field, MAX_LABEL_LEN
            )));
        }
    }
    if new.popularity_score > 100 {
        return Err(CatalogError::Validation(format!(
            "popularity_score must be in [0, 100], got {}",
            new.popularity_score
        )));
    }
    if slugify(name).is_empty() {
        return Err(CatalogError::Validation(format!(
            "name '{}' has no characters usable in an identifier",
            name
        )));
    }
    if let Some(ref id) = new.canonical_id {
        if !id.starts_with('/') || id.trim().len() < 2 {
            return Err(CatalogError::Validation(format!(
                "canonical_id must be a path starting with '/', got '{}'",
                id
            )));
        }
    }
    Ok(())
}

/// Build the record for `new` without touching a store.
pub fn build_record(new: &NewLibrary) -> Result<LibraryRecord, CatalogError> {
    validate(new)?;

    let name = new.name.trim().to_string();
    let ecosystem = new.ecosystem.trim().to_string();
    let eco_slug = slugify(&ecosystem);
    let name_slug = slugify(&name);
    let canonical_id = new
        .canonical_id
        .as_deref()
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| format!("/{}/{}", eco_slug, name_slug));

    let mut aliases: Vec<String> = Vec::new();
    for alias in &new.aliases {
        let alias = alias.trim();
        if !alias.is_empty()
            && !alias.eq_ignore_ascii_case(&name)
            && !aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
        {
            aliases.push(alias.to_string());
        }
    }

    let mut keywords: Vec<String> = Vec::new();
    for kw in &new.keywords {
        let kw = kw.trim().to_lowercase();
        if !kw.is_empty() && !keywords.contains(&kw) {
            keywords.push(kw);
        }
    }

    Ok(LibraryRecord {
        id: format!("lib-{}-{}", eco_slug, name_slug),
        name,
        canonical_id,
        aliases,
        language: new.language.trim().to_string(),
        ecosystem,
        keywords,
        description: new.description.trim().to_string(),
        popularity_score: new.popularity_score,
        status: new.status,
    })
}

/// Validate `new`, check uniqueness, and store it.
pub async fn register_library<S>(store: &S, new: &NewLibrary) -> Result<LibraryRecord, CatalogError>
where
    S: MetadataStore + ?Sized,
{
    let record = build_record(new)?;

    if let Some(existing) = store.get_by_id(&record.id).await? {
        return Err(CatalogError::Conflict(format!(
            "id '{}' already registered to '{}' ({})",
            record.id, existing.name, existing.canonical_id
        )));
    }

    if let Some(existing) = store.get_by_canonical_id(&record.canonical_id).await? {
        return Err(CatalogError::Conflict(format!(
            "canonical_id '{}' already registered to '{}'",
            record.canonical_id, existing.name
        )));
    }

    let same_ecosystem = LibraryFilter::none().with_ecosystem(record.ecosystem.clone());
    let clashes = store
        .find_by_exact_name(&record.name, &same_ecosystem)
        .await?;
    if !clashes.is_empty() {
        return Err(CatalogError::Conflict(format!(
            "library '{}' already exists in ecosystem '{}'",
            record.name, record.ecosystem
        )));
    }

    store.upsert_library(&record).await?;
    Ok(record)
}
