//! Library metadata records and lookup filters.
//!
//! A [`LibraryRecord`] is one row of the library catalog. Records are written
//! by the catalog (see [`crate::catalog`]) and read, never mutated, by the
//! resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a library.
///
/// Status only affects scoring. Deprecated and archived libraries remain
/// resolvable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryStatus {
    #[default]
    Active,
    Deprecated,
    Archived,
}

impl LibraryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryStatus::Active => "active",
            LibraryStatus::Deprecated => "deprecated",
            LibraryStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for LibraryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibraryStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(LibraryStatus::Active),
            "deprecated" => Ok(LibraryStatus::Deprecated),
            "archived" => Ok(LibraryStatus::Archived),
            other => anyhow::bail!(
                "invalid library status: '{}'. Must be active, deprecated, or archived.",
                other
            ),
        }
    }
}

/// One known library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryRecord {
    /// Stable slug, e.g. `lib-pypi-requests`.
    pub id: String,
    /// Display name. Not unique across ecosystems.
    pub name: String,
    /// Externally-facing identifier, e.g. `/pypi/requests`. Unique per store.
    pub canonical_id: String,
    /// Alternate names, matched case-insensitively.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub language: String,
    pub ecosystem: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// 0..=100, higher is more trusted.
    #[serde(default)]
    pub popularity_score: u8,
    #[serde(default)]
    pub status: LibraryStatus,
}

/// Optional equality constraints applied by store lookups.
///
/// String fields compare case-insensitively. An empty filter matches every
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    pub status: Option<LibraryStatus>,
    pub language: Option<String>,
    pub ecosystem: Option<String>,
}

impl LibraryFilter {
    /// The filter that matches everything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: LibraryStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_ecosystem(mut self, ecosystem: impl Into<String>) -> Self {
        self.ecosystem = Some(ecosystem.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.language.is_none() && self.ecosystem.is_none()
    }

    /// Returns true if `record` satisfies every constraint that is set.
    pub fn matches(&self, record: &LibraryRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(ref language) = self.language {
            if !record.language.eq_ignore_ascii_case(language) {
                return false;
            }
        }
        if let Some(ref ecosystem) = self.ecosystem {
            if !record.ecosystem.eq_ignore_ascii_case(ecosystem) {
                return false;
            }
        }
        true
    }
}
