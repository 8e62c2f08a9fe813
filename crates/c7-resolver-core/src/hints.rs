//! Language and ecosystem hint tables.
//!
//! A query such as `"python http client"` carries the token `python`, which
//! hints that the caller wants a Python library. The tables here map trigger
//! tokens to a [`Language`] or [`Ecosystem`], and parse the free-form
//! `language` / `ecosystem` labels stored on library records into the same
//! enums so the two can be compared.
//!
//! All tables are immutable and built on first use.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Programming languages recognised by the hint tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    Go,
    Rust,
    Java,
    Ruby,
    Php,
    Cpp,
    CSharp,
}

/// Package ecosystems recognised by the hint tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Npm,
    PyPi,
    CratesIo,
    Maven,
    RubyGems,
    Packagist,
    NuGet,
}

/// Query tokens that imply a language.
static LANGUAGE_TRIGGERS: LazyLock<HashMap<&'static str, Language>> = LazyLock::new(|| {
    use Language::*;
    HashMap::from([
        ("python", Python),
        ("pip", Python),
        ("pypi", Python),
        ("javascript", JavaScript),
        ("npm", JavaScript),
        ("node", JavaScript),
        ("nodejs", JavaScript),
        ("typescript", JavaScript),
        ("js", JavaScript),
        ("ts", JavaScript),
        ("go", Go),
        ("golang", Go),
        ("rust", Rust),
        ("cargo", Rust),
        ("crate", Rust),
        ("crates", Rust),
        ("crates.io", Rust),
        ("java", Java),
        ("maven", Java),
        ("gradle", Java),
        ("jvm", Java),
        ("ruby", Ruby),
        ("gem", Ruby),
        ("gems", Ruby),
        ("rubygems", Ruby),
        ("php", Php),
        ("composer", Php),
        ("packagist", Php),
        ("c++", Cpp),
        ("cpp", Cpp),
        ("c#", CSharp),
        ("csharp", CSharp),
        (".net", CSharp),
        ("dotnet", CSharp),
        ("nuget", CSharp),
    ])
});

/// Record `language` labels, lower-cased.
static LANGUAGE_LABELS: LazyLock<HashMap<&'static str, Language>> = LazyLock::new(|| {
    use Language::*;
    HashMap::from([
        ("python", Python),
        ("javascript", JavaScript),
        ("typescript", JavaScript),
        ("js", JavaScript),
        ("ts", JavaScript),
        ("node", JavaScript),
        ("node.js", JavaScript),
        ("nodejs", JavaScript),
        ("go", Go),
        ("golang", Go),
        ("rust", Rust),
        ("java", Java),
        ("ruby", Ruby),
        ("php", Php),
        ("c++", Cpp),
        ("cpp", Cpp),
        ("c#", CSharp),
        ("csharp", CSharp),
    ])
});

/// Query tokens that imply an ecosystem.
static ECOSYSTEM_TRIGGERS: LazyLock<HashMap<&'static str, Ecosystem>> = LazyLock::new(|| {
    use Ecosystem::*;
    HashMap::from([
        ("npm", Npm),
        ("pypi", PyPi),
        ("pip", PyPi),
        ("crates.io", CratesIo),
        ("cargo", CratesIo),
        ("crates", CratesIo),
        ("maven", Maven),
        ("gradle", Maven),
        ("rubygems", RubyGems),
        ("gem", RubyGems),
        ("gems", RubyGems),
        ("packagist", Packagist),
        ("composer", Packagist),
        ("nuget", NuGet),
    ])
});

/// Record `ecosystem` labels, lower-cased.
static ECOSYSTEM_LABELS: LazyLock<HashMap<&'static str, Ecosystem>> = LazyLock::new(|| {
    use Ecosystem::*;
    HashMap::from([
        ("npm", Npm),
        ("pypi", PyPi),
        ("pip", PyPi),
        ("crates.io", CratesIo),
        ("crates", CratesIo),
        ("cargo", CratesIo),
        ("maven", Maven),
        ("rubygems", RubyGems),
        ("packagist", Packagist),
        ("nuget", NuGet),
    ])
});

impl Language {
    /// Parse a record's `language` label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Language> {
        LANGUAGE_LABELS
            .get(label.trim().to_lowercase().as_str())
            .copied()
    }
}

impl Ecosystem {
    /// Parse a record's `ecosystem` label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Ecosystem> {
        ECOSYSTEM_LABELS
            .get(label.trim().to_lowercase().as_str())
            .copied()
    }
}

/// Languages and ecosystems inferred from a query's token set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryHints {
    pub languages: HashSet<Language>,
    pub ecosystems: HashSet<Ecosystem>,
}

impl QueryHints {
    /// Infer hints from already lower-cased query tokens.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut hints = Self::default();
        for token in tokens {
            if let Some(lang) = LANGUAGE_TRIGGERS.get(token) {
                hints.languages.insert(*lang);
            }
            if let Some(eco) = ECOSYSTEM_TRIGGERS.get(token) {
                hints.ecosystems.insert(*eco);
            }
        }
        hints
    }

    /// True if the record's language label parses to an inferred language.
    pub fn matches_language(&self, label: &str) -> bool {
        Language::from_label(label).is_some_and(|l| self.languages.contains(&l))
    }

    /// True if the record's ecosystem label parses to an inferred ecosystem.
    pub fn matches_ecosystem(&self, label: &str) -> bool {
        Ecosystem::from_label(label).is_some_and(|e| self.ecosystems.contains(&e))
    }
}
