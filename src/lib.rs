//! # c7-resolver
//!
//! Library resolution for a Context7-compatible documentation server.
//!
//! Given the name a user typed ("requests", "React", "tokio") and the
//! question they asked, the resolver picks one canonical library id such as
//! `/pypi/requests`. Names are looked up by exact match, then alias, then
//! substring; when several libraries share a name, language and ecosystem
//! hints in the query, keyword overlap, popularity, and deprecation status
//! decide.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────┐   ┌─────────────────┐
//! │ seed JSON  │──▶│ catalog register │──▶│ SQLite          │
//! └────────────┘   └──────────────────┘   │ libraries       │
//!                                         │ library_aliases │
//!                                         └────────┬────────┘
//!                                                  │ MetadataStore
//!                                         ┌────────▼────────┐
//!                                         │ LibraryResolver │
//!                                         └────────┬────────┘
//!                                                  ▼
//!                                         ┌─────────────────┐
//!                                         │ HTTP tools      │
//!                                         └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | SQLite connection and schema |
//! | [`sqlite_store`] | SQLite [`MetadataStore`](store::MetadataStore) |
//! | [`seed`] | Catalog seeding from JSON |
//! | [`traits`] | `Tool` trait, registry, built-in tools |
//! | [`server`] | HTTP tool server |
//!
//! The resolution logic itself lives in `c7-resolver-core` and is
//! re-exported here as [`models`], [`hints`], [`scoring`], [`store`],
//! [`resolver`], and [`catalog`].

pub mod config;
pub mod db;
pub mod seed;
pub mod server;
pub mod sqlite_store;
pub mod traits;

pub use c7_resolver_core::{catalog, hints, models, resolver, scoring, store};
