//! # c7-resolver core
//!
//! Runtime-free logic for resolving a library name plus free-text query
//! context to a canonical, Context7-compatible library identifier.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Storage is
//! abstracted behind [`store::MetadataStore`]; the root `c7-resolver` crate
//! supplies the SQLite implementation and the HTTP tool server.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Library records, status, and store filters |
//! | [`hints`] | Language / ecosystem trigger tables |
//! | [`scoring`] | Disambiguation scoring and candidate ordering |
//! | [`store`] | Metadata store trait and in-memory backend |
//! | [`resolver`] | Three-tier candidate search and resolution |
//! | [`catalog`] | Validated library registration |

pub mod catalog;
pub mod hints;
pub mod models;
pub mod resolver;
pub mod scoring;
pub mod store;
