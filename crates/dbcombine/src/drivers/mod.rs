//! Database driver implementations.
//!
//! Each driver module implements the core traits for one engine:
//!
//! - `Dialect`: statement builder for the engine's SQL syntax
//! - `SourceReader`: reads the catalog and rows from a source database
//! - `TargetWriter`: creates tables and merges rows into a target database
//!
//! Only SQLite is provided. Adding an engine means adding a module here and
//! teaching [`crate::orchestrator::Combiner`] how to open it.

pub mod sqlite;

pub use sqlite::{SqliteDialect, SqliteReader, SqliteWriter};
