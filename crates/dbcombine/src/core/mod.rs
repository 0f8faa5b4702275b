//! Core abstractions for the combine engine.
//!
//! - [`schema`]: table and column descriptors
//! - [`value`]: SQL values and row sets
//! - [`traits`]: reader, writer and dialect seams
//! - [`identifier`]: identifier quoting and type token validation
//!
//! Driver modules (`drivers/sqlite`) implement the traits; the orchestrator
//! only talks to the traits.

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{ColumnDescriptor, TableDescriptor};
pub use traits::{Dialect, SourceReader, TargetWriter};
pub use value::{RowSet, SqlValue};
