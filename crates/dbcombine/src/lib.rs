//! # dbcombine
//!
//! Consolidate the tables of one SQLite database into another.
//!
//! A run reads the source catalog, creates each table in the target if it is
//! absent, then copies the rows with insert-or-replace semantics:
//!
//! - **Source wins** on primary-key collisions
//! - **One transaction per table**, so a failed table leaves the target as it was
//! - **Failures are isolated**: one bad table never stops the others
//! - **Reports** every table's terminal state, row count and errors
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbcombine::combine_databases;
//!
//! #[tokio::main]
//! async fn main() -> dbcombine::Result<()> {
//!     let report = combine_databases("a.sqlite", "combined.sqlite").await?;
//!     println!("Merged {} rows", report.rows_merged);
//!     for table in report.failed_tables() {
//!         eprintln!("failed: {}", table);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;

// Re-exports for convenient access
pub use config::{CombineConfig, Config, DatabaseConfig};
pub use crate::core::{ColumnDescriptor, RowSet, SqlValue, TableDescriptor};
pub use error::{CombineError, Result};
pub use orchestrator::{
    combine_databases, Combiner, HealthCheckResult, OperationReport, TableReport, TableState,
};
