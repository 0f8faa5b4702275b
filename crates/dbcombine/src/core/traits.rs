//! Core traits for the combine engine.
//!
//! - [`SourceReader`]: Catalog Reader, enumerates tables and reads their rows
//! - [`TargetWriter`]: Schema Reconciler and Row Merger for the target
//! - [`Dialect`]: statement builder parameterized on descriptors
//!
//! Each reader and writer owns exactly one connection, so every method takes
//! `&mut self` and calls are strictly sequential.

use async_trait::async_trait;

use crate::error::Result;

use super::schema::TableDescriptor;
use super::value::RowSet;

/// Read schema and data from a source database.
#[async_trait]
pub trait SourceReader: Send {
    /// List user table names in catalog order (internal tables excluded).
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Resolve a table's columns in declaration order.
    async fn describe_table(&mut self, table: &str) -> Result<TableDescriptor>;

    /// Enumerate every user table with its columns.
    ///
    /// Each call re-reads the catalog.
    async fn extract_catalog(&mut self) -> Result<Vec<TableDescriptor>> {
        let names = self.list_tables().await?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            tables.push(self.describe_table(&name).await?);
        }
        Ok(tables)
    }

    /// Read every row of a table, selecting the descriptor's columns by name.
    async fn read_rows(&mut self, table: &TableDescriptor) -> Result<RowSet>;

    /// Get the row count for a table.
    async fn row_count(&mut self, table: &str) -> Result<i64>;

    /// Close the connection.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Write schema and data to a target database.
#[async_trait]
pub trait TargetWriter: Send {
    /// Check if a table exists.
    async fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// Describe an existing target table, `None` if it does not exist.
    async fn describe_table(&mut self, table: &str) -> Result<Option<TableDescriptor>>;

    /// Create the table if absent. Existing tables are left untouched.
    ///
    /// Returns `true` if the table was created by this call.
    async fn create_table_if_absent(&mut self, table: &TableDescriptor) -> Result<bool>;

    /// Insert-or-replace all rows in a single transaction.
    ///
    /// Returns the number of rows applied.
    async fn merge_rows(
        &mut self,
        table: &TableDescriptor,
        rows: &RowSet,
        batch_size: usize,
    ) -> Result<u64>;

    /// Get the row count for a table.
    async fn row_count(&mut self, table: &str) -> Result<i64>;

    /// Close the connection.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// SQL syntax strategy for a database engine.
///
/// Builders return fully formed statements with positional placeholders;
/// identifiers are quoted and type tokens validated here.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "sqlite").
    fn name(&self) -> &str;

    /// Maximum number of bound parameters per statement.
    fn max_params(&self) -> usize;

    /// Build an idempotent CREATE TABLE for a descriptor.
    fn build_create_table(&self, table: &TableDescriptor) -> Result<String>;

    /// Build a SELECT of the descriptor's columns, by name, in descriptor order.
    fn build_select(&self, table: &TableDescriptor) -> Result<String>;

    /// Build a multi-row insert-or-replace for `row_count` rows of `columns`.
    fn build_upsert(&self, table: &str, columns: &[String], row_count: usize) -> Result<String>;
}
