//! Table and column descriptors discovered from a database catalog.
//!
//! Descriptors are plain data: the statement builders in
//! [`crate::drivers::sqlite::SqliteDialect`] parameterize on them instead of
//! on compile-time known fields.

use serde::{Deserialize, Serialize};

/// Structural description of one table, independent of its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name (unique within a catalog).
    pub name: String,

    /// Column definitions in declaration order.
    pub columns: Vec<ColumnDescriptor>,

    /// Primary key column names in key order.
    pub primary_key: Vec<String>,
}

impl TableDescriptor {
    /// Build a descriptor from columns, deriving the primary key from
    /// each column's `pk_ordinal`.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        let mut pk: Vec<&ColumnDescriptor> =
            columns.iter().filter(|c| c.pk_ordinal > 0).collect();
        pk.sort_by_key(|c| c.pk_ordinal);
        let primary_key = pk.into_iter().map(|c| c.name.clone()).collect();

        Self {
            name: name.into(),
            columns,
            primary_key,
        }
    }

    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Find a column by name (case-insensitive, like SQLite identifiers).
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Names of this table's columns that `other` does not have.
    pub fn missing_from(&self, other: &TableDescriptor) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| other.column(&c.name).is_none())
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Declared type token (e.g. "INTEGER", "TEXT", "VARCHAR(20)"); may be empty.
    pub data_type: String,

    /// Whether the column is declared NOT NULL.
    pub not_null: bool,

    /// 1-based position within the primary key, 0 if not a key column.
    pub pk_ordinal: i32,

    /// 0-based declaration position.
    pub ordinal: i32,
}

impl ColumnDescriptor {
    /// Create a nullable, non-key column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal: i32) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            pk_ordinal: 0,
            ordinal,
        }
    }

    /// Mark this column as part of the primary key at the given 1-based position.
    pub fn with_pk(mut self, pk_ordinal: i32) -> Self {
        self.pk_ordinal = pk_ordinal;
        self
    }

    /// Mark this column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}
