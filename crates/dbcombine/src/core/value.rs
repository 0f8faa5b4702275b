//! SQL value types for moving rows between databases.

use serde::{Deserialize, Serialize};

/// A single scalar value, one variant per SQLite storage class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// NULL.
    Null,

    /// 64-bit signed integer.
    Integer(i64),

    /// 64-bit floating point.
    Real(f64),

    /// UTF-8 text.
    Text(String),

    /// Binary data.
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// All rows read from one table, aligned with the column list they were
/// selected with.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    /// Column names, in the order values appear in each row.
    pub columns: Vec<String>,

    /// Row values.
    pub rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    /// Create a row set for the given columns.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Get the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the row set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split rows into chunks that fit both `batch_size` and the engine's
    /// bound-parameter limit.
    pub fn chunks(&self, batch_size: usize, max_params: usize) -> std::slice::Chunks<'_, Vec<SqlValue>> {
        let per_row = self.columns.len().max(1);
        let by_params = (max_params / per_row).max(1);
        self.rows.chunks(batch_size.max(1).min(by_params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_implementations() {
        assert_eq!(SqlValue::from(42i32), SqlValue::Integer(42));
        assert_eq!(SqlValue::from("hello"), SqlValue::Text("hello".to_string()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(1.5)), SqlValue::Real(1.5));
    }

    #[test]
    fn test_chunks_respect_param_limit() {
        let rows = (0..10)
            .map(|i| vec![SqlValue::Integer(i), SqlValue::Null, SqlValue::Null])
            .collect();
        let set = RowSet::new(vec!["a".into(), "b".into(), "c".into()], rows);

        // 7 params / 3 columns = 2 rows per chunk, even though batch_size allows 100
        let sizes: Vec<usize> = set.chunks(100, 7).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 2, 2, 2, 2]);

        let sizes: Vec<usize> = set.chunks(4, 32766).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_empty_row_set() {
        let set = RowSet::new(vec!["a".into()], vec![]);
        assert!(set.is_empty());
        assert_eq!(set.chunks(10, 100).count(), 0);
    }
}
