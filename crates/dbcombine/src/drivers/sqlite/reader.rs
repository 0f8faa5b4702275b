//! SQLite source reader implementation.
//!
//! Implements the `SourceReader` trait (the Catalog Reader) over a single
//! read-only sqlx connection.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Connection, Row, TypeInfo, ValueRef};
use tracing::{debug, info};

use super::connect_options;
use super::dialect::SqliteDialect;
use crate::core::identifier::quote_ident;
use crate::core::schema::{ColumnDescriptor, TableDescriptor};
use crate::core::traits::{Dialect, SourceReader};
use crate::core::value::{RowSet, SqlValue};
use crate::error::{CombineError, Result};

/// User tables in catalog order. Internal `sqlite_*` tables and virtual
/// tables are skipped.
const LIST_TABLES_SQL: &str = r"
    SELECT name FROM sqlite_master
    WHERE type = 'table'
      AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
      AND COALESCE(sql, '') NOT LIKE 'CREATE VIRTUAL TABLE%'
";

const TABLE_INFO_SQL: &str = r#"
    SELECT cid, name, type, "notnull", pk
    FROM pragma_table_info(?1)
    ORDER BY cid
"#;

/// SQLite source reader. Opens the database read-only and never creates it.
pub struct SqliteReader {
    conn: SqliteConnection,
    dialect: SqliteDialect,
}

impl SqliteReader {
    /// Open a source database.
    ///
    /// Fails with `CatalogUnavailable` if the file is missing, unreadable or
    /// not a database.
    pub async fn connect(location: &str) -> Result<Self> {
        let options = connect_options(location)
            .map_err(|e| CombineError::catalog("parsing source location", e))?
            .read_only(true);

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| CombineError::catalog(&format!("opening source {}", location), e))?;

        // sqlite opens files lazily; touching the catalog surfaces corrupt files here
        sqlx::query("SELECT count(*) FROM sqlite_master")
            .fetch_one(&mut conn)
            .await
            .map_err(|e| CombineError::catalog(&format!("reading source {}", location), e))?;

        let dialect = SqliteDialect::new();
        info!("Opened {} source database: {}", dialect.name(), location);

        Ok(Self { conn, dialect })
    }

    /// Convert a SQLite row to SqlValue vector using each value's storage class.
    fn row_to_values(row: &SqliteRow) -> std::result::Result<Vec<SqlValue>, sqlx::Error> {
        (0..row.len()).map(|i| Self::decode_value(row, i)).collect()
    }

    fn decode_value(row: &SqliteRow, idx: usize) -> std::result::Result<SqlValue, sqlx::Error> {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        let storage = raw.type_info().name().to_string();
        let value = match storage.as_str() {
            "INTEGER" | "BOOLEAN" => SqlValue::Integer(row.try_get_unchecked::<i64, _>(idx)?),
            "REAL" => SqlValue::Real(row.try_get_unchecked::<f64, _>(idx)?),
            "BLOB" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
            _ => SqlValue::Text(row.try_get_unchecked::<String, _>(idx)?),
        };
        Ok(value)
    }
}

#[async_trait]
impl SourceReader for SqliteReader {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let rows: Vec<SqliteRow> = sqlx::query(LIST_TABLES_SQL)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| CombineError::catalog("listing source tables", e))?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("name")
                    .map_err(|e| CombineError::catalog("listing source tables", e))
            })
            .collect()
    }

    async fn describe_table(&mut self, table: &str) -> Result<TableDescriptor> {
        let context = format!("loading columns for {}", table);
        let rows: Vec<SqliteRow> = sqlx::query(TABLE_INFO_SQL)
            .bind(table)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| CombineError::catalog(&context, e))?;

        if rows.is_empty() {
            return Err(CombineError::catalog(&context, "table not found"));
        }

        let columns = rows
            .iter()
            .map(|row| -> std::result::Result<ColumnDescriptor, sqlx::Error> {
                Ok(ColumnDescriptor {
                    name: row.try_get::<String, _>("name")?,
                    data_type: row.try_get::<String, _>("type")?,
                    not_null: row.try_get::<i64, _>("notnull")? != 0,
                    pk_ordinal: row.try_get::<i64, _>("pk")? as i32,
                    ordinal: row.try_get::<i64, _>("cid")? as i32,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CombineError::catalog(&context, e))?;

        let descriptor = TableDescriptor::new(table, columns);
        debug!(
            "Source table {}: {} columns, primary key {:?}",
            table,
            descriptor.columns.len(),
            descriptor.primary_key
        );
        Ok(descriptor)
    }

    async fn read_rows(&mut self, table: &TableDescriptor) -> Result<RowSet> {
        let sql = self.dialect.build_select(table)?;
        debug!("{}", sql);

        let rows: Vec<SqliteRow> = sqlx::query(&sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| {
                CombineError::row_merge_failed(&table.name, format!("reading source rows: {}", e))
            })?;

        let values = rows
            .iter()
            .map(Self::row_to_values)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                CombineError::row_merge_failed(&table.name, format!("decoding source row: {}", e))
            })?;

        Ok(RowSet::new(table.column_names(), values))
    }

    async fn row_count(&mut self, table: &str) -> Result<i64> {
        let qualified = quote_ident(table)
            .map_err(|e| CombineError::catalog("counting source rows", e))?;
        let row: SqliteRow = sqlx::query(&format!("SELECT COUNT(*) AS cnt FROM {}", qualified))
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| CombineError::catalog(&format!("counting rows in {}", table), e))?;

        row.try_get::<i64, _>("cnt")
            .map_err(|e| CombineError::catalog(&format!("counting rows in {}", table), e))
    }

    async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| CombineError::catalog("closing source", e))
    }
}
