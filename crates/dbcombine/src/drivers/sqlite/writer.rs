//! SQLite target writer implementation.
//!
//! Implements the `TargetWriter` trait: the Schema Reconciler
//! (`create_table_if_absent`) and the Row Merger (`merge_rows`).
//! Rows are written with multi-row `INSERT OR REPLACE` statements inside one
//! transaction per table.

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};
use tracing::{debug, info};

use super::connect_options;
use super::dialect::SqliteDialect;
use crate::core::identifier::quote_ident;
use crate::core::schema::{ColumnDescriptor, TableDescriptor};
use crate::core::traits::{Dialect, TargetWriter};
use crate::core::value::{RowSet, SqlValue};
use crate::error::{CombineError, Result};

const OBJECT_TYPE_SQL: &str = r"
    SELECT type FROM sqlite_master
    WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE
";

const TABLE_INFO_SQL: &str = r#"
    SELECT cid, name, type, "notnull", pk
    FROM pragma_table_info(?1)
    ORDER BY cid
"#;

/// SQLite target writer. Creates the database file if it does not exist.
pub struct SqliteWriter {
    conn: SqliteConnection,
    dialect: SqliteDialect,
}

impl SqliteWriter {
    /// Open (or create) a target database.
    pub async fn connect(location: &str) -> Result<Self> {
        let options = connect_options(location)
            .map_err(|e| CombineError::TargetUnavailable(format!("parsing target location: {}", e)))?
            .create_if_missing(true)
            // tables are independent units; no cross-table enforcement
            .foreign_keys(false);

        let mut conn = SqliteConnection::connect_with(&options).await.map_err(|e| {
            CombineError::TargetUnavailable(format!("opening target {}: {}", location, e))
        })?;

        sqlx::query("SELECT count(*) FROM sqlite_master")
            .fetch_one(&mut conn)
            .await
            .map_err(|e| {
                CombineError::TargetUnavailable(format!("reading target {}: {}", location, e))
            })?;

        let dialect = SqliteDialect::new();
        info!("Opened {} target database: {}", dialect.name(), location);

        Ok(Self { conn, dialect })
    }

    /// Kind of schema object (`table` or `view`) holding `name`, if any.
    async fn object_type(&mut self, name: &str) -> Result<Option<String>> {
        let failed = |e: sqlx::Error| {
            CombineError::schema_conflict(name, format!("checking table existence: {}", e))
        };

        let row: Option<SqliteRow> = sqlx::query(OBJECT_TYPE_SQL)
            .bind(name)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(failed)?;

        row.map(|r| r.try_get::<String, _>("type"))
            .transpose()
            .map_err(failed)
    }
}

#[async_trait]
impl TargetWriter for SqliteWriter {
    async fn table_exists(&mut self, table: &str) -> Result<bool> {
        Ok(self.object_type(table).await?.as_deref() == Some("table"))
    }

    async fn describe_table(&mut self, table: &str) -> Result<Option<TableDescriptor>> {
        let failed = |e: sqlx::Error| {
            CombineError::row_merge_failed(table, format!("loading target columns: {}", e))
        };

        let rows: Vec<SqliteRow> = sqlx::query(TABLE_INFO_SQL)
            .bind(table)
            .fetch_all(&mut self.conn)
            .await
            .map_err(failed)?;

        if rows.is_empty() {
            return Ok(None);
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
            .map_err(failed)?;

        Ok(Some(TableDescriptor::new(table, columns)))
    }

    async fn create_table_if_absent(&mut self, table: &TableDescriptor) -> Result<bool> {
        match self.object_type(&table.name).await?.as_deref() {
            Some("view") => {
                return Err(CombineError::schema_conflict(
                    &table.name,
                    "target has a view with this name",
                ));
            }
            Some(_) => {
                debug!(
                    "Table {} already exists in target, leaving its schema untouched",
                    table.name
                );
                return Ok(false);
            }
            None => {}
        }

        let ddl = self.dialect.build_create_table(table)?;
        debug!("{}", ddl);

        sqlx::query(&ddl)
            .execute(&mut self.conn)
            .await
            .map_err(|e| CombineError::schema_conflict(&table.name, e.to_string()))?;

        info!("Created table {} in target", table.name);
        Ok(true)
    }

    async fn merge_rows(
        &mut self,
        table: &TableDescriptor,
        rows: &RowSet,
        batch_size: usize,
    ) -> Result<u64> {
        let failed = |msg: String| CombineError::row_merge_failed(&table.name, msg);

        if rows.is_empty() {
            return Ok(0);
        }

        let columns = &rows.columns;
        if let Some(bad) = rows.rows.iter().find(|r| r.len() != columns.len()) {
            return Err(failed(format!(
                "row has {} values but {} columns were selected",
                bad.len(),
                columns.len()
            )));
        }

        // Dropping the transaction without commit rolls back every chunk
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| failed(format!("BEGIN: {}", e)))?;

        let mut applied: u64 = 0;
        for chunk in rows.chunks(batch_size, self.dialect.max_params()) {
            let sql = self.dialect.build_upsert(&table.name, columns, chunk.len())?;

            let mut query = sqlx::query(&sql);
            for value in chunk.iter().flatten() {
                query = bind_value(query, value);
            }

            query
                .execute(&mut *tx)
                .await
                .map_err(|e| failed(format!("INSERT OR REPLACE batch: {}", e)))?;
            applied += chunk.len() as u64;
        }

        tx.commit()
            .await
            .map_err(|e| failed(format!("COMMIT: {}", e)))?;

        debug!("SQLite: merged {} rows into {}", applied, table.name);
        Ok(applied)
    }

    async fn row_count(&mut self, table: &str) -> Result<i64> {
        let failed = |msg: String| CombineError::row_merge_failed(table, msg);

        let qualified = quote_ident(table).map_err(failed)?;
        let row: SqliteRow = sqlx::query(&format!("SELECT COUNT(*) AS cnt FROM {}", qualified))
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| failed(format!("counting target rows: {}", e)))?;

        row.try_get::<i64, _>("cnt")
            .map_err(|e| failed(format!("counting target rows: {}", e)))
    }

    async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| CombineError::TargetUnavailable(format!("closing target: {}", e)))
    }
}

/// Bind one value as the next positional parameter.
fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Blob(v) => query.bind(v.as_slice()),
    }
}
