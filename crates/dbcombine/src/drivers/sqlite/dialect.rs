//! SQLite SQL dialect (Strategy pattern).
//!
//! Builds the DDL/DML the engine runs from runtime-discovered descriptors.
//! Values are always bound as `?` parameters; only identifiers and declared
//! type tokens are spliced into statement text, after validation.

use crate::core::identifier::{quote_ident, validate_type_token};
use crate::core::schema::TableDescriptor;
use crate::core::traits::Dialect;
use crate::error::{CombineError, Result};

/// SQLite's default SQLITE_MAX_VARIABLE_NUMBER since 3.32.
const SQLITE_MAX_PARAMS: usize = 32766;

/// SQLite dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Create a new SQLite dialect instance.
    pub fn new() -> Self {
        Self
    }

    fn quote_list(columns: &[String]) -> std::result::Result<String, String> {
        let quoted = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(quoted.join(", "))
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn max_params(&self) -> usize {
        SQLITE_MAX_PARAMS
    }

    fn build_create_table(&self, table: &TableDescriptor) -> Result<String> {
        let conflict = |msg: String| CombineError::schema_conflict(&table.name, msg);

        if table.columns.is_empty() {
            return Err(conflict("table has no columns".to_string()));
        }

        let qualified = quote_ident(&table.name).map_err(conflict)?;

        let mut defs = Vec::with_capacity(table.columns.len() + 1);
        for col in &table.columns {
            let name = quote_ident(&col.name).map_err(conflict)?;
            let data_type = col.data_type.trim();
            validate_type_token(data_type)
                .map_err(|e| conflict(format!("column {}: {}", col.name, e)))?;

            let mut def = name;
            if !data_type.is_empty() {
                def.push(' ');
                def.push_str(data_type);
            }
            if col.not_null {
                def.push_str(" NOT NULL");
            }
            defs.push(def);
        }

        if table.has_pk() {
            let pk = Self::quote_list(&table.primary_key).map_err(conflict)?;
            defs.push(format!("PRIMARY KEY ({})", pk));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            qualified,
            defs.join(", ")
        ))
    }

    fn build_select(&self, table: &TableDescriptor) -> Result<String> {
        let failed = |msg: String| CombineError::row_merge_failed(&table.name, msg);

        if table.columns.is_empty() {
            return Err(failed("table has no columns".to_string()));
        }

        let cols = Self::quote_list(&table.column_names()).map_err(failed)?;
        let qualified = quote_ident(&table.name).map_err(failed)?;

        Ok(format!("SELECT {} FROM {}", cols, qualified))
    }

    fn build_upsert(&self, table: &str, columns: &[String], row_count: usize) -> Result<String> {
        let failed = |msg: String| CombineError::row_merge_failed(table, msg);

        if columns.is_empty() {
            return Err(failed("no columns to insert".to_string()));
        }
        if row_count == 0 {
            return Err(failed("no rows to insert".to_string()));
        }
        if columns.len() * row_count > SQLITE_MAX_PARAMS {
            return Err(failed(format!(
                "{} rows x {} columns exceeds {} bound parameters",
                row_count,
                columns.len(),
                SQLITE_MAX_PARAMS
            )));
        }

        let qualified = quote_ident(table).map_err(failed)?;
        let col_list = Self::quote_list(columns).map_err(failed)?;

        let placeholders_per_row = format!("({})", vec!["?"; columns.len()].join(", "));
        let all_placeholders: Vec<String> =
            std::iter::repeat(placeholders_per_row).take(row_count).collect();

        Ok(format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES {}",
            qualified,
            col_list,
            all_placeholders.join(", ")
        ))
    }
}
