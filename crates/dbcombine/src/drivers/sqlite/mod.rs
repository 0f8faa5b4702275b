//! SQLite driver.
//!
//! - [`SqliteDialect`]: statement builder
//! - [`SqliteReader`]: read-only source connection (Catalog Reader)
//! - [`SqliteWriter`]: target connection (Schema Reconciler, Row Merger)

mod dialect;
mod reader;
mod writer;

pub use dialect::SqliteDialect;
pub use reader::SqliteReader;
pub use writer::SqliteWriter;

use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;

/// Build connect options from a file path or a `sqlite:` connection string.
pub(crate) fn connect_options(location: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    if location.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(location)
    } else {
        Ok(SqliteConnectOptions::new().filename(location))
    }
}
