//! Error types for the combine engine.

use thiserror::Error;

/// Exit code for configuration errors (invalid YAML, missing fields, etc.).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when the source catalog cannot be read.
pub const EXIT_CATALOG_ERROR: u8 = 2;
/// Exit code when the target database cannot be opened.
pub const EXIT_TARGET_ERROR: u8 = 3;
/// Exit code when one or more tables failed.
pub const EXIT_TABLE_ERROR: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for combine operations.
///
/// Only [`CombineError::CatalogUnavailable`] and [`CombineError::TargetUnavailable`]
/// abort a run. Table-level variants are caught by the orchestrator and
/// recorded in the [`OperationReport`](crate::OperationReport).
#[derive(Error, Debug)]
pub enum CombineError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database could not be opened or its catalog could not be read
    #[error("Source catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Target database could not be opened
    #[error("Target database unavailable: {0}")]
    TargetUnavailable(String),

    /// Target table creation failed for a reason other than pre-existence
    #[error("Schema conflict for table {table}: {message}")]
    SchemaConflict { table: String, message: String },

    /// Copying rows into the target table failed
    #[error("Row merge failed for table {table}: {message}")]
    RowMergeFailed { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CombineError {
    /// Create a CatalogUnavailable error with context about where it occurred
    pub fn catalog(context: &str, err: impl std::fmt::Display) -> Self {
        CombineError::CatalogUnavailable(format!("{}: {}", context, err))
    }

    /// Create a SchemaConflict error
    pub fn schema_conflict(table: impl Into<String>, message: impl Into<String>) -> Self {
        CombineError::SchemaConflict {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a RowMergeFailed error
    pub fn row_merge_failed(table: impl Into<String>, message: impl Into<String>) -> Self {
        CombineError::RowMergeFailed {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CombineError::Config(_) | CombineError::Yaml(_) | CombineError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            CombineError::CatalogUnavailable(_) => EXIT_CATALOG_ERROR,
            CombineError::TargetUnavailable(_) => EXIT_TARGET_ERROR,
            CombineError::SchemaConflict { .. } | CombineError::RowMergeFailed { .. } => {
                EXIT_TABLE_ERROR
            }
            CombineError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for combine operations.
pub type Result<T> = std::result::Result<T, CombineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CombineError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            CombineError::CatalogUnavailable("x".into()).exit_code(),
            EXIT_CATALOG_ERROR
        );
        assert_eq!(
            CombineError::TargetUnavailable("x".into()).exit_code(),
            EXIT_TARGET_ERROR
        );
        assert_eq!(
            CombineError::row_merge_failed("t", "x").exit_code(),
            EXIT_TABLE_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(CombineError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_display_includes_table() {
        let err = CombineError::row_merge_failed("logs", "table logs has no column named level");
        assert_eq!(
            err.to_string(),
            "Row merge failed for table logs: table logs has no column named level"
        );
    }

    #[test]
    fn test_format_detailed_without_chain() {
        let err = CombineError::Config("source.location is required".into());
        assert_eq!(
            err.format_detailed(),
            "Error: Configuration error: source.location is required\n"
        );
    }
}
