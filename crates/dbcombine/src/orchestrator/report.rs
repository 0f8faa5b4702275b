//! Per-table outcomes and the run summary returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CombineError, Result};

/// Lifecycle of one table within a run.
///
/// `Discovered → SchemaReady → RowsApplied | SchemaFailed | MergeFailed`.
/// A dry run stops at `Planned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    Discovered,
    SchemaReady,
    RowsApplied,
    SchemaFailed,
    MergeFailed,
    Planned,
}

impl TableState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TableState::RowsApplied
                | TableState::SchemaFailed
                | TableState::MergeFailed
                | TableState::Planned
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TableState::SchemaFailed | TableState::MergeFailed)
    }
}

/// Outcome for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    /// Table name.
    pub name: String,

    /// State reached.
    pub state: TableState,

    /// Rows applied to the target (rows that would be applied, for a dry run).
    pub rows_merged: u64,

    /// Whether the table was created in the target by this run.
    pub created: bool,

    /// The target table has no primary key, so rows were appended rather
    /// than replaced and duplicates can accumulate across runs.
    pub no_primary_key: bool,

    /// Error message for failed tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Non-fatal findings (dry-run predictions, missing keys).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl TableReport {
    /// Start tracking a newly discovered table.
    pub fn discovered(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TableState::Discovered,
            rows_merged: 0,
            created: false,
            no_primary_key: false,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Record a terminal failure.
    pub fn fail(&mut self, state: TableState, err: &CombineError) {
        debug_assert!(state.is_failure());
        self.state = state;
        self.error = Some(err.to_string());
    }
}

/// Summary of one combine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationReport {
    /// Unique run identifier.
    pub run_id: String,

    /// "completed" if every table succeeded, "partial" if any failed,
    /// "planned" for a dry run.
    pub status: String,

    /// Whether this was a dry run.
    pub dry_run: bool,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Tables processed.
    pub tables_total: usize,

    /// Tables that reached `RowsApplied` (or `Planned`).
    pub tables_success: usize,

    /// Tables that reached `SchemaFailed` or `MergeFailed`.
    pub tables_failed: usize,

    /// Total rows merged across successful tables.
    pub rows_merged: u64,

    /// Per-table outcomes in processing order.
    pub tables: Vec<TableReport>,
}

impl OperationReport {
    /// Build the summary from per-table outcomes.
    pub fn new(
        run_id: String,
        started_at: DateTime<Utc>,
        dry_run: bool,
        tables: Vec<TableReport>,
    ) -> Self {
        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let tables_failed = tables.iter().filter(|t| t.state.is_failure()).count();
        let tables_success = tables.len() - tables_failed;
        let rows_merged = tables
            .iter()
            .filter(|t| !t.state.is_failure())
            .map(|t| t.rows_merged)
            .sum();

        let status = if dry_run {
            "planned"
        } else if tables_failed > 0 {
            "partial"
        } else {
            "completed"
        };

        Self {
            run_id,
            status: status.to_string(),
            dry_run,
            started_at,
            completed_at,
            duration_seconds,
            tables_total: tables.len(),
            tables_success,
            tables_failed,
            rows_merged,
            tables,
        }
    }

    /// Look up a table's outcome by name.
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Names of failed tables.
    pub fn failed_tables(&self) -> Vec<String> {
        self.tables
            .iter()
            .filter(|t| t.state.is_failure())
            .map(|t| t.name.clone())
            .collect()
    }

    /// Names of tables merged without a primary key.
    pub fn tables_without_primary_key(&self) -> Vec<String> {
        self.tables
            .iter()
            .filter(|t| t.no_primary_key)
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.tables_failed > 0
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
