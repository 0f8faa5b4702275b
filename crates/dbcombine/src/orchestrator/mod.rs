//! Combine orchestrator - main workflow coordinator.
//!
//! Tables are processed one at a time, in catalog order, over a single
//! connection per database. A table's failure is recorded in the report and
//! the run moves on; only an unreadable catalog or target aborts.

mod report;

pub use report::{OperationReport, TableReport, TableState};

use crate::config::Config;
use crate::core::schema::TableDescriptor;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::drivers::{SqliteReader, SqliteWriter};
use crate::error::{CombineError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Combine orchestrator.
pub struct Combiner {
    config: Config,
}

/// Connectivity of both databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

impl Combiner {
    /// Create a new combiner. The configuration is validated here; no
    /// database is opened until a run starts.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Merge every selected source table into the target.
    ///
    /// Returns `Err` only when the source catalog or the target database is
    /// unavailable. Table-level failures are reported in the returned
    /// [`OperationReport`].
    pub async fn run(&self) -> Result<OperationReport> {
        if self.config.combine.dry_run {
            return self.plan().await;
        }

        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting combine run: {}", run_id);

        // Phase 1: read the source catalog before touching the target, so a
        // bad source never creates a target file.
        let mut source = SqliteReader::connect(&self.config.source.location).await?;
        let tables = match self.discover(&mut source).await {
            Ok(tables) => tables,
            Err(e) => {
                let _ = source.close().await;
                return Err(e);
            }
        };
        info!("Found {} tables to combine", tables.len());

        // Phase 2: schema and rows, table by table
        let target = match SqliteWriter::connect(&self.config.target.location).await {
            Ok(target) => target,
            Err(e) => {
                let _ = source.close().await;
                return Err(e);
            }
        };

        let batch_size = self.config.combine.get_batch_size();
        let reports = merge_all(source, target, &tables, batch_size).await;

        let report = OperationReport::new(run_id, started_at, false, reports);
        info!(
            "Combine {}: {}/{} tables, {} rows in {:.2}s",
            report.status,
            report.tables_success,
            report.tables_total,
            report.rows_merged,
            report.duration_seconds
        );
        if report.has_failures() {
            warn!("Failed tables: {}", report.failed_tables().join(", "));
        }

        Ok(report)
    }

    /// Describe what a run would do without writing to the target.
    ///
    /// Every selected table ends in `Planned` with the source row count. Tables
    /// that would fail the column check, or that would be merged without a
    /// primary key, carry warnings.
    pub async fn plan(&self) -> Result<OperationReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Planning combine run: {}", run_id);

        let mut source = SqliteReader::connect(&self.config.source.location).await?;
        let tables = self.discover(&mut source).await?;

        // An absent target plans as empty; nothing is created.
        let mut target = match SqliteReader::connect(&self.config.target.location).await {
            Ok(reader) => Some(reader),
            Err(e) => {
                debug!("Target not readable, planning against an empty target: {}", e);
                None
            }
        };
        let existing: Vec<String> = match target.as_mut() {
            Some(reader) => reader.list_tables().await?,
            None => Vec::new(),
        };

        let mut reports = Vec::with_capacity(tables.len());
        for table in &tables {
            let mut report = TableReport::discovered(&table.name);
            report.rows_merged = source.row_count(&table.name).await?.max(0) as u64;

            let target_table = match target.as_mut() {
                Some(reader) if existing.iter().any(|t| t.eq_ignore_ascii_case(&table.name)) => {
                    Some(reader.describe_table(&table.name).await?)
                }
                _ => None,
            };

            match target_table {
                Some(target_table) => {
                    let missing = table.missing_from(&target_table);
                    if !missing.is_empty() {
                        report.warnings.push(format!(
                            "would fail: target table lacks columns {}",
                            missing.join(", ")
                        ));
                    }
                    report.no_primary_key = !target_table.has_pk();
                }
                None => {
                    report.created = true;
                    report.no_primary_key = !table.has_pk();
                }
            }
            if report.no_primary_key {
                report.warnings.push(
                    "no primary key: rows would be appended and may duplicate".to_string(),
                );
            }

            info!(
                "{}: {} rows{}",
                table.name,
                report.rows_merged,
                if report.created { " (new table)" } else { "" }
            );
            report.state = TableState::Planned;
            reports.push(report);
        }

        if let Err(e) = source.close().await {
            warn!("Failed to close source: {}", e);
        }
        if let Some(reader) = target {
            if let Err(e) = reader.close().await {
                warn!("Failed to close target: {}", e);
            }
        }

        Ok(OperationReport::new(run_id, started_at, true, reports))
    }

    /// Open both databases and report connectivity and latency.
    ///
    /// The target is opened for writing, so a missing target file is created.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let start = Instant::now();
        let (source_connected, source_error) =
            match SqliteReader::connect(&self.config.source.location).await {
                Ok(reader) => {
                    reader.close().await?;
                    (true, None)
                }
                Err(e) => (false, Some(e.to_string())),
            };
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let (target_connected, target_error) =
            match SqliteWriter::connect(&self.config.target.location).await {
                Ok(writer) => {
                    writer.close().await?;
                    (true, None)
                }
                Err(e) => (false, Some(e.to_string())),
            };
        let target_latency_ms = start.elapsed().as_millis() as u64;

        Ok(HealthCheckResult {
            source_connected,
            source_latency_ms,
            source_error,
            target_connected,
            target_latency_ms,
            target_error,
            healthy: source_connected && target_connected,
        })
    }

    /// Compare row counts between source and target.
    ///
    /// Maps each selected table to `(source, target, covered)`, where
    /// `covered` means the target holds at least as many rows as the source.
    /// A table missing from the target counts as 0 rows; any other target
    /// error is returned.
    pub async fn validate(&self) -> Result<HashMap<String, (i64, i64, bool)>> {
        let mut source = SqliteReader::connect(&self.config.source.location).await?;
        let tables = self.discover(&mut source).await?;
        let mut target = SqliteWriter::connect(&self.config.target.location).await?;

        let mut results = HashMap::new();
        for table in &tables {
            let source_count = source.row_count(&table.name).await?;
            let target_count = target_row_count(&mut target, &table.name).await?;

            let covered = target_count >= source_count;
            results.insert(table.name.clone(), (source_count, target_count, covered));

            if covered {
                info!("{}: {} rows (covered)", table.name, source_count);
            } else {
                warn!(
                    "{}: source={} target={} (MISSING ROWS)",
                    table.name, source_count, target_count
                );
            }
        }

        source.close().await?;
        target.close().await?;
        Ok(results)
    }

    /// Read the source catalog and apply the table filters.
    async fn discover<R: SourceReader>(&self, source: &mut R) -> Result<Vec<TableDescriptor>> {
        let names = source.list_tables().await?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            if !self.config.combine.includes_table(&name) {
                debug!("Skipping table {} (filtered)", name);
                continue;
            }
            tables.push(source.describe_table(&name).await?);
        }
        Ok(tables)
    }
}

/// Row count of a target table, 0 if the table does not exist.
async fn target_row_count<W: TargetWriter>(target: &mut W, table: &str) -> Result<i64> {
    if target.table_exists(table).await? {
        target.row_count(table).await
    } else {
        Ok(0)
    }
}

/// Process every table in order, then release both handles.
///
/// Tables are committed or rolled back by the time the handles close, so
/// close failures are logged and the reports are still returned.
async fn merge_all<R, W>(
    mut source: R,
    mut target: W,
    tables: &[TableDescriptor],
    batch_size: usize,
) -> Vec<TableReport>
where
    R: SourceReader,
    W: TargetWriter,
{
    let mut reports = Vec::with_capacity(tables.len());
    for table in tables {
        reports.push(process_table(&mut source, &mut target, table, batch_size).await);
    }

    if let Err(e) = source.close().await {
        warn!("Failed to close source: {}", e);
    }
    if let Err(e) = target.close().await {
        warn!("Failed to close target: {}", e);
    }

    reports
}

/// Drive one table through reconcile and merge, capturing its outcome.
async fn process_table<R, W>(
    source: &mut R,
    target: &mut W,
    table: &TableDescriptor,
    batch_size: usize,
) -> TableReport
where
    R: SourceReader,
    W: TargetWriter,
{
    let mut report = TableReport::discovered(&table.name);
    debug!("{}: discovered ({} columns)", table.name, table.columns.len());

    match target.create_table_if_absent(table).await {
        Ok(created) => {
            report.created = created;
            report.state = TableState::SchemaReady;
        }
        Err(e) => {
            error!("{}: schema failed - {}", table.name, e);
            report.fail(TableState::SchemaFailed, &e);
            return report;
        }
    }

    match merge_table(source, target, table, batch_size, &mut report).await {
        Ok(rows) => {
            report.rows_merged = rows;
            report.state = TableState::RowsApplied;
            info!("{}: completed ({} rows)", table.name, rows);
        }
        Err(e) => {
            error!("{}: merge failed - {}", table.name, e);
            report.fail(TableState::MergeFailed, &e);
        }
    }

    report
}

async fn merge_table<R, W>(
    source: &mut R,
    target: &mut W,
    table: &TableDescriptor,
    batch_size: usize,
    report: &mut TableReport,
) -> Result<u64>
where
    R: SourceReader,
    W: TargetWriter,
{
    let target_table = target.describe_table(&table.name).await?.ok_or_else(|| {
        CombineError::row_merge_failed(&table.name, "table missing from target after schema step")
    })?;

    let missing = table.missing_from(&target_table);
    if !missing.is_empty() {
        return Err(CombineError::row_merge_failed(
            &table.name,
            format!("target table lacks source columns: {}", missing.join(", ")),
        ));
    }

    if !target_table.has_pk() {
        warn!(
            "{}: target table has no primary key, rows are appended and may duplicate",
            table.name
        );
        report.no_primary_key = true;
        report
            .warnings
            .push("no primary key: rows appended without replacement".to_string());
    }

    let rows = source.read_rows(table).await?;
    target.merge_rows(table, &rows, batch_size).await
}

/// Merge every table of `source` into `target` with default settings.
///
/// The target is created if it does not exist. See [`Combiner::run`].
pub async fn combine_databases(source: &str, target: &str) -> Result<OperationReport> {
    let config = Config::from_locations(source, target)?;
    Combiner::new(config)?.run().await
}
