//! dbcombine CLI - consolidate one SQLite database into another.

use clap::{Parser, Subcommand};
use dbcombine::error::EXIT_TABLE_ERROR;
use dbcombine::{CombineError, Combiner, Config, OperationReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "dbcombine")]
#[command(about = "Merge the tables of one SQLite database into another")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every source table into the target
    Run {
        /// Source database (overrides the config file)
        #[arg(long)]
        source: Option<String>,

        /// Target database, created if missing (overrides the config file)
        #[arg(long)]
        target: Option<String>,

        /// Dry run: show the plan without writing to the target
        #[arg(long)]
        dry_run: bool,

        /// Rows per INSERT statement
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Show what a run would do without writing to the target
    Plan,

    /// Validate row counts between source and target
    Validate,

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CombineError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(CombineError::Config)?;

    match cli.command {
        Commands::Run {
            source,
            target,
            dry_run,
            batch_size,
        } => {
            let mut config = load_config(&cli.config, source, target)?;
            if dry_run {
                config.combine.dry_run = true;
            }
            if let Some(size) = batch_size {
                config.combine.batch_size = Some(size);
            }

            let report = Combiner::new(config)?.run().await?;
            print_report(&report, cli.output_json)?;

            if report.has_failures() {
                return Ok(ExitCode::from(EXIT_TABLE_ERROR));
            }
        }

        Commands::Plan => {
            let config = load_config(&cli.config, None, None)?;
            let report = Combiner::new(config)?.plan().await?;
            print_report(&report, cli.output_json)?;
        }

        Commands::Validate => {
            let config = load_config(&cli.config, None, None)?;
            let results = Combiner::new(config)?.validate().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                let mut names: Vec<&String> = results.keys().collect();
                names.sort();
                println!("Row counts (source / target):");
                for name in names {
                    let (source, target, covered) = results[name];
                    println!(
                        "  {} {}: {} / {}",
                        if covered { "✓" } else { "✗" },
                        name,
                        source,
                        target
                    );
                }
            }

            if results.values().any(|(_, _, covered)| !covered) {
                return Ok(ExitCode::from(EXIT_TABLE_ERROR));
            }
        }

        Commands::HealthCheck => {
            let config = load_config(&cli.config, None, None)?;
            let result = Combiner::new(config)?.health_check().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source: {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target: {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if let Some(err) = result.source_error {
                return Err(CombineError::CatalogUnavailable(err));
            }
            if let Some(err) = result.target_error {
                return Err(CombineError::TargetUnavailable(err));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config file, or build one when both locations are given.
fn load_config(
    path: &Path,
    source: Option<String>,
    target: Option<String>,
) -> Result<Config, CombineError> {
    match (source, target) {
        (Some(source), Some(target)) => Config::from_locations(source, target),
        (source, target) => {
            let mut config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            if let Some(source) = source {
                config.source.location = source;
            }
            if let Some(target) = target {
                config.target.location = target;
            }
            config.validate()?;
            Ok(config)
        }
    }
}

fn print_report(report: &OperationReport, json: bool) -> Result<(), CombineError> {
    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    let status_msg = match report.status.as_str() {
        "planned" => "Dry run completed!",
        "partial" => "Combine completed with failures",
        _ => "Combine completed!",
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", report.run_id);
    println!("  Duration: {:.2}s", report.duration_seconds);
    println!("  Tables: {}/{}", report.tables_success, report.tables_total);
    println!("  Rows: {}", report.rows_merged);

    for table in &report.tables {
        let mut line = format!("    {:<24} {:?} ({} rows)", table.name, table.state, table.rows_merged);
        if table.created {
            line.push_str(if report.dry_run { " [new]" } else { " [created]" });
        }
        println!("{}", line);
        if let Some(ref err) = table.error {
            println!("      Error: {}", err);
        }
        for warning in &table.warnings {
            println!("      Warning: {}", warning);
        }
    }

    if report.has_failures() {
        println!("  Failed tables: {:?}", report.failed_tables());
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity: {}", other)),
    };

    // Logs go to stderr so --output-json stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format: {}", other)),
    }

    Ok(())
}
