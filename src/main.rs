mod cli;
mod config;
mod error;
mod metrics;
mod monitor;
mod pipeline;
mod report;
mod scoring;
mod store;
mod types;
mod validate;

use crate::error::{EngineError, Result};
use crate::monitor::MonitorReport;
use crate::store::fs::{load_snapshot_file, FsSnapshotStore};
use crate::types::config::EngineConfig;
use crate::types::monitor::Severity;
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const WARNINGS: i32 = 1;
    pub const BLOCKING: i32 = 2;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn init_tracing(cli: &cli::Cli, config: &EngineConfig) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.log_level.as_str(),
            1 => "info",
            _ => "debug",
        }
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn output_format(format: &cli::ReportFormat) -> report::OutputFormat {
    match format {
        cli::ReportFormat::Json => report::OutputFormat::Json,
        cli::ReportFormat::Md => report::OutputFormat::Md,
    }
}

fn store_dir(flag: Option<PathBuf>, config: &EngineConfig) -> PathBuf {
    flag.unwrap_or_else(|| config.store.dir.clone())
}

fn monitor_exit_code(report: &MonitorReport) -> i32 {
    match report.highest_severity() {
        Some(Severity::High) => exit_code::BLOCKING,
        Some(_) => exit_code::WARNINGS,
        None if report.is_first_cycle() => exit_code::WARNINGS,
        None => exit_code::SUCCESS,
    }
}

fn emit(quiet: bool, rendered: &str) {
    if !quiet {
        println!("{rendered}");
    }
}

fn run() -> Result<i32> {
    let cli = cli::Cli::parse();
    let engine_config = config::load_config(Path::new("."), cli.config.as_deref())?;
    init_tracing(&cli, &engine_config);

    match cli.command {
        cli::Commands::Score(cmd) => {
            let batch = types::record::load_input(&cmd.input)?;
            let as_of = cmd
                .as_of
                .or(batch.as_of)
                .unwrap_or_else(|| Utc::now().date_naive());
            let outcome = pipeline::run_cycle(batch.companies, as_of, &engine_config)?;

            if let Some(dir) = cmd.store {
                let mut store = FsSnapshotStore::open(&dir, engine_config.store.retention)?;
                let path = store.persist(outcome.snapshot.clone())?;
                if !cli.quiet {
                    eprintln!("snapshot written: {}", path.display());
                }
            }

            let rendered = report::render_cycle(&outcome, output_format(&cmd.format))?;
            emit(cli.quiet, &rendered);

            if outcome.skipped.is_empty() {
                Ok(exit_code::SUCCESS)
            } else {
                if !cli.quiet {
                    eprintln!(
                        "warning: {} record(s) skipped as malformed",
                        outcome.skipped.len()
                    );
                }
                Ok(exit_code::WARNINGS)
            }
        }
        cli::Commands::Monitor(cmd) => {
            let dir = store_dir(cmd.store, &engine_config);
            let store = FsSnapshotStore::open(&dir, engine_config.store.retention)?;
            let Some((previous, current)) = store.store().latest_pair() else {
                return Err(EngineError::SnapshotNotFound(format!(
                    "no snapshots in {}",
                    dir.display()
                )));
            };
            let monitor_report = monitor::compare(previous, current, &engine_config);
            let rendered = report::render_monitor(&monitor_report, output_format(&cmd.format))?;
            emit(cli.quiet, &rendered);
            Ok(monitor_exit_code(&monitor_report))
        }
        cli::Commands::Diff(cmd) => {
            let previous = load_snapshot_file(&cmd.previous)?;
            let current = load_snapshot_file(&cmd.current)?;
            if previous.as_of() > current.as_of() {
                return Err(EngineError::SnapshotOrder(format!(
                    "previous snapshot {} is newer than current snapshot {}",
                    previous.as_of(),
                    current.as_of()
                )));
            }
            let monitor_report = monitor::compare(Some(&previous), &current, &engine_config);
            let rendered = report::render_monitor(&monitor_report, output_format(&cmd.format))?;
            emit(cli.quiet, &rendered);
            Ok(monitor_exit_code(&monitor_report))
        }
        cli::Commands::History(cmd) => {
            let dir = store_dir(cmd.store, &engine_config);
            let store = FsSnapshotStore::open(&dir, engine_config.store.retention)?;
            info!(dir = %store.dir().display(), "listing snapshot history");
            if store.store().is_empty() {
                emit(
                    cli.quiet,
                    &format!("history: no snapshots in {}", dir.display()),
                );
                return Ok(exit_code::SUCCESS);
            }
            for date in store.store().dates() {
                let rows = store.store().get(date).map_or(0, |snapshot| snapshot.len());
                emit(cli.quiet, &format!("{date}  {rows} companies"));
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Validate(cmd) => {
            let batch = types::record::load_input(&cmd.input)?;
            let quality = validate::check(&batch.companies);
            let rendered = report::render_quality(&quality, output_format(&cmd.format))?;
            emit(cli.quiet, &rendered);

            if quality.has_blocking() {
                Ok(exit_code::BLOCKING)
            } else if quality.has_warnings() {
                Ok(exit_code::WARNINGS)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}
