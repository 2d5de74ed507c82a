use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fundrank",
    version,
    about = "Fundamental scoring, ranking and snapshot monitoring for company universes"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file used in place of the project fundrank.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score an input cycle and print the ranked snapshot
    Score(ScoreCommand),
    /// Compare the two newest stored snapshots
    Monitor(MonitorCommand),
    /// Compare two snapshot files
    Diff(DiffCommand),
    /// List addressable snapshot dates
    History(HistoryCommand),
    /// Report data-quality issues in an input file
    Validate(ValidateCommand),
}

#[derive(Args)]
pub struct ScoreCommand {
    pub input: PathBuf,
    /// Snapshot date; defaults to the input's `as_of`, then today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
    /// Persist the snapshot into this directory
    #[arg(long)]
    pub store: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct MonitorCommand {
    /// Snapshot directory; defaults to store.dir from config
    #[arg(long)]
    pub store: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct DiffCommand {
    pub previous: PathBuf,
    pub current: PathBuf,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct HistoryCommand {
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateCommand {
    pub input: PathBuf,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Clone, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
}
