//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    bug::BugCommands, completions::CompletionsArgs, doc::DocCommands, employee::EmployeeCommands,
    event::EventCommands, init::InitArgs, project::ProjectCommands, report::ReportCommands,
    task::TaskCommands,
};
use crate::core::config::BackendKind;

#[derive(Parser)]
#[command(name = "ptrack")]
#[command(author, version, about = "Project tracker")]
#[command(long_about = "Track projects, their teams, tasks, bug reports, events and documentation \
in a SQLite database, XML files or CSV files.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Storage backend (overrides configuration)
    #[arg(long, short = 'b', global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Workspace root (default: auto-detect by finding .ptrack/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new tracker workspace
    Init(InitArgs),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Employee management
    #[command(subcommand)]
    Employee(EmployeeCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Bug report management
    #[command(subcommand)]
    Bug(BugCommands),

    /// Event management
    #[command(subcommand)]
    Event(EventCommands),

    /// Documentation management
    #[command(subcommand)]
    Doc(DocCommands),

    /// Project analytics (readiness, statuses, labor efficiency)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables and summaries
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
}
