//! CLI argument definitions using clap derive

use crate::bootstrap::ExecutionMode;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Kiln - build bootstrap and cache orchestrator
///
/// Prepares a site for building: decides whether the cache can be trusted,
/// lays out the working directories, and writes the plugin dispatch tables.
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, env = "KILN_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Site root (defaults to current directory)
    #[arg(short, long, global = true, env = "KILN_SITE")]
    pub site: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare the site for a build
    Bootstrap(BootstrapArgs),

    /// Preview whether the next bootstrap would clear the cache
    Status(StatusArgs),

    /// Remove the cache and output directories
    Clean(CleanArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the bootstrap command
#[derive(Parser, Debug)]
pub struct BootstrapArgs {
    /// Execution mode
    #[arg(short, long, default_value = "develop")]
    pub mode: ModeArg,

    /// Number of workers (defaults to CPU count minus one)
    #[arg(long)]
    pub workers: Option<std::num::NonZeroUsize>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}

/// Execution mode as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Development server
    Develop,
    /// Production build
    Build,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Develop => ExecutionMode::Develop,
            ModeArg::Build => ExecutionMode::Build,
        }
    }
}

/// Output format for the status command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
