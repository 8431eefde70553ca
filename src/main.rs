//! Kiln - build bootstrap and cache orchestrator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use kiln::cli::{Cli, Commands, LogFormat};
use kiln::config::ConfigManager;
use kiln::error::{KilnError, KilnResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> KilnResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("kiln=warn"),
        1 => EnvFilter::new("kiln=info"),
        _ => EnvFilter::new("kiln=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => subscriber.without_time().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    kiln::ui::init_theme();

    let site = match cli.site.clone() {
        Some(site) => site,
        None => std::env::current_dir()
            .map_err(|e| KilnError::io("getting current directory", e))?,
    };
    if !site.is_dir() {
        return Err(KilnError::SiteDirNotFound(site));
    }

    let manager = ConfigManager::for_site(&site);
    let config = manager.load().await?;
    debug!("Loaded config for {}", site.display());

    match cli.command {
        Commands::Bootstrap(args) => kiln::cli::commands::bootstrap(args, &site, config).await,
        Commands::Status(args) => kiln::cli::commands::status(args, &site, &config).await,
        Commands::Clean(args) => kiln::cli::commands::clean(args, &site, &config).await,
        Commands::Config(args) => kiln::cli::commands::config(args, &manager, &config).await,
    }
}
