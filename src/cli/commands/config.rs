//! Config command - show the effective configuration or its path

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::KilnResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> KilnResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => {
            let rendered = toml::to_string_pretty(config)?;
            println!("{}", rendered);
        }
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
    }
    Ok(())
}
