//! Configuration management for kiln

pub mod env;
pub mod schema;

pub use env::{EnvToggles, ResolvedFlags};
pub use schema::Config;

use crate::error::{KilnError, KilnResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the site-local configuration file
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a config manager for the given site directory
    pub fn for_site(site_dir: &Path) -> Self {
        Self {
            config_path: site_dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> KilnResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> KilnResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| KilnError::io(format!("reading config from {}", path.display()), e))?;

        let invalid = |e: toml::de::Error| KilnError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let raw: toml::Table = toml::from_str(&content).map_err(invalid)?;
        let deprecations: Vec<String> = schema::deprecated_keys(&raw)
            .into_iter()
            .map(|(key, note)| {
                format!("{}: `{}` is deprecated and ignored ({})", path.display(), key, note)
            })
            .collect();
        for message in &deprecations {
            debug!("{}", message);
        }

        let mut config: Config = toml::Value::Table(raw).try_into().map_err(invalid)?;
        config.deprecations = deprecations;
        Ok(config)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
