//! Resolved plugin records
//!
//! A `PluginRecord` is produced by the plugin loader and is read-only for
//! the rest of the bootstrap. The loader itself is out of scope; the CLI
//! builds records from the `[[plugins]]` entries in `kiln.toml`.

use crate::config::schema::PluginEntry;
use crate::error::{KilnError, KilnResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Execution context a plugin hook runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookContext {
    /// Server-side rendering
    Server,
    /// Browser runtime
    Client,
}

impl HookContext {
    /// Conventional entry file name, without extension, inside a plugin directory
    pub fn entry_stem(&self) -> &'static str {
        match self {
            Self::Server => "kiln-ssr",
            Self::Client => "kiln-browser",
        }
    }
}

impl fmt::Display for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// A plugin as resolved by the loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
    /// Absolute plugin directory
    pub resolved_path: PathBuf,
    /// Declared server-side hook names
    pub server_hooks: Vec<String>,
    /// Declared client-side hook names
    pub client_hooks: Vec<String>,
    /// Options passed through to dispatch tables
    pub options: serde_json::Value,
    /// Loader override excluding the plugin from server dispatch
    pub server_disabled: bool,
}

impl PluginRecord {
    /// Create a record with no hooks and empty options
    pub fn new(name: impl Into<String>, version: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            resolved_path: path.into(),
            server_hooks: vec![],
            client_hooks: vec![],
            options: serde_json::Value::Object(serde_json::Map::new()),
            server_disabled: false,
        }
    }

    /// Build a record from a config entry, resolving its path against the site
    pub fn from_entry(entry: &PluginEntry, site_dir: &Path) -> KilnResult<Self> {
        if entry.name.trim().is_empty() {
            return Err(KilnError::PluginInvalid {
                name: "<unnamed>".to_string(),
                reason: "name is empty".to_string(),
            });
        }

        let resolve = if entry.resolve.as_os_str().is_empty() {
            PathBuf::from("plugins").join(&entry.name)
        } else {
            entry.resolve.clone()
        };
        let resolved_path = if resolve.is_absolute() {
            resolve
        } else {
            site_dir.join(resolve)
        };

        let options = serde_json::to_value(&entry.options).map_err(|e| KilnError::PluginInvalid {
            name: entry.name.clone(),
            reason: format!("options are not representable as JSON: {}", e),
        })?;

        Ok(Self {
            name: entry.name.clone(),
            version: entry.version.clone(),
            resolved_path,
            server_hooks: entry.server_hooks.clone(),
            client_hooks: entry.client_hooks.clone(),
            options,
            server_disabled: entry.server_disabled,
        })
    }

    /// Declared hook names for a context
    pub fn hooks(&self, context: HookContext) -> &[String] {
        match context {
            HookContext::Server => &self.server_hooks,
            HookContext::Client => &self.client_hooks,
        }
    }

    /// Conventional entry module path for a context, without extension
    pub fn entry_module(&self, context: HookContext) -> PathBuf {
        self.resolved_path.join(context.entry_stem())
    }
}

/// Build records for every configured plugin, keeping config order
pub fn records_from_entries(entries: &[PluginEntry], site_dir: &Path) -> KilnResult<Vec<PluginRecord>> {
    entries
        .iter()
        .map(|entry| PluginRecord::from_entry(entry, site_dir))
        .collect()
}

/// Ordered `(name, version)` pairs used as fingerprint input
pub fn version_pairs(plugins: &[PluginRecord]) -> Vec<(String, String)> {
    plugins
        .iter()
        .map(|p| (p.name.clone(), p.version.clone()))
        .collect()
}
