//! Configuration schema for kiln
//!
//! Configuration is stored at `<site>/kiln.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache and output locations
    pub paths: PathsConfig,

    /// Fingerprint inputs
    pub fingerprint: FingerprintConfig,

    /// Cache subtrees that may be spared on purge
    pub cache: CacheConfig,

    /// Feature flags (environment toggles take precedence)
    pub flags: FlagsConfig,

    /// Resolved plugin list, in load order
    pub plugins: Vec<PluginEntry>,

    /// Deprecated keys found while loading, as user-facing warnings
    #[serde(skip)]
    pub deprecations: Vec<String>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Append a JSON-lines run journal to `<site>/.kiln-journal.log`
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { journal: true }
    }
}

/// Directory layout, relative to the site root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Cache directory
    pub cache_dir: PathBuf,

    /// Published output directory
    pub output_dir: PathBuf,

    /// Template set copied into the cache every run (built-in set when unset)
    pub templates_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache"),
            output_dir: PathBuf::from("public"),
            templates_dir: None,
        }
    }
}

/// Files whose contents feed the cache fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Sentinel files relative to the site root, hashed in this order
    pub sentinel_files: Vec<PathBuf>,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            sentinel_files: vec![
                PathBuf::from("package.json"),
                PathBuf::from("kiln.toml"),
                PathBuf::from("kiln-node.js"),
            ],
        }
    }
}

/// Named cache subtrees, relative to the cache directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Downloaded remote assets
    pub download_cache_dir: PathBuf,

    /// Lower-level compiler cache
    pub compiler_cache_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            download_cache_dir: PathBuf::from("caches/downloads"),
            compiler_cache_dir: PathBuf::from("compiler"),
        }
    }
}

/// Opt-in flags. `None` means not set in config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    pub preserve_download_cache: Option<bool>,
    pub preserve_compiler_cache: Option<bool>,
    pub page_build_on_data_changes: Option<bool>,
}

/// One resolved plugin as produced by the plugin loader
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginEntry {
    /// Package name
    pub name: String,

    /// Installed version
    pub version: String,

    /// Plugin directory, relative to the site root or absolute
    pub resolve: PathBuf,

    /// Server-side hooks the plugin implements
    pub server_hooks: Vec<String>,

    /// Client-side hooks the plugin implements
    pub client_hooks: Vec<String>,

    /// Loader override excluding the plugin from the server dispatch table
    pub server_disabled: bool,

    /// Plugin options passed through to the dispatch tables
    pub options: toml::Table,
}

/// Keys that are still accepted but no longer have any effect
pub const DEPRECATED_KEYS: &[(&str, &str)] = &[
    ("general.polyfill", "polyfills are no longer injected"),
    (
        "cache.purge_on_start",
        "the cache is purged automatically when the fingerprint changes",
    ),
];

/// Return the deprecated keys present in a raw configuration document
pub fn deprecated_keys(raw: &toml::Table) -> Vec<(&'static str, &'static str)> {
    DEPRECATED_KEYS
        .iter()
        .filter(|(key, _)| {
            let mut parts = key.splitn(2, '.');
            let section = parts.next().unwrap_or_default();
            let field = parts.next().unwrap_or_default();
            raw.get(section)
                .and_then(|v| v.as_table())
                .is_some_and(|t| t.contains_key(field))
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[paths]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.paths.cache_dir, PathBuf::from(".cache"));
        assert_eq!(config.fingerprint.sentinel_files.len(), 3);
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn config_deserializes_plugins() {
        let toml = r#"
            [paths]
            output_dir = "dist"

            [[plugins]]
            name = "p1"
            version = "1.0.0"
            resolve = "plugins/p1"
            server_hooks = ["onRenderBody"]

            [plugins.options]
            color = "red"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("dist"));
        assert_eq!(config.paths.cache_dir, PathBuf::from(".cache")); // default preserved
        assert_eq!(config.plugins.len(), 1);
        assert_eq!(config.plugins[0].server_hooks, vec!["onRenderBody"]);
        assert_eq!(
            config.plugins[0].options.get("color").and_then(|v| v.as_str()),
            Some("red")
        );
    }

    #[test]
    fn detects_deprecated_keys() {
        let raw: toml::Table = toml::from_str(
            r#"
            [general]
            polyfill = true
            journal = false
        "#,
        )
        .unwrap();
        let found = deprecated_keys(&raw);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "general.polyfill");
    }
}
