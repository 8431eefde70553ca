//! On-disk layout of a site's cache and output trees

use crate::config::Config;
use std::path::{Path, PathBuf};

/// Cache subdirectory holding query results; its presence marks a run that wrote cache
pub const JSON_DIR: &str = "json";
/// Cache subdirectory rebuilt from scratch every run
pub const FRAGMENTS_DIR: &str = "fragments";
/// Output subdirectory for static assets
pub const STATIC_DIR: &str = "static";
/// Persisted cache status record
pub const STATUS_FILE: &str = "kiln-status.json";
/// Generated client dispatch table
pub const CLIENT_ARTIFACT: &str = "api-runner-browser-plugins.js";
/// Server runner template, rewritten with the injected plugin list
pub const SERVER_ARTIFACT: &str = "api-runner-ssr.js";

/// Resolved absolute paths for one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    site_dir: PathBuf,
    cache_dir: PathBuf,
    output_dir: PathBuf,
}

impl SiteLayout {
    /// Layout using the default `.cache` and `public` directories
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(site_dir, &Config::default())
    }

    /// Layout using the directories named in the config
    pub fn from_config(site_dir: impl Into<PathBuf>, config: &Config) -> Self {
        let site_dir = site_dir.into();
        Self {
            cache_dir: site_dir.join(&config.paths.cache_dir),
            output_dir: site_dir.join(&config.paths.output_dir),
            site_dir,
        }
    }

    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn json_dir(&self) -> PathBuf {
        self.cache_dir.join(JSON_DIR)
    }

    pub fn fragments_dir(&self) -> PathBuf {
        self.cache_dir.join(FRAGMENTS_DIR)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.output_dir.join(STATIC_DIR)
    }

    pub fn status_file(&self) -> PathBuf {
        self.cache_dir.join(STATUS_FILE)
    }

    pub fn client_artifact(&self) -> PathBuf {
        self.cache_dir.join(CLIENT_ARTIFACT)
    }

    pub fn server_artifact(&self) -> PathBuf {
        self.cache_dir.join(SERVER_ARTIFACT)
    }

    /// Resolve a site-relative path (absolute paths pass through)
    pub fn site_path(&self, path: &Path) -> PathBuf {
        self.site_dir.join(path)
    }
}
