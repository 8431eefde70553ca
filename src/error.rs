//! Error types for kiln
//!
//! All modules use `KilnResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kiln operations
pub type KilnResult<T> = Result<T, KilnError>;

/// All errors that can occur during a bootstrap
#[derive(Error, Debug)]
pub enum KilnError {
    // Program input errors
    #[error("Missing required program argument: {0}")]
    MissingArgument(&'static str),

    #[error("Site directory not found: {0}")]
    SiteDirNotFound(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid plugin entry {name}: {reason}")]
    PluginInvalid { name: String, reason: String },

    // Cache errors
    #[error("Failed to clear cache directory {path}: {source}")]
    CachePurge {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to scaffold {path}: {source}")]
    Scaffold {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Template errors
    #[error("Failed to read server runner template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage templates into {path}: {reason}")]
    TemplateStage { path: PathBuf, reason: String },

    // Lifecycle errors
    #[error("Lifecycle hook {hook} failed: {reason}")]
    Lifecycle { hook: &'static str, reason: String },

    #[error("Failed to create worker pool: {0}")]
    WorkerPool(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl KilnError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a scaffold error for a path
    pub fn scaffold(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scaffold {
            path: path.into(),
            source,
        }
    }

    /// Create a lifecycle hook error
    pub fn lifecycle(hook: &'static str, reason: impl Into<String>) -> Self {
        Self::Lifecycle {
            hook,
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SiteDirNotFound(_) => Some("Pass --site <DIR> or run from the site root"),
            Self::CachePurge { .. } => {
                Some("Check permissions on the cache directory or remove it manually")
            }
            Self::TemplateRead { .. } | Self::TemplateStage { .. } => {
                Some("Check paths.templates_dir in kiln.toml")
            }
            Self::ConfigInvalid { .. } => Some("Run: kiln config show"),
            _ => None,
        }
    }
}
