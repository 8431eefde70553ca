//! Program inputs for a bootstrap run

use crate::config::EnvToggles;
use crate::error::{KilnError, KilnResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How the site is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Development server
    #[default]
    Develop,
    /// One-off production build
    Build,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Develop => write!(f, "develop"),
            Self::Build => write!(f, "build"),
        }
    }
}

/// Validated program inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    site_dir: PathBuf,
    mode: ExecutionMode,
}

impl Program {
    /// Validate the site directory and build the program description
    pub fn new(site_dir: impl Into<PathBuf>, mode: ExecutionMode) -> KilnResult<Self> {
        let site_dir = site_dir.into();
        if site_dir.as_os_str().is_empty() {
            return Err(KilnError::MissingArgument("site directory"));
        }
        if !site_dir.is_dir() {
            return Err(KilnError::SiteDirNotFound(site_dir));
        }
        // Generated module paths are computed against this, so it must be absolute
        let site_dir = std::fs::canonicalize(&site_dir)
            .map_err(|_| KilnError::SiteDirNotFound(site_dir))?;
        Ok(Self { site_dir, mode })
    }

    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Production unless `KILN_ENV` says otherwise; `build` implies production
    pub fn is_production(&self, env: &EnvToggles) -> bool {
        env.production_override()
            .unwrap_or(self.mode == ExecutionMode::Build)
    }
}
