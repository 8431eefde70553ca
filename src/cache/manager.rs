//! Cache directory purge decisions and scaffolding
//!
//! The manager decides from the stored status and a directory health check
//! whether the cache tree can be trusted, wipes it when it cannot, and then
//! lays out the directories every bootstrap needs.

use crate::cache::layout::SiteLayout;
use crate::cache::status::CacheStatus;
use crate::config::CONFIG_FILE_NAME;
use crate::error::{KilnError, KilnResult};
use crate::fingerprint::Fingerprint;
use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Why the cache is or is not purged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurgeReason {
    /// No fingerprint recorded yet
    FirstRun,
    /// Plugins or sentinel files changed since the last run
    FingerprintMismatch,
    /// Cache artifacts exist but the output directory does not
    CorruptDirectory,
    /// Nothing changed
    None,
}

impl fmt::Display for PurgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FirstRun => "first-run",
            Self::FingerprintMismatch => "fingerprint-mismatch",
            Self::CorruptDirectory => "corrupt-directory",
            Self::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of comparing the stored status with the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheDecision {
    pub purge: bool,
    pub reason: PurgeReason,
}

impl CacheDecision {
    fn keep(reason: PurgeReason) -> Self {
        Self {
            purge: false,
            reason,
        }
    }

    fn purge(reason: PurgeReason) -> Self {
        Self {
            purge: true,
            reason,
        }
    }

    /// Whether the purge recovers from an interrupted run
    pub fn is_corruption(&self) -> bool {
        self.reason == PurgeReason::CorruptDirectory
    }
}

/// What `apply` actually did to the cache directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// No purge was required
    Kept,
    /// The cache directory was removed
    Removed,
    /// Removal failed; the directory was emptied in place instead
    EmptiedInPlace,
    /// Everything except these cache-relative subtrees was removed
    Preserved(Vec<PathBuf>),
}

/// Decides on, performs, and recovers from cache purges
pub struct CacheDirManager {
    layout: SiteLayout,
}

impl CacheDirManager {
    pub fn new(layout: SiteLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// A prior run wrote cache artifacts but never produced output
    pub fn is_corrupt(&self) -> bool {
        self.layout.json_dir().exists() && !self.layout.output_dir().exists()
    }

    /// Decide whether the cache must be purged
    ///
    /// Corruption and a fingerprint mismatch are each sufficient on their
    /// own; when both hold the result is a single purge.
    pub fn decide(&self, status: &CacheStatus, current: &Fingerprint) -> CacheDecision {
        if status.corrupted || self.is_corrupt() {
            return CacheDecision::purge(PurgeReason::CorruptDirectory);
        }

        if status.is_first_run() {
            return CacheDecision::keep(PurgeReason::FirstRun);
        }

        match &status.last_fingerprint {
            Some(last) if last != current => {
                debug!(
                    "Fingerprint changed: {} -> {}",
                    last.short(),
                    current.short()
                );
                CacheDecision::purge(PurgeReason::FingerprintMismatch)
            }
            _ => CacheDecision::keep(PurgeReason::None),
        }
    }

    /// Carry out a decision
    ///
    /// `preserve` names cache-relative subtrees to keep. If sparing them
    /// fails the whole cache is wiped instead.
    pub async fn apply(
        &self,
        decision: &CacheDecision,
        preserve: &[PathBuf],
    ) -> KilnResult<PurgeOutcome> {
        if !decision.purge {
            return Ok(PurgeOutcome::Kept);
        }

        let preserve = preserve
            .iter()
            .map(|p| self.cache_relative(p))
            .collect::<KilnResult<Vec<_>>>()?;

        let cache_dir = self.layout.cache_dir();
        info!(
            "Clearing cache at {} ({})",
            cache_dir.display(),
            decision.reason
        );

        if preserve.is_empty() {
            return wipe(cache_dir).await;
        }

        match remove_except(cache_dir, &preserve).await {
            Ok(()) => Ok(PurgeOutcome::Preserved(preserve)),
            Err(e) => {
                warn!(
                    "Could not spare preserved cache subtrees ({}); clearing everything",
                    e
                );
                wipe(cache_dir).await
            }
        }
    }

    /// Normalize a preserved subtree to a plain path below the cache directory
    ///
    /// Absolute paths must lie inside the cache; `.` components are dropped.
    /// Anything that would reach outside the cache, or name the cache
    /// itself, is a configuration error.
    fn cache_relative(&self, subtree: &Path) -> KilnResult<PathBuf> {
        let invalid = |reason: &str| KilnError::ConfigInvalid {
            path: self.layout.site_dir().join(CONFIG_FILE_NAME),
            reason: format!("preserved cache subtree {}: {}", subtree.display(), reason),
        };

        let relative = if subtree.is_absolute() {
            subtree
                .strip_prefix(self.layout.cache_dir())
                .map_err(|_| invalid("must be inside the cache directory"))?
        } else {
            subtree
        };

        let mut normalized = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => normalized.push(part),
                _ => return Err(invalid("must not leave the cache directory")),
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(invalid("must name a directory below the cache"));
        }
        Ok(normalized)
    }

    /// Ensure the directory layout exists; fragments always start empty
    pub async fn scaffold(&self) -> KilnResult<()> {
        let cache_dir = self.layout.cache_dir().to_path_buf();
        let json_dir = self.layout.json_dir();
        let fragments_dir = self.layout.fragments_dir();
        let static_dir = self.layout.static_dir();

        for dir in [&cache_dir, &json_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| KilnError::scaffold(dir, e))?;
        }

        match fs::remove_dir_all(&fragments_dir).await {
            Ok(()) => debug!("Reset {}", fragments_dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(KilnError::scaffold(&fragments_dir, e)),
        }
        fs::create_dir_all(&fragments_dir)
            .await
            .map_err(|e| KilnError::scaffold(&fragments_dir, e))?;

        fs::create_dir_all(&static_dir)
            .await
            .map_err(|e| KilnError::scaffold(&static_dir, e))?;

        Ok(())
    }
}

/// Remove a directory tree, emptying it in place if removal fails
pub async fn wipe(dir: &Path) -> KilnResult<PurgeOutcome> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(PurgeOutcome::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(PurgeOutcome::Removed),
        Err(e) => {
            warn!(
                "Failed to remove {} ({}); emptying it in place",
                dir.display(),
                e
            );
            empty_in_place(dir)
                .await
                .map_err(|source| KilnError::CachePurge {
                    path: dir.to_path_buf(),
                    source,
                })?;
            Ok(PurgeOutcome::EmptiedInPlace)
        }
    }
}

/// Delete every entry of a directory, keeping the directory itself
async fn empty_in_place(dir: &Path) -> std::io::Result<()> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        remove_entry(&entry.path()).await?;
    }
    Ok(())
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

/// Delete everything under `root` except the given relative subtrees
///
/// Ancestors of a preserved subtree are descended into rather than removed,
/// so `caches/downloads` keeps `caches/` but clears its other entries.
async fn remove_except(root: &Path, preserve: &[PathBuf]) -> std::io::Result<()> {
    let mut pending = vec![PathBuf::new()];

    while let Some(rel_dir) = pending.pop() {
        let mut entries = match fs::read_dir(root.join(&rel_dir)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let rel = rel_dir.join(entry.file_name());

            if preserve.iter().any(|p| p == &rel) {
                debug!("Preserving {}", rel.display());
                continue;
            }

            let is_ancestor = preserve.iter().any(|p| p.starts_with(&rel));
            if is_ancestor && entry.file_type().await?.is_dir() {
                pending.push(rel);
                continue;
            }

            remove_entry(&entry.path()).await?;
        }
    }

    Ok(())
}
