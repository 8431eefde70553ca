//! Cache status persistence
//!
//! Stores the fingerprint of the last bootstrap so the next run can tell
//! whether plugins or config changed in between.

use crate::error::{KilnError, KilnResult};
use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Last known cache state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatus {
    /// Fingerprint saved by the previous run; `None` on first run
    pub last_fingerprint: Option<Fingerprint>,

    /// Set by the directory health check for the current decision only
    pub corrupted: bool,
}

impl CacheStatus {
    /// Whether no prior run has been recorded
    pub fn is_first_run(&self) -> bool {
        self.last_fingerprint.is_none()
    }
}

/// Durable store for the last fingerprint
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Load the last status; a missing record is a first run
    async fn load(&self) -> KilnResult<CacheStatus>;

    /// Overwrite the record with the current fingerprint
    async fn save(&self, fingerprint: &Fingerprint) -> KilnResult<()>;
}

/// On-disk record format
#[derive(Debug, Serialize, Deserialize)]
struct StatusRecord {
    fingerprint: Fingerprint,
    updated_at: DateTime<Utc>,
}

/// JSON file backed status store
pub struct FileStatusStore {
    path: PathBuf,
}

impl FileStatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn load(&self) -> KilnResult<CacheStatus> {
        if !self.path.exists() {
            debug!("No status record at {}", self.path.display());
            return Ok(CacheStatus::default());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            KilnError::io(format!("reading status record {}", self.path.display()), e)
        })?;

        match serde_json::from_str::<StatusRecord>(&content) {
            Ok(record) if record.fingerprint.is_digest() => Ok(CacheStatus {
                last_fingerprint: Some(record.fingerprint),
                corrupted: false,
            }),
            Ok(record) => {
                warn!(
                    "Ignoring status record {} with malformed fingerprint {:?}",
                    self.path.display(),
                    record.fingerprint.as_str()
                );
                Ok(CacheStatus::default())
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable status record {}: {}",
                    self.path.display(),
                    e
                );
                Ok(CacheStatus::default())
            }
        }
    }

    async fn save(&self, fingerprint: &Fingerprint) -> KilnResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| KilnError::io("creating status directory", e))?;
        }

        let record = StatusRecord {
            fingerprint: fingerprint.clone(),
            updated_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&record)?;

        // Write then rename so a crash never leaves a partial record
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| KilnError::io(format!("writing status record {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            KilnError::io(format!("replacing status record {}", self.path.display()), e)
        })?;

        debug!("Saved fingerprint {}", fingerprint.short());
        Ok(())
    }
}

/// In-memory status store
#[derive(Default)]
pub struct MemoryStatusStore {
    fingerprint: Mutex<Option<Fingerprint>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a prior fingerprint
    pub fn with_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint: Mutex::new(Some(fingerprint)),
        }
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn load(&self) -> KilnResult<CacheStatus> {
        Ok(CacheStatus {
            last_fingerprint: self.fingerprint.lock().await.clone(),
            corrupted: false,
        })
    }

    async fn save(&self, fingerprint: &Fingerprint) -> KilnResult<()> {
        *self.fingerprint.lock().await = Some(fingerprint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_record_is_first_run() {
        let dir = TempDir::new().unwrap();
        let store = FileStatusStore::new(dir.path().join("status.json"));

        let status = store.load().await.unwrap();
        assert!(status.is_first_run());
        assert!(!status.corrupted);
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileStatusStore::new(dir.path().join("nested/status.json"));
        let fp = Fingerprint::from_hex("ab".repeat(32));

        store.save(&fp).await.unwrap();
        let status = store.load().await.unwrap();

        assert_eq!(status.last_fingerprint, Some(fp));
        assert!(!dir.path().join("nested/status.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_unconditionally() {
        let dir = TempDir::new().unwrap();
        let store = FileStatusStore::new(dir.path().join("status.json"));

        store.save(&Fingerprint::from_hex("a".repeat(64))).await.unwrap();
        store.save(&Fingerprint::from_hex("b".repeat(64))).await.unwrap();

        let status = store.load().await.unwrap();
        assert_eq!(
            status.last_fingerprint,
            Some(Fingerprint::from_hex("b".repeat(64)))
        );
    }

    #[tokio::test]
    async fn garbage_record_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, "{not json").unwrap();

        let status = FileStatusStore::new(path).load().await.unwrap();
        assert!(status.is_first_run());
    }

    #[tokio::test]
    async fn malformed_fingerprint_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        let upper = "AB".repeat(32);

        for fingerprint in ["aéééééééééé", "f1", upper.as_str()] {
            std::fs::write(
                &path,
                format!(r#"{{"fingerprint":"{fingerprint}","updated_at":"2026-01-01T00:00:00Z"}}"#),
            )
            .unwrap();

            let status = FileStatusStore::new(&path).load().await.unwrap();
            assert!(status.is_first_run(), "{fingerprint} was accepted");
        }
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStatusStore::new();
        assert!(store.load().await.unwrap().is_first_run());

        store.save(&Fingerprint::from_hex("f1")).await.unwrap();
        assert_eq!(
            store.load().await.unwrap().last_fingerprint,
            Some(Fingerprint::from_hex("f1"))
        );
    }
}
