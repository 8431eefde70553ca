//! Cache fingerprinting
//!
//! A fingerprint summarizes the plugin versions and the contents of a few
//! sentinel files (package manifest, site config, node hooks). When it
//! changes between runs the cache can no longer be trusted.
//!
//! Sentinel files that do not exist contribute a fixed marker instead of
//! failing the computation.

use crate::error::{KilnError, KilnResult};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Contribution of a sentinel file that does not exist
const ABSENT_MARKER: &str = "absent";

/// A 64-character lowercase hex SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an existing digest string
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a well-formed SHA-256 hex digest
    pub fn is_digest(&self) -> bool {
        self.0.len() == 64 && self.0.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// First 12 characters, for display
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash one sentinel file, returning `None` when it does not exist
async fn hash_sentinel(path: &Path) -> KilnResult<Option<String>> {
    match fs::read(path).await {
        Ok(contents) => Ok(Some(hex::encode(Sha256::digest(&contents)))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Sentinel file {} not found", path.display());
            Ok(None)
        }
        Err(e) => Err(KilnError::io(
            format!("reading sentinel file {}", path.display()),
            e,
        )),
    }
}

/// Compute the fingerprint for an ordered plugin list and sentinel files
///
/// Callers fix the order of both inputs; reordering either changes the
/// result. Sentinel files are read concurrently and recombined by position.
pub async fn compute(
    plugin_versions: &[(String, String)],
    sentinel_files: &[PathBuf],
) -> KilnResult<Fingerprint> {
    let sentinel_hashes =
        try_join_all(sentinel_files.iter().map(|path| hash_sentinel(path))).await?;

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(plugin_versions)?);
    for hash in &sentinel_hashes {
        hasher.update(b"\n");
        hasher.update(hash.as_deref().unwrap_or(ABSENT_MARKER).as_bytes());
    }

    let fingerprint = Fingerprint(hex::encode(hasher.finalize()));
    debug!(
        "Computed fingerprint {} from {} plugins and {} sentinel files",
        fingerprint.short(),
        plugin_versions.len(),
        sentinel_files.len()
    );
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn versions(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn fingerprint_deterministic() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("package.json");
        std::fs::write(&manifest, r#"{"name": "site"}"#).unwrap();

        let plugins = versions(&[("p1", "1.0.0")]);
        let first = compute(&plugins, &[manifest.clone()]).await.unwrap();
        let second = compute(&plugins, &[manifest]).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[tokio::test]
    async fn version_bump_changes_fingerprint() {
        let before = compute(&versions(&[("p1", "1.0.0")]), &[]).await.unwrap();
        let after = compute(&versions(&[("p1", "1.1.0")]), &[]).await.unwrap();
        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn sentinel_content_changes_fingerprint() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("kiln.toml");
        let plugins = versions(&[("p1", "1.0.0")]);

        std::fs::write(&config, "a = 1").unwrap();
        let before = compute(&plugins, &[config.clone()]).await.unwrap();

        std::fs::write(&config, "a = 2").unwrap();
        let after = compute(&plugins, &[config]).await.unwrap();

        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn missing_sentinel_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("kiln-node.js");
        let plugins = versions(&[("p1", "1.0.0")]);

        let with_missing = compute(&plugins, &[missing.clone()]).await.unwrap();
        let again = compute(&plugins, &[missing.clone()]).await.unwrap();
        assert_eq!(with_missing, again);

        // Creating the file, even empty, is a change
        std::fs::write(&missing, "").unwrap();
        let created = compute(&plugins, &[missing]).await.unwrap();
        assert_ne!(with_missing, created);
    }

    #[tokio::test]
    async fn plugin_order_matters() {
        let ab = compute(&versions(&[("a", "1"), ("b", "1")]), &[]).await.unwrap();
        let ba = compute(&versions(&[("b", "1"), ("a", "1")]), &[]).await.unwrap();
        assert_ne!(ab, ba);
    }

    #[tokio::test]
    async fn unreadable_sentinel_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a file
        let err = compute(&[], &[dir.path().to_path_buf()]).await.unwrap_err();
        assert!(matches!(err, KilnError::Io { .. }));
    }

    #[test]
    fn short_form() {
        let fp = Fingerprint::from_hex("0123456789abcdef");
        assert_eq!(fp.short(), "0123456789ab");
        assert_eq!(Fingerprint::from_hex("abc").short(), "abc");
    }

    #[test]
    fn short_form_respects_char_boundaries() {
        let fp: Fingerprint = serde_json::from_str("\"aéééééééééééé\"").unwrap();
        assert_eq!(fp.short(), "aééééééééééé");
        assert!(!fp.is_digest());
    }

    #[tokio::test]
    async fn computed_fingerprint_is_a_digest() {
        let fp = compute(&versions(&[("p1", "1.0.0")]), &[]).await.unwrap();
        assert!(fp.is_digest());
        assert!(!Fingerprint::from_hex("AB".repeat(32)).is_digest());
        assert!(!Fingerprint::from_hex("ab").is_digest());
    }
}
