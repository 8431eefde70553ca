//! Removal of stale production output
//!
//! A production build regenerates every page, so HTML and CSS left over
//! from the previous build, and the page-data tree, are deleted before the
//! new build starts. Static assets are kept.

use crate::error::{KilnError, KilnResult};
use std::path::Path;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions of generated files that are always rebuilt
const STALE_EXTENSIONS: &[&str] = &["html", "css"];
/// Output subdirectory holding per-page data
const PAGE_DATA_DIR: &str = "page-data";
/// Output subdirectory that is never touched
const STATIC_DIR: &str = "static";

/// Delete stale generated files from `output_dir`, returning how many were removed
pub async fn delete_stale(output_dir: &Path) -> KilnResult<usize> {
    if !output_dir.exists() {
        return Ok(0);
    }

    let mut stale = Vec::new();
    let walker = WalkDir::new(output_dir).into_iter().filter_entry(|e| {
        e.depth() != 1 || (e.file_name() != STATIC_DIR && e.file_name() != PAGE_DATA_DIR)
    });
    for entry in walker {
        let entry = entry.map_err(|e| {
            KilnError::Internal(format!("walking {}: {}", output_dir.display(), e))
        })?;
        let is_stale = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| STALE_EXTENSIONS.contains(&ext));
        if is_stale {
            stale.push(entry.into_path());
        }
    }

    for path in &stale {
        fs::remove_file(path)
            .await
            .map_err(|e| KilnError::io(format!("deleting {}", path.display()), e))?;
    }

    let page_data = output_dir.join(PAGE_DATA_DIR);
    if page_data.exists() {
        fs::remove_dir_all(&page_data)
            .await
            .map_err(|e| KilnError::io(format!("deleting {}", page_data.display()), e))?;
    }

    debug!("Deleted {} stale output files", stale.len());
    Ok(stale.len())
}
