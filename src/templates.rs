//! Staging of runtime templates into the cache directory
//!
//! Every bootstrap copies a fixed template set into the cache, overwriting
//! whatever the previous run left. Sites may point `paths.templates_dir` at
//! their own set; otherwise the built-in one is written.

use crate::error::{KilnError, KilnResult};
use std::path::Path;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Built-in template set: (file name, contents)
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "api-runner-ssr.js",
        include_str!("../templates/api-runner-ssr.js"),
    ),
    (
        "api-runner-browser.js",
        include_str!("../templates/api-runner-browser.js"),
    ),
    ("app.js", include_str!("../templates/app.js")),
];

fn stage_error(cache_dir: &Path, reason: impl Into<String>) -> KilnError {
    KilnError::TemplateStage {
        path: cache_dir.to_path_buf(),
        reason: reason.into(),
    }
}

/// Copy the template set into `cache_dir`, returning the number of files
pub async fn stage(source: Option<&Path>, cache_dir: &Path) -> KilnResult<usize> {
    fs::create_dir_all(cache_dir)
        .await
        .map_err(|e| stage_error(cache_dir, e.to_string()))?;

    match source {
        Some(dir) => copy_tree(dir, cache_dir).await,
        None => {
            for (name, contents) in BUILTIN_TEMPLATES {
                fs::write(cache_dir.join(name), contents)
                    .await
                    .map_err(|e| stage_error(cache_dir, format!("{}: {}", name, e)))?;
            }
            debug!("Staged {} built-in templates", BUILTIN_TEMPLATES.len());
            Ok(BUILTIN_TEMPLATES.len())
        }
    }
}

async fn copy_tree(source: &Path, dest: &Path) -> KilnResult<usize> {
    if !source.is_dir() {
        return Err(stage_error(
            dest,
            format!("template directory {} does not exist", source.display()),
        ));
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| stage_error(dest, e.to_string()))?;
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        if rel.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .await
                .map_err(|e| stage_error(dest, format!("{}: {}", target.display(), e)))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .await
                .map_err(|e| stage_error(dest, format!("{}: {}", rel.display(), e)))?;
            copied += 1;
        }
    }

    debug!("Staged {} templates from {}", copied, source.display());
    Ok(copied)
}
