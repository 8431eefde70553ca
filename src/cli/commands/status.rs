//! Status command - preview the next cache decision without touching disk

use crate::cache::{CacheDirManager, FileStatusStore, SiteLayout, StatusStore};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::{Config, EnvToggles, ResolvedFlags};
use crate::error::KilnResult;
use crate::fingerprint;
use crate::plugin;
use crate::ui::{self, UiContext};
use std::path::{Path, PathBuf};

/// Execute the status command
pub async fn execute(args: StatusArgs, site: &Path, config: &Config) -> KilnResult<()> {
    let layout = SiteLayout::from_config(site, config);
    let plugins = plugin::records_from_entries(&config.plugins, site)?;
    let sentinels: Vec<PathBuf> = config
        .fingerprint
        .sentinel_files
        .iter()
        .map(|p| layout.site_path(p))
        .collect();
    let current = fingerprint::compute(&plugin::version_pairs(&plugins), &sentinels).await?;

    let manager = CacheDirManager::new(layout.clone());
    let mut status = FileStatusStore::new(layout.status_file()).load().await?;
    status.corrupted = manager.is_corrupt();
    let decision = manager.decide(&status, &current);
    let (flags, flag_warnings) = ResolvedFlags::resolve(&config.flags, &EnvToggles::from_env());
    let warnings: Vec<String> = config
        .deprecations
        .iter()
        .cloned()
        .chain(flag_warnings)
        .collect();

    match args.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "site": site,
                "cache_dir": layout.cache_dir(),
                "fingerprint": current,
                "stored_fingerprint": status.last_fingerprint,
                "corrupted": status.corrupted,
                "decision": decision,
                "plugins": plugins.len(),
                "flags": {
                    "preserve_download_cache": flags.preserve_download_cache,
                    "preserve_compiler_cache": flags.preserve_compiler_cache,
                    "page_build_on_data_changes": flags.page_build_on_data_changes,
                },
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::intro(&ctx, "kiln status");

            ui::section(&ctx, "Cache");
            ui::key_value(&ctx, "Directory", &layout.cache_dir().display().to_string());
            ui::key_value(&ctx, "Fingerprint", current.short());
            ui::key_value(
                &ctx,
                "Stored",
                status
                    .last_fingerprint
                    .as_ref()
                    .map(|f| f.short())
                    .unwrap_or("none"),
            );
            ui::key_value_status(&ctx, "Healthy", if status.corrupted { "no" } else { "yes" }, !status.corrupted);
            ui::key_value_status(
                &ctx,
                "Next bootstrap",
                &format!(
                    "{} ({})",
                    if decision.purge { "clears cache" } else { "keeps cache" },
                    decision.reason
                ),
                !decision.purge,
            );

            ui::section(&ctx, "Flags");
            ui::key_value(&ctx, "Preserve download cache", &flags.preserve_download_cache.to_string());
            ui::key_value(&ctx, "Preserve compiler cache", &flags.preserve_compiler_cache.to_string());
            ui::key_value(
                &ctx,
                "Page build on data changes",
                &flags.page_build_on_data_changes.to_string(),
            );
            for warning in &warnings {
                ui::step_warn(&ctx, warning);
            }

            ui::section(&ctx, "Plugins");
            if plugins.is_empty() {
                ui::key_value(&ctx, "Loaded", "none");
            }
            for p in &plugins {
                ui::key_value(&ctx, &p.name, &p.version);
            }
        }
    }

    Ok(())
}
