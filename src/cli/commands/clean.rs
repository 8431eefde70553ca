//! Clean command - remove the cache and output directories

use crate::cache::{manager, SiteLayout};
use crate::cli::args::CleanArgs;
use crate::config::Config;
use crate::error::KilnResult;
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;

/// Execute the clean command
pub async fn execute(args: CleanArgs, site: &Path, config: &Config) -> KilnResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let layout = SiteLayout::from_config(site, config);

    let targets: Vec<&Path> = [layout.cache_dir(), layout.output_dir()]
        .into_iter()
        .filter(|dir| dir.exists())
        .collect();

    if targets.is_empty() {
        ui::outro_warn(&ctx, "Nothing to clean");
        return Ok(());
    }

    for dir in &targets {
        ui::step_info(&ctx, &dir.display().to_string());
    }

    let prompt = format!("Remove {} director{}?", targets.len(), if targets.len() == 1 { "y" } else { "ies" });
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::outro_warn(&ctx, "Cancelled");
        return Ok(());
    }

    let mut spinner = TaskSpinner::new(&ctx);
    for dir in targets {
        spinner.start(&format!("Removing {}", dir.display()));
        match manager::wipe(dir).await {
            Ok(_) => spinner.stop(&format!("Removed {}", dir.display())),
            Err(e) => {
                spinner.stop_error(&format!("Failed to remove {}", dir.display()));
                return Err(e);
            }
        }
    }

    ui::outro_success(&ctx, "Clean complete");
    Ok(())
}
