//! Bootstrap command - run every bootstrap phase for a site

use crate::bootstrap::{Bootstrap, BootstrapHandle, Program};
use crate::cache::PurgeOutcome;
use crate::cli::args::BootstrapArgs;
use crate::config::{Config, EnvToggles};
use crate::error::KilnResult;
use crate::report::{CompositeReporter, JournalReporter, TracingReporter, JOURNAL_FILE};
use crate::ui::{self, PhaseProgress, UiContext};
use crate::workers::TaskPoolFactory;
use std::path::Path;
use std::sync::Arc;

/// Execute the bootstrap command
pub async fn execute(args: BootstrapArgs, site: &Path, config: Config) -> KilnResult<()> {
    let ctx = UiContext::detect();
    let program = Program::new(site, args.mode.into())?;
    ui::intro(&ctx, &format!("kiln bootstrap ({})", program.mode()));

    let journal_enabled = config.general.journal;
    let bootstrap = Bootstrap::from_config(program, config)?;

    let progress = Arc::new(PhaseProgress::new(&ctx));
    let journal = JournalReporter::new(site.join(JOURNAL_FILE), journal_enabled);
    let reporter = CompositeReporter::new()
        .with(Arc::new(TracingReporter))
        .with(Arc::new(journal))
        .with(progress.clone());

    let workers = match args.workers {
        Some(size) => TaskPoolFactory::with_size(size),
        None => TaskPoolFactory::new(),
    };

    let result = bootstrap
        .with_env(EnvToggles::from_env())
        .with_reporter(Arc::new(reporter))
        .with_worker_factory(Arc::new(workers))
        .run()
        .await;
    progress.finish();

    let handle = result?;
    print_summary(&ctx, &handle);
    ui::outro_success(&ctx, "Ready to build");
    Ok(())
}

fn print_summary(ctx: &UiContext, handle: &BootstrapHandle) {
    let cache = match &handle.purge {
        PurgeOutcome::Kept => format!("kept ({})", handle.decision.reason),
        PurgeOutcome::Removed => format!("cleared ({})", handle.decision.reason),
        PurgeOutcome::EmptiedInPlace => format!("emptied in place ({})", handle.decision.reason),
        PurgeOutcome::Preserved(kept) => format!(
            "cleared ({}), kept {}",
            handle.decision.reason,
            kept.iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };

    ui::step_ok_detail(ctx, "Cache", &cache);
    ui::step_ok_detail(ctx, "Fingerprint", handle.fingerprint.short());
    ui::step_ok_detail(
        ctx,
        "Plugins",
        &format!(
            "{} client, {} server",
            handle.artifacts.client_plugins, handle.artifacts.server_plugins
        ),
    );
    ui::step_ok_detail(ctx, "Workers", &handle.workers.size().to_string());
}
