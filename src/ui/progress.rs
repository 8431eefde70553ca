//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::report::{Phase, Reporter};
use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a single long-running step
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

/// Bootstrap phase bar
///
/// Shows an indicatif bar over the phase sequence in a terminal and one
/// line per finished phase otherwise. Plugs into the orchestrator as a
/// `Reporter`.
pub struct PhaseProgress {
    bar: Option<ProgressBar>,
}

impl PhaseProgress {
    pub fn new(ctx: &UiContext) -> Self {
        let bar = ctx.use_fancy_output().then(|| {
            let bar = ProgressBar::new(Phase::ALL.len() as u64);
            if let Ok(bar_style) = ProgressStyle::default_bar().template(
                "  {spinner:.208} {prefix}  {bar:20.208/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}",
            ) {
                bar.set_style(
                    bar_style
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.set_prefix("Bootstrapping");
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self { bar }
    }

    /// Clear the bar; safe to call more than once
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[async_trait]
impl Reporter for PhaseProgress {
    async fn phase_started(&self, phase: Phase) {
        if let Some(ref bar) = self.bar {
            bar.set_message(phase.label());
        }
    }

    async fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        match self.bar {
            Some(ref bar) => bar.inc(1),
            None => println!(
                "  {} [{}/{}] {} {}",
                style("[OK]").green(),
                phase.ordinal(),
                Phase::ALL.len(),
                phase,
                style(format!("{:.3}s", elapsed.as_secs_f64())).dim()
            ),
        }
    }

    async fn warn(&self, message: &str) {
        match self.bar {
            Some(ref bar) => bar.println(format!("  {} {}", style("!").yellow(), message)),
            None => println!("  {} {}", style("[WARN]").yellow(), message),
        }
    }

    async fn error(&self, _message: &str) {
        // reported by the caller once the bar is gone
        self.finish();
    }
}
