//! Terminal UI helpers
//!
//! `cliclack` framing, `indicatif` bars and `console` styling in a
//! terminal; plain bracketed lines (`[OK]`, `[WARN]`) in CI logs.

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, outro_warn, section, step_info, step_ok,
    step_ok_detail, step_warn,
};
pub use progress::{PhaseProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, KilnTheme};
