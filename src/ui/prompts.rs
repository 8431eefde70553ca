//! Confirmation prompt with a non-interactive fallback

use super::context::UiContext;
use crate::error::{KilnError, KilnResult};

/// Ask a yes/no question
///
/// Returns `true` under `--yes`, and `default` when there is no terminal.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> KilnResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| KilnError::User(format!("Prompt task failed: {}", e)))?;

    answer.map_err(|e| KilnError::User(format!("Prompt failed: {}", e)))
}
