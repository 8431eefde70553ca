//! cliclack theme in kiln's orange branding

use cliclack::ThemeState;
use console::Style;

#[derive(Debug, Clone, Default)]
pub struct KilnTheme;

impl KilnTheme {
    fn accent() -> Style {
        Style::new().color256(208)
    }
}

impl cliclack::Theme for KilnTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Self::accent(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Self::accent().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Self::accent(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Install the theme for every cliclack prompt in this process
pub fn init_theme() {
    cliclack::set_theme(KilnTheme);
}
