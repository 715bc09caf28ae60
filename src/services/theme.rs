//! Colour palette for the terminal UI.

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Semantic colours used by the screens.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Focused borders, titles, the brand banner
    pub accent: Color,
    /// Secondary text, unfocused borders
    pub muted: Color,
    pub text: Color,
    pub error: Color,
    pub success: Color,
    /// The user's side of the transcript
    pub question: Color,
    /// The assistant's side of the transcript
    pub answer: Color,
    /// Background of the selected list row
    pub selection: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            text: Color::White,
            error: Color::LightRed,
            success: Color::LightGreen,
            question: Color::LightBlue,
            answer: Color::Gray,
            selection: Color::DarkGray,
        }
    }
}

impl Theme {
    /// Defaults with any configured overrides applied. Unparseable values are
    /// ignored.
    pub fn from_config(config: &ThemeConfig) -> Self {
        let base = Self::default();
        let pick = |value: &Option<String>, fallback: Color| {
            value.as_deref().and_then(parse_hex).unwrap_or(fallback)
        };

        Self {
            accent: pick(&config.accent, base.accent),
            muted: pick(&config.muted, base.muted),
            error: pick(&config.error, base.error),
            success: pick(&config.success, base.success),
            question: pick(&config.question, base.question),
            answer: pick(&config.answer, base.answer),
            ..base
        }
    }
}

/// Parse a hex color string like "#RRGGBB" to a ratatui Color.
fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Color::Rgb(r, g, b))
}
