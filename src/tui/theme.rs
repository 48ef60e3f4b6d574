//! TUI colour palette.
//!
//! Dark by default; a light palette is picked when the terminal reports a
//! light background through `COLORFGBG`.

use ratatui::style::Color;

/// Colours used by the TUI widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Borders and titles
    pub primary: Color,
    /// Focused input
    pub highlight: Color,
    /// Errors and the stop control
    pub danger: Color,
    /// Running state and the start control
    pub success: Color,
    /// Hints and disabled controls
    pub dim: Color,
    pub normal: Color,
}

impl Theme {
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            highlight: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::DarkGray,
            normal: Color::White,
        }
    }

    #[must_use]
    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            highlight: Color::Magenta,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::Gray,
            normal: Color::Black,
        }
    }

    /// Pick a palette from the terminal environment.
    #[must_use]
    pub fn auto() -> Self {
        match std::env::var("COLORFGBG") {
            Ok(value) if is_light_background(&value) => Self::light(),
            _ => Self::dark(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// `COLORFGBG` is `fg;bg`; indices 7 and 9..=15 are light backgrounds.
fn is_light_background(colorfgbg: &str) -> bool {
    colorfgbg
        .rsplit(';')
        .next()
        .and_then(|bg| bg.parse::<u32>().ok())
        .is_some_and(|bg| bg >= 7 && bg != 8)
}
