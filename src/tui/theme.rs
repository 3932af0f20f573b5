//! Color theme definitions for the UI.
//!
//! Built-in themes: default, dracula, nord, gruvbox, monochrome.
//! Selected via `--theme` or cycled with Ctrl-T; the choice is saved in prefs.

use ratatui::style::Color;
use std::borrow::Cow;

/// All themeable colors in the application
#[derive(Clone, Debug)]
pub struct Theme {
    name: Cow<'static, str>,

    // UI chrome
    pub border: Color,
    pub border_focused: Color,
    pub text: Color,
    pub text_dim: Color,
    pub highlight_bg: Color,

    // Log line kinds
    pub success: Color, // run header
    pub warning: Color, // run still in flight
    pub error: Color,   // diagnostics: timeout, not found, invalid input

    // Accents
    pub shortcut: Color, // keyboard hints
    pub header: Color,   // title text, selected tab
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            name: Cow::Borrowed("default"),

            border: Color::Cyan,
            border_focused: Color::Yellow,
            text: Color::White,
            text_dim: Color::Gray,
            highlight_bg: Color::DarkGray,

            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,

            shortcut: Color::Yellow,
            header: Color::Cyan,
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: Cow::Borrowed("dracula"),

            border: Color::Rgb(189, 147, 249),         // Purple
            border_focused: Color::Rgb(255, 121, 198), // Pink
            text: Color::Rgb(248, 248, 242),
            text_dim: Color::Rgb(98, 114, 164),
            highlight_bg: Color::Rgb(68, 71, 90),

            success: Color::Rgb(80, 250, 123),
            warning: Color::Rgb(255, 184, 108),
            error: Color::Rgb(255, 85, 85),

            shortcut: Color::Rgb(241, 250, 140),
            header: Color::Rgb(255, 121, 198),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: Cow::Borrowed("nord"),

            border: Color::Rgb(136, 192, 208),         // Frost
            border_focused: Color::Rgb(235, 203, 139), // Aurora yellow
            text: Color::Rgb(236, 239, 244),
            text_dim: Color::Rgb(76, 86, 106),
            highlight_bg: Color::Rgb(59, 66, 82),

            success: Color::Rgb(163, 190, 140),
            warning: Color::Rgb(235, 203, 139),
            error: Color::Rgb(191, 97, 106),

            shortcut: Color::Rgb(129, 161, 193),
            header: Color::Rgb(136, 192, 208),
        }
    }

    pub fn gruvbox() -> Self {
        Self {
            name: Cow::Borrowed("gruvbox"),

            border: Color::Rgb(214, 93, 14),
            border_focused: Color::Rgb(250, 189, 47),
            text: Color::Rgb(235, 219, 178),
            text_dim: Color::Rgb(146, 131, 116),
            highlight_bg: Color::Rgb(60, 56, 54),

            success: Color::Rgb(184, 187, 38),
            warning: Color::Rgb(250, 189, 47),
            error: Color::Rgb(251, 73, 52),

            shortcut: Color::Rgb(131, 165, 152),
            header: Color::Rgb(254, 128, 25),
        }
    }

    /// High contrast, no hues beyond white/gray (error stays distinguishable)
    pub fn monochrome() -> Self {
        Self {
            name: Cow::Borrowed("monochrome"),

            border: Color::Gray,
            border_focused: Color::White,
            text: Color::White,
            text_dim: Color::DarkGray,
            highlight_bg: Color::Rgb(50, 50, 50),

            success: Color::White,
            warning: Color::Gray,
            error: Color::Rgb(255, 255, 255),

            shortcut: Color::White,
            header: Color::White,
        }
    }

    /// Get a theme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dracula" => Self::dracula(),
            "nord" => Self::nord(),
            "gruvbox" => Self::gruvbox(),
            "monochrome" | "mono" => Self::monochrome(),
            _ => Self::default_theme(),
        }
    }

    /// Get the theme name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// List all available theme names
    pub fn list() -> &'static [&'static str] {
        &["default", "dracula", "nord", "gruvbox", "monochrome"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_default() {
        let theme = Theme::by_name("default");
        assert_eq!(theme.name(), "default");
        assert_eq!(theme.border, Color::Cyan);
    }

    #[test]
    fn test_by_name_unknown_returns_default() {
        assert_eq!(Theme::by_name("unknown_theme").name(), "default");
    }

    #[test]
    fn test_by_name_case_insensitive() {
        assert_eq!(Theme::by_name("NORD").name(), "nord");
    }

    #[test]
    fn test_mono_alias() {
        assert_eq!(Theme::by_name("mono").name(), "monochrome");
    }

    #[test]
    fn test_list_matches_by_name() {
        for name in Theme::list() {
            assert_eq!(Theme::by_name(name).name(), *name);
        }
    }

    #[test]
    fn test_default_trait() {
        assert_eq!(Theme::default().name(), "default");
    }
}
