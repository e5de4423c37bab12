//! Palette and semantic styles for the shell and plugin surfaces.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ───────────────────────────────────────────────────────────

pub const ACCENT_BLUE: Color = Color::Rgb(88, 166, 255); // #58a6ff
pub const SOFT_VIOLET: Color = Color::Rgb(188, 140, 255); // #bc8cff
pub const AMBER: Color = Color::Rgb(227, 179, 65); // #e3b341
pub const SUCCESS_GREEN: Color = Color::Rgb(63, 185, 80); // #3fb950
pub const ERROR_RED: Color = Color::Rgb(248, 81, 73); // #f85149
pub const FG_DEFAULT: Color = Color::Rgb(201, 209, 217); // #c9d1d9
pub const FG_MUTED: Color = Color::Rgb(139, 148, 158); // #8b949e
pub const BG_CANVAS: Color = Color::Rgb(13, 17, 23); // #0d1117
pub const BG_PANEL: Color = Color::Rgb(22, 27, 34); // #161b22

// ── Semantic styles ───────────────────────────────────────────────────

/// Panel and dialog titles.
pub fn title_style() -> Style {
    Style::default()
        .fg(ACCENT_BLUE)
        .add_modifier(Modifier::BOLD)
}

/// Border of the surface holding input focus.
pub fn border_focused() -> Style {
    Style::default().fg(ACCENT_BLUE)
}

/// Border of any other surface.
pub fn border_default() -> Style {
    Style::default().fg(FG_MUTED)
}

/// A successful outcome line.
pub fn success() -> Style {
    Style::default().fg(SUCCESS_GREEN)
}

/// A failure outcome line.
pub fn error() -> Style {
    Style::default().fg(ERROR_RED)
}

/// Key hint text in the status bar and dialogs.
pub fn key_hint() -> Style {
    Style::default().fg(FG_MUTED)
}

/// The key itself inside a hint.
pub fn key_hint_key() -> Style {
    Style::default()
        .fg(ACCENT_BLUE)
        .add_modifier(Modifier::BOLD)
}

/// Highlighted row in the main menu overlay.
pub fn menu_selected() -> Style {
    Style::default()
        .fg(BG_CANVAS)
        .bg(ACCENT_BLUE)
        .add_modifier(Modifier::BOLD)
}
