mod colors;
mod theme;

pub use colors::Color;
pub use theme::Theme;

/// Built-in themes
pub fn default_theme() -> Theme {
    Theme::github_dark()
}
