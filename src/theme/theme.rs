use serde::Serialize;

use super::Color;

/// Colors used by the Markdown widgets, the tree viewer and the terminal output
/// All fields are public so scripts can override them by slot name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub name: String,

    pub background: Color,
    pub foreground: Color,
    pub muted: Color,

    // Headings
    pub heading: Color,
    pub h1_rule: Color,
    pub h2_rule: Color,
    pub h6: Color,

    // Block quotes
    pub quote_border: Color,
    pub quote_text: Color,

    pub code: Color,
    pub code_background: Color,
    pub rule: Color,
    pub table_border: Color,
    pub placeholder: Color,

    // Tree viewer
    pub tree_kind: Color,
    pub tree_field: Color,
    pub tree_span: Color,
    pub tree_error: Color,
}

impl Theme {
    /// GitHub-like dark palette
    pub fn github_dark() -> Self {
        Self {
            name: "github-dark".to_string(),
            background: Color::rgb(0x0d, 0x11, 0x17),
            foreground: Color::rgb(0xf0, 0xf6, 0xfc),
            muted: Color::rgb(0x91, 0x98, 0xa1),

            heading: Color::rgb(0xf0, 0xf6, 0xfc),
            h1_rule: Color::rgb(0xab, 0xab, 0xab),
            h2_rule: Color::rgba(0x3d, 0x44, 0x4d, 0xb3),
            h6: Color::rgba(0x3d, 0x44, 0x4d, 0xb3),

            quote_border: Color::rgb(0x3d, 0x44, 0x4d),
            quote_text: Color::rgb(0x91, 0x98, 0xa1),

            code: Color::rgb(0xff, 0xa6, 0x57),
            code_background: Color::rgb(0x15, 0x1b, 0x23),
            rule: Color::rgb(0x3d, 0x44, 0x4d),
            table_border: Color::rgb(0x3d, 0x44, 0x4d),
            placeholder: Color::rgb(0xf8, 0x51, 0x49),

            tree_kind: Color::rgb(0x79, 0xc0, 0xff),
            tree_field: Color::rgb(0xd2, 0xa8, 0xff),
            tree_span: Color::rgb(0x91, 0x98, 0xa1),
            tree_error: Color::rgb(0xf8, 0x51, 0x49),
        }
    }

    /// Slot names accepted by [`Theme::set_color`]
    pub const SLOTS: &'static [&'static str] = &[
        "background",
        "foreground",
        "muted",
        "heading",
        "h1_rule",
        "h2_rule",
        "h6",
        "quote_border",
        "quote_text",
        "code",
        "code_background",
        "rule",
        "table_border",
        "placeholder",
        "tree_kind",
        "tree_field",
        "tree_span",
        "tree_error",
    ];

    fn slot_mut(&mut self, slot: &str) -> Option<&mut Color> {
        let color = match slot {
            "background" => &mut self.background,
            "foreground" => &mut self.foreground,
            "muted" => &mut self.muted,
            "heading" => &mut self.heading,
            "h1_rule" => &mut self.h1_rule,
            "h2_rule" => &mut self.h2_rule,
            "h6" => &mut self.h6,
            "quote_border" => &mut self.quote_border,
            "quote_text" => &mut self.quote_text,
            "code" => &mut self.code,
            "code_background" => &mut self.code_background,
            "rule" => &mut self.rule,
            "table_border" => &mut self.table_border,
            "placeholder" => &mut self.placeholder,
            "tree_kind" => &mut self.tree_kind,
            "tree_field" => &mut self.tree_field,
            "tree_span" => &mut self.tree_span,
            "tree_error" => &mut self.tree_error,
            _ => return None,
        };
        Some(color)
    }

    /// Override one slot; returns false for an unknown slot
    pub fn set_color(&mut self, slot: &str, color: Color) -> bool {
        match self.slot_mut(slot) {
            Some(target) => {
                *target = color;
                true
            }
            None => false,
        }
    }

    /// Resolve a possibly translucent color against the background
    pub fn solid(&self, color: Color) -> Color {
        if color.is_opaque() {
            color
        } else {
            color.over(self.background)
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::github_dark()
    }
}
