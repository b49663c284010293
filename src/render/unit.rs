//! Render tree
//!
//! The output of projection. Render units carry text and styling hints only;
//! turning them into pixels or terminal cells is the presenter's job.

use indexmap::IndexMap;
use serde::Serialize;

use crate::theme::Color;

/// Default body text size, in points
pub const BODY_SIZE: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStyle {
    pub size: u16,
    pub bold: bool,
    pub italic: bool,
    pub wrap: bool,
    pub color: Option<Color>,
}

impl TextStyle {
    pub const fn body() -> Self {
        Self {
            size: BODY_SIZE,
            bold: false,
            italic: false,
            wrap: true,
            color: None,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub const fn sized(mut self, size: u16) -> Self {
        self.size = size;
        self
    }

    pub const fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub const fn nowrap(mut self) -> Self {
        self.wrap = false;
        self
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::body()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub text: String,
    pub style: TextStyle,
}

/// Horizontal rule drawn under a heading or for a thematic break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleStyle {
    pub thickness: u8,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderUnit {
    /// Vertical sequence
    Column { children: Vec<RenderUnit> },
    /// Horizontal sequence
    Row { children: Vec<RenderUnit> },
    Text(TextBlock),
    Heading {
        level: u8,
        text: String,
        style: TextStyle,
        rule: Option<RuleStyle>,
    },
    Quote {
        border: Option<Color>,
        body: Box<RenderUnit>,
    },
    /// Rows are keyed by column name; a missing key means no cell
    Table {
        columns: Vec<String>,
        rows: Vec<IndexMap<String, String>>,
    },
    Code {
        language: Option<String>,
        text: String,
    },
    Rule(RuleStyle),
    Placeholder { node_type: String, message: String },
    Empty,
}

impl RenderUnit {
    pub fn text(text: impl Into<String>) -> Self {
        Self::styled(text, TextStyle::body())
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        RenderUnit::Text(TextBlock {
            text: text.into(),
            style,
        })
    }

    pub fn column(children: Vec<RenderUnit>) -> Self {
        RenderUnit::Column { children }
    }

    pub fn row(children: Vec<RenderUnit>) -> Self {
        RenderUnit::Row { children }
    }

    pub fn placeholder(node_type: impl Into<String>, message: impl Into<String>) -> Self {
        RenderUnit::Placeholder {
            node_type: node_type.into(),
            message: message.into(),
        }
    }

    /// Placeholder for a null node
    pub fn invalid(node_type: &str) -> Self {
        Self::placeholder(node_type, format!("Tree node is invalid for: {}", node_type))
    }

    /// Placeholder for a node type with no registered factory
    pub fn unknown(node_type: &str) -> Self {
        Self::placeholder(node_type, format!("Unknown Node Type: {}", node_type))
    }

    pub fn children(&self) -> &[RenderUnit] {
        match self {
            RenderUnit::Column { children } | RenderUnit::Row { children } => children,
            _ => &[],
        }
    }

    /// All text carried by this unit and its children, one entry per text-bearing unit
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_texts(self, &mut out);
        out
    }
}

fn collect_texts<'a>(unit: &'a RenderUnit, out: &mut Vec<&'a str>) {
    match unit {
        RenderUnit::Column { children } | RenderUnit::Row { children } => {
            for child in children {
                collect_texts(child, out);
            }
        }
        RenderUnit::Text(block) => out.push(&block.text),
        RenderUnit::Heading { text, .. } | RenderUnit::Code { text, .. } => out.push(text),
        RenderUnit::Quote { body, .. } => collect_texts(body, out),
        RenderUnit::Table { columns, rows } => {
            out.extend(columns.iter().map(String::as_str));
            for row in rows {
                out.extend(row.values().map(String::as_str));
            }
        }
        RenderUnit::Placeholder { message, .. } => out.push(message),
        RenderUnit::Rule(_) | RenderUnit::Empty => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_name_the_node_type() {
        assert_eq!(
            RenderUnit::unknown("pipe_table"),
            RenderUnit::Placeholder {
                node_type: "pipe_table".to_string(),
                message: "Unknown Node Type: pipe_table".to_string(),
            }
        );
        assert!(matches!(
            RenderUnit::invalid("paragraph"),
            RenderUnit::Placeholder { message, .. } if message == "Tree node is invalid for: paragraph"
        ));
    }

    #[test]
    fn texts_walks_nested_units() {
        let unit = RenderUnit::column(vec![
            RenderUnit::text("a"),
            RenderUnit::row(vec![RenderUnit::text("•"), RenderUnit::text("b")]),
            RenderUnit::Quote {
                border: None,
                body: Box::new(RenderUnit::text("c")),
            },
            RenderUnit::Rule(RuleStyle {
                thickness: 1,
                color: None,
            }),
        ]);
        assert_eq!(unit.texts(), vec!["a", "•", "b", "c"]);
        assert_eq!(unit.children().len(), 4);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(RenderUnit::Code {
            language: Some("rust".to_string()),
            text: "fn main() {}".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "code");
        assert_eq!(json["language"], "rust");

        let text = serde_json::to_value(RenderUnit::text("hi")).unwrap();
        assert_eq!(text["type"], "text");
        assert_eq!(text["text"], "hi");
        assert_eq!(text["style"]["size"], 10);
    }
}
