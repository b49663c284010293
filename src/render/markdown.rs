//! Markdown node helpers and the Markdown widget set
//!
//! The helpers read structure out of tree-sitter-md block nodes. The widget
//! set registers themed factories for the node types the viewer styles
//! specially.

use indexmap::IndexMap;

use super::unit::{RenderUnit, RuleStyle, TextStyle};
use super::widgets::WidgetRegistry;
use crate::syntax::Node;
use crate::theme::Theme;

/// Level encoded in a marker type tag: `atx_h3_marker` => 3
pub fn marker_level(kind: &str) -> Option<u8> {
    kind.split('_').find_map(|part| {
        let digit = part.strip_prefix('h')?;
        match digit.parse::<u8>() {
            Ok(level @ 1..=6) if digit.len() == 1 => Some(level),
            _ => None,
        }
    })
}

/// Heading level from the marker child, 1 if there is none
pub fn heading_level(node: &Node) -> u8 {
    let first = node.children.first().and_then(|c| marker_level(&c.kind));
    // setext headings carry their underline last
    let underline = || {
        node.children
            .iter()
            .rev()
            .filter(|c| c.kind.ends_with("_underline"))
            .find_map(|c| marker_level(&c.kind))
    };
    first.or_else(underline).unwrap_or(1)
}

pub fn heading_text(node: &Node) -> String {
    if let Some(content) = node.child_by_field("heading_content") {
        return content.text.trim().to_string();
    }
    if let Some(paragraph) = node.first_named_child_of_kind("paragraph") {
        return paragraph.text.trim().to_string();
    }
    node.text.trim().trim_start_matches('#').trim().to_string()
}

/// Point size of a heading
pub fn heading_size(level: u8) -> u16 {
    24u16.saturating_sub(2 * level as u16)
}

pub fn paragraph_text(node: &Node) -> String {
    node.text.trim_end().to_string()
}

/// First paragraph of a block quote, or the whole quote, without `>` markers
pub fn quote_text(node: &Node) -> String {
    let text = node
        .first_named_child_of_kind("paragraph")
        .map(|p| p.text.as_str())
        .unwrap_or(node.text.as_str());
    strip_quote_markers(text)
}

fn strip_quote_markers(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix('>')
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
                .unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub columns: Vec<String>,
    /// Cells keyed by column; cells past the last column are dropped and
    /// missing cells have no key
    pub rows: Vec<IndexMap<String, String>>,
}

impl TableData {
    pub fn into_unit(self) -> RenderUnit {
        RenderUnit::Table {
            columns: self.columns,
            rows: self.rows,
        }
    }
}

pub fn extract_table(node: &Node) -> TableData {
    let mut groups = node.named_children();
    let Some(header) = groups.next() else {
        return TableData::default();
    };

    let columns: Vec<String> = header
        .named_children()
        .map(|cell| cell.text.trim().to_string())
        .collect();

    let rows = groups
        .filter(|row| row.kind != "pipe_table_delimiter_row")
        .map(|row| {
            columns
                .iter()
                .zip(row.named_children())
                .map(|(column, cell)| (column.clone(), cell.text.trim().to_string()))
                .collect()
        })
        .collect();

    TableData { columns, rows }
}

pub fn is_list_marker(kind: &str) -> bool {
    kind.starts_with("list_marker") || kind.starts_with("task_list_marker")
}

/// Bullet shown for a list item
pub fn list_bullet(item: &Node) -> String {
    let markers = item.named_children().filter(|c| is_list_marker(&c.kind));
    let mut bullet = String::from("•");
    for marker in markers {
        match marker.kind.as_str() {
            "task_list_marker_checked" => return "[x]".to_string(),
            "task_list_marker_unchecked" => return "[ ]".to_string(),
            "list_marker_dot" | "list_marker_parenthesis" => {
                bullet = marker.text.trim().to_string();
            }
            _ => {}
        }
    }
    bullet
}

/// Language and body of a fenced or indented code block
pub fn code_block(node: &Node) -> (Option<String>, String) {
    if node.kind == "indented_code_block" {
        let text = node
            .text
            .lines()
            .map(|line| line.strip_prefix("    ").or_else(|| line.strip_prefix('\t')).unwrap_or(line))
            .collect::<Vec<_>>()
            .join("\n");
        return (None, text.trim_end().to_string());
    }

    let language = node.first_named_child_of_kind("info_string").and_then(|info| {
        info.first_named_child_of_kind("language")
            .map(|l| l.text.trim().to_string())
            .or_else(|| info.text.split_whitespace().next().map(str::to_string))
    });
    let text = node
        .first_named_child_of_kind("code_fence_content")
        .map(|content| content.text.trim_end_matches(['\n', '\r']).to_string())
        .unwrap_or_default();
    (language, text)
}

/// Register the themed Markdown widgets
pub fn register_markdown_widgets(registry: &mut WidgetRegistry, theme: &Theme) {
    let foreground = theme.foreground;
    registry.register("paragraph", move |node, _| {
        RenderUnit::styled(paragraph_text(node), TextStyle::body().colored(foreground))
    });

    let theme_for_heading = theme.clone();
    registry.register("atx_heading", move |node, _| {
        themed_heading(node, &theme_for_heading)
    });

    let (border, text_color) = (theme.quote_border, theme.quote_text);
    registry.register("block_quote", move |node, _| RenderUnit::Quote {
        border: Some(border),
        body: Box::new(RenderUnit::styled(
            quote_text(node),
            TextStyle::body().colored(text_color),
        )),
    });

    registry.register("pipe_table", |node, _| extract_table(node).into_unit());
}

fn themed_heading(node: &Node, theme: &Theme) -> RenderUnit {
    let level = heading_level(node);
    let (size, rule) = match level {
        1 => (
            24,
            Some(RuleStyle {
                thickness: 4,
                color: Some(theme.h1_rule),
            }),
        ),
        2 => (
            18,
            Some(RuleStyle {
                thickness: 2,
                color: Some(theme.h2_rule),
            }),
        ),
        _ => (heading_size(level), None),
    };
    let color = if level == 6 { theme.h6 } else { theme.heading };
    RenderUnit::Heading {
        level,
        text: heading_text(node),
        style: TextStyle::body().sized(size).bold().colored(color),
        rule,
    }
}
