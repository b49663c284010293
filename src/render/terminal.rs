//! Terminal presentation
//!
//! Lays a render tree out into styled lines of a fixed width, then prints
//! them with crossterm. Layout is pure so it can be tested without a terminal.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::tree_view::TreeRow;
use super::unit::{RenderUnit, RuleStyle, TextStyle};
use crate::theme::{Color, Theme};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
}

impl SpanStyle {
    pub fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }

    fn from_text(style: &TextStyle) -> Self {
        Self {
            fg: style.color,
            bg: None,
            bold: style.bold,
            italic: style.italic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub segments: Vec<Segment>,
}

impl StyledLine {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        let mut line = Self::default();
        line.push(text, style);
        line
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, style: SpanStyle) {
        let text = text.into();
        if !text.is_empty() {
            self.segments.push(Segment { text, style });
        }
    }

    /// Prepend a segment, e.g. a bullet or quote bar
    fn prefixed(mut self, text: &str, style: SpanStyle) -> Self {
        if !text.is_empty() {
            self.segments.insert(
                0,
                Segment {
                    text: text.to_string(),
                    style,
                },
            );
        }
        self
    }

    pub fn plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Terminal cells the line occupies
    pub fn width(&self) -> usize {
        self.segments.iter().map(|s| s.text.width()).sum()
    }

    /// Cut the line to at most `width` cells
    pub fn truncate(&mut self, width: usize) {
        let mut remaining = width;
        self.segments.retain_mut(|segment| {
            if remaining == 0 {
                return false;
            }
            let cells = segment.text.width();
            if cells > remaining {
                let (head, _) = split_at_width(&segment.text, remaining);
                segment.text = head.to_string();
            }
            remaining = remaining.saturating_sub(cells);
            !segment.text.is_empty()
        });
    }
}

/// Longest prefix of `text` that fits in `width` cells, and the remainder
fn split_at_width(text: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (i, ch) in text.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > width {
            return text.split_at(i);
        }
    }
    (text, "")
}

/// `text` cut or space-padded to exactly `width` cells
pub fn fit_to_width(text: &str, width: usize) -> String {
    let (head, _) = split_at_width(text, width);
    let fill = width.saturating_sub(head.width());
    format!("{}{}", head, " ".repeat(fill))
}

/// Lay out `unit` into lines no wider than `width` where wrapping applies
pub fn layout(unit: &RenderUnit, width: usize, theme: &Theme) -> Vec<StyledLine> {
    let mut lines = Vec::new();
    match unit {
        // Top-level blocks are separated by a blank line
        RenderUnit::Column { children } => {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    lines.push(StyledLine::blank());
                }
                lines.extend(layout_unit(child, width, theme));
            }
        }
        other => lines.extend(layout_unit(other, width, theme)),
    }
    lines
}

fn layout_unit(unit: &RenderUnit, width: usize, theme: &Theme) -> Vec<StyledLine> {
    let width = width.max(1);
    match unit {
        RenderUnit::Column { children } => children
            .iter()
            .flat_map(|child| layout_unit(child, width, theme))
            .collect(),
        RenderUnit::Row { children } => layout_row(children, width, theme),
        RenderUnit::Text(block) => {
            let style = SpanStyle::from_text(&block.style);
            text_lines(&block.text, block.style.wrap, width)
                .into_iter()
                .map(|line| StyledLine::new(line, style))
                .collect()
        }
        RenderUnit::Heading {
            level,
            text,
            style,
            rule,
        } => {
            let mut span = SpanStyle::from_text(style);
            span.fg = Some(theme.solid(style.color.unwrap_or(theme.heading)));
            let prefix = format!("{} ", "#".repeat(*level as usize));
            let mut lines: Vec<StyledLine> = text_lines(text, true, width.saturating_sub(prefix.width()))
                .into_iter()
                .map(|line| StyledLine::new(line, span).prefixed(&prefix, SpanStyle::fg(theme.muted)))
                .collect();
            if let Some(rule) = rule {
                lines.push(rule_line(rule, width, theme));
            }
            lines
        }
        RenderUnit::Quote { border, body } => {
            let bar = SpanStyle::fg(theme.solid(border.unwrap_or(theme.quote_border)));
            layout_unit(body, width.saturating_sub(2), theme)
                .into_iter()
                .map(|line| line.prefixed("│ ", bar))
                .collect()
        }
        RenderUnit::Table { columns, rows } => layout_table(columns, rows, theme),
        RenderUnit::Code { language, text } => {
            let mut lines = Vec::new();
            if let Some(language) = language {
                lines.push(StyledLine::new(
                    format!("[{}]", language),
                    SpanStyle::fg(theme.muted),
                ));
            }
            let style = SpanStyle {
                fg: Some(theme.code),
                bg: Some(theme.code_background),
                ..SpanStyle::default()
            };
            lines.extend(text.lines().map(|line| StyledLine::new(format!("  {}", line), style)));
            lines
        }
        RenderUnit::Rule(rule) => vec![rule_line(rule, width, theme)],
        RenderUnit::Placeholder { message, .. } => vec![StyledLine::new(
            message.clone(),
            SpanStyle {
                fg: Some(theme.placeholder),
                italic: true,
                ..SpanStyle::default()
            },
        )],
        RenderUnit::Empty => Vec::new(),
    }
}

/// First child is a gutter (bullet); the rest are laid out beside it
fn layout_row(children: &[RenderUnit], width: usize, theme: &Theme) -> Vec<StyledLine> {
    let Some((gutter, rest)) = children.split_first() else {
        return Vec::new();
    };
    let gutter_lines = layout_unit(gutter, width, theme);
    let gutter_text = gutter_lines.first().map(StyledLine::plain).unwrap_or_default();
    let gutter_style = gutter_lines
        .first()
        .and_then(|l| l.segments.first())
        .map(|s| s.style)
        .unwrap_or_default();
    let indent = gutter_text.width() + 1;

    let body: Vec<StyledLine> = rest
        .iter()
        .flat_map(|child| layout_unit(child, width.saturating_sub(indent), theme))
        .collect();
    if body.is_empty() {
        return vec![StyledLine::new(gutter_text, gutter_style)];
    }

    body.into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.prefixed(" ", SpanStyle::default())
                    .prefixed(&gutter_text, gutter_style)
            } else {
                line.prefixed(&" ".repeat(indent), SpanStyle::default())
            }
        })
        .collect()
}

fn layout_table(
    columns: &[String],
    rows: &[indexmap::IndexMap<String, String>],
    theme: &Theme,
) -> Vec<StyledLine> {
    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.width())
                .chain(std::iter::once(column.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let border = SpanStyle::fg(theme.solid(theme.table_border));

    let render_row = |cells: Vec<&str>, style: SpanStyle| {
        let mut line = StyledLine::default();
        for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
            if i > 0 {
                line.push(" │ ", border);
            }
            if i + 1 == widths.len() {
                line.push(*cell, style);
            } else {
                let fill = width.saturating_sub(cell.width());
                line.push(format!("{}{}", cell, " ".repeat(fill)), style);
            }
        }
        line
    };

    let mut lines = vec![render_row(
        columns.iter().map(String::as_str).collect(),
        SpanStyle {
            bold: true,
            ..SpanStyle::default()
        },
    )];
    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    lines.push(StyledLine::new(separator, border));
    for row in rows {
        let cells = columns
            .iter()
            .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
            .collect();
        lines.push(render_row(cells, SpanStyle::default()));
    }
    lines
}

fn rule_line(rule: &RuleStyle, width: usize, theme: &Theme) -> StyledLine {
    let glyph = if rule.thickness >= 3 { "━" } else { "─" };
    let color = theme.solid(rule.color.unwrap_or(theme.rule));
    StyledLine::new(glyph.repeat(width), SpanStyle::fg(color))
}

/// Split text into display lines, word-wrapping to `width` when `wrap` is set
pub fn text_lines(text: &str, wrap: bool, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for line in text.lines() {
        if !wrap || line.width() <= width {
            out.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            let mut word = word.to_string();
            // Hard-break words that can never fit
            while word.width() > width {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                let (mut head, _) = split_at_width(&word, width);
                if head.is_empty() {
                    // A double-width char in a one-cell column still has to go somewhere
                    head = word.chars().next().map_or("", |ch| &word[..ch.len_utf8()]);
                }
                let rest = word[head.len()..].to_string();
                out.push(head.to_string());
                word = rest;
            }
            let needed = current.width() + usize::from(!current.is_empty()) + word.width();
            if needed > width && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

/// Queue styled lines at the cursor, one per terminal line
pub fn print_lines(out: &mut impl Write, lines: &[StyledLine], theme: &Theme) -> io::Result<()> {
    for line in lines {
        queue_line(out, line, theme)?;
        queue!(out, Print("\r\n"))?;
    }
    out.flush()
}

/// Queue one line without a trailing newline
pub fn queue_line(out: &mut impl Write, line: &StyledLine, theme: &Theme) -> io::Result<()> {
    for segment in &line.segments {
        let style = segment.style;
        if let Some(fg) = style.fg {
            queue!(out, SetForegroundColor(theme.solid(fg).to_crossterm()))?;
        }
        if let Some(bg) = style.bg {
            queue!(out, SetBackgroundColor(theme.solid(bg).to_crossterm()))?;
        }
        if style.bold {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if style.italic {
            queue!(out, SetAttribute(Attribute::Italic))?;
        }
        queue!(out, Print(&segment.text))?;
        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
    }
    Ok(())
}

/// Tree viewer rows as styled lines
pub fn tree_lines(rows: &[TreeRow], theme: &Theme) -> Vec<StyledLine> {
    rows.iter()
        .map(|row| {
            let mut line = StyledLine::new("  ".repeat(row.depth), SpanStyle::default());
            if let Some(field) = &row.field {
                line.push(format!("{}: ", field), SpanStyle::fg(theme.tree_field));
            }
            let kind_color = if row.is_problem() {
                theme.tree_error
            } else {
                theme.tree_kind
            };
            let label = row.label();
            let rest = match &row.field {
                Some(field) => &label[field.len() + 2..],
                None => label.as_str(),
            };
            let (kind, span) = rest.split_once(" ; ").unwrap_or((rest, ""));
            line.push(kind, SpanStyle::fg(kind_color));
            line.push(format!(" ; {}", span), SpanStyle::fg(theme.tree_span));
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markdown::register_markdown_widgets;
    use crate::render::tree_view::tree_rows;
    use crate::render::{WidgetRegistry, project};
    use crate::syntax::testing;
    use crate::syntax::{Language, parse_to_node};

    fn plain(lines: &[StyledLine]) -> String {
        lines
            .iter()
            .map(StyledLine::plain)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_markdown(source: &str, widgets: &WidgetRegistry, width: usize) -> String {
        let root = parse_to_node(&testing::registry(), Language::Markdown, source).unwrap();
        let unit = project(&root, source, widgets);
        plain(&layout(&unit, width, &Theme::default()))
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            text_lines("the quick brown fox jumps", true, 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(text_lines("abcdefghij", true, 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(text_lines("no wrap here", false, 4), vec!["no wrap here"]);
        assert!(text_lines("", true, 10).is_empty());
    }

    #[test]
    fn heading_and_paragraph() {
        let out = render_markdown("# Hello\nWorld", &WidgetRegistry::new(), 20);
        insta::assert_snapshot!(out, @r"
        # Hello

        World
        ");
    }

    #[test]
    fn themed_document() {
        let mut widgets = WidgetRegistry::new();
        register_markdown_widgets(&mut widgets, &Theme::default());
        let source = "# Title\n\n> quoted text\n\n- one\n- two\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        let out = render_markdown(source, &widgets, 16);
        insta::assert_snapshot!(out, @r"
        # Title
        ━━━━━━━━━━━━━━━━

        │ quoted text

        • one
        • two

        a │ b
        ──┼──
        1 │ 2
        ");
    }

    #[test]
    fn missing_table_cells_render_blank() {
        let mut row = indexmap::IndexMap::new();
        row.insert("name".to_string(), "Bob".to_string());
        let unit = RenderUnit::Table {
            columns: vec!["name".to_string(), "age".to_string()],
            rows: vec![row],
        };
        let lines = layout(&unit, 40, &Theme::default());
        assert_eq!(lines[0].plain(), "name │ age");
        assert_eq!(lines[2].plain(), "Bob  │ ");
    }

    #[test]
    fn tree_lines_match_labels() {
        let root = parse_to_node(
            &testing::registry(),
            Language::JavaScript,
            "let x = 1;",
        )
        .unwrap();
        let rows = tree_rows(&root, false);
        let lines = tree_lines(&rows, &Theme::default());
        for (row, line) in rows.iter().zip(&lines) {
            assert_eq!(line.plain(), format!("{}{}", "  ".repeat(row.depth), row.label()));
        }
    }

    #[test]
    fn print_lines_emits_text() {
        let mut buffer = Vec::new();
        let lines = vec![StyledLine::new("hello", SpanStyle::fg(Color::WHITE))];
        print_lines(&mut buffer, &lines, &Theme::default()).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        assert!(written.contains("hello"));
        assert!(written.ends_with("\r\n"));
    }

    #[test]
    fn truncate_cuts_across_segments() {
        let mut line = StyledLine::new("ab", SpanStyle::default());
        line.push("cdef", SpanStyle::fg(Color::WHITE));
        line.push("gh", SpanStyle::default());
        line.truncate(4);
        assert_eq!(line.plain(), "abcd");
        assert_eq!(line.segments.len(), 2);
    }

    #[test]
    fn wide_chars_wrap_by_cells() {
        assert_eq!(text_lines("日本語 テキスト", true, 6), vec!["日本語", "テキス", "ト"]);
        assert_eq!(text_lines("🎉🎉🎉", true, 4), vec!["🎉🎉", "🎉"]);
        assert_eq!(text_lines("語", true, 1), vec!["語"]);
        for line in text_lines("naïve café 日本 🎉 party", true, 7) {
            assert!(line.width() <= 7, "{:?} is too wide", line);
        }
    }

    #[test]
    fn wide_table_cells_stay_aligned() {
        let mut first = indexmap::IndexMap::new();
        first.insert("名前".to_string(), "ab".to_string());
        first.insert("emoji".to_string(), "🎉".to_string());
        let mut second = indexmap::IndexMap::new();
        second.insert("名前".to_string(), "東京都".to_string());
        second.insert("emoji".to_string(), "ok".to_string());
        let unit = RenderUnit::Table {
            columns: vec!["名前".to_string(), "emoji".to_string()],
            rows: vec![first, second],
        };
        let lines = layout(&unit, 40, &Theme::default());
        insta::assert_snapshot!(plain(&lines), @r"
        名前   │ emoji
        ───────┼──────
        ab     │ 🎉
        東京都 │ ok
        ");
        let bar = |line: &StyledLine| line.plain().split('│').next().map(|s| s.width());
        assert_eq!(bar(&lines[0]), bar(&lines[2]));
        assert_eq!(bar(&lines[0]), bar(&lines[3]));
    }

    #[test]
    fn truncate_counts_cells() {
        let mut line = StyledLine::new("日本", SpanStyle::default());
        line.push("語", SpanStyle::default());
        line.truncate(3);
        assert_eq!(line.plain(), "日");
        assert_eq!(line.width(), 2);
        assert_eq!(fit_to_width("日本", 3), "日 ");
        assert_eq!(fit_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn nested_list_has_no_blank_continuation() {
        let out = render_markdown("- outer\n  - inner\n", &WidgetRegistry::new(), 20);
        insta::assert_snapshot!(out, @r"
        • outer
          • inner
        ");
    }
}
