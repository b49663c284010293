//! Tree viewer rows
//!
//! One row per visible node, in pre-order, formatted like Tree-sitter's own
//! playground: `name: identifier ; [0, 9] - [0, 14] javascript`.

use serde::Serialize;

use crate::syntax::{Language, Node, Point};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    /// Depth among the visible rows
    pub depth: usize,
    pub field: Option<String>,
    pub kind: String,
    pub start: Point,
    pub end: Point,
    pub language: Language,
    pub is_named: bool,
    pub is_error: bool,
    pub is_missing: bool,
}

impl TreeRow {
    pub fn label(&self) -> String {
        let field = self
            .field
            .as_ref()
            .map(|f| format!("{}: ", f))
            .unwrap_or_default();
        let kind = if self.is_missing {
            format!("MISSING {}", self.kind)
        } else if self.is_named {
            self.kind.clone()
        } else {
            format!("\"{}\"", self.kind)
        };
        format!(
            "{}{} ; [{}, {}] - [{}, {}] {}",
            field,
            kind,
            self.start.row,
            self.start.column,
            self.end.row,
            self.end.column,
            self.language.grammar_name().unwrap_or("text"),
        )
    }

    pub fn is_problem(&self) -> bool {
        self.is_error || self.is_missing
    }
}

/// Rows for `root`; anonymous nodes are only listed when `show_anonymous` is set
pub fn tree_rows(root: &Node, show_anonymous: bool) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let mut pending = vec![(root, 0)];
    while let Some((node, depth)) = pending.pop() {
        // Missing tokens are anonymous but worth seeing
        if !node.is_named && !node.is_missing && !show_anonymous {
            continue;
        }
        rows.push(TreeRow {
            depth,
            field: node.field_name.clone(),
            kind: node.kind.clone(),
            start: node.span.start,
            end: node.span.end,
            language: node.language,
            is_named: node.is_named,
            is_error: node.is_error,
            is_missing: node.is_missing,
        });
        pending.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    rows
}

/// Rows as indented text, two spaces per level
pub fn format_tree(root: &Node, show_anonymous: bool) -> String {
    tree_rows(root, show_anonymous)
        .iter()
        .map(|row| format!("{}{}", "  ".repeat(row.depth), row.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_to_node;
    use crate::syntax::testing::{self, node};

    #[test]
    fn json_rows() {
        let root = parse_to_node(&testing::registry(), Language::Json, "[1, null]").unwrap();
        insta::assert_snapshot!(format_tree(&root, false), @r"
        document ; [0, 0] - [0, 9] json
          array ; [0, 0] - [0, 9] json
            number ; [0, 1] - [0, 2] json
            null ; [0, 4] - [0, 8] json
        ");
    }

    #[test]
    fn javascript_rows_show_fields() {
        let root = parse_to_node(
            &testing::registry(),
            Language::JavaScript,
            "function greet(a) {}",
        )
        .unwrap();
        insta::assert_snapshot!(format_tree(&root, false), @r"
        program ; [0, 0] - [0, 20] javascript
          function_declaration ; [0, 0] - [0, 20] javascript
            name: identifier ; [0, 9] - [0, 14] javascript
            parameters: formal_parameters ; [0, 14] - [0, 17] javascript
              identifier ; [0, 15] - [0, 16] javascript
            body: statement_block ; [0, 18] - [0, 20] javascript
        ");
    }

    #[test]
    fn anonymous_rows_are_quoted() {
        let root = parse_to_node(&testing::registry(), Language::Json, "[1]").unwrap();
        let rows = tree_rows(&root, true);
        let labels: Vec<String> = rows.iter().map(TreeRow::label).collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[2], "\"[\" ; [0, 0] - [0, 1] json");
        assert_eq!(rows[3].kind, "number");
        assert_eq!(rows[3].depth, 2);
    }

    #[test]
    fn missing_tokens_are_always_listed() {
        let root = parse_to_node(&testing::registry(), Language::Json, "[1").unwrap();
        let rows = tree_rows(&root, false);
        assert!(rows.iter().any(|row| row.is_problem()));
    }

    #[test]
    fn deep_tree_lists_every_level() {
        let mut root = node("leaf", "", vec![]);
        for _ in 0..100_000 {
            root = node("wrap", "", vec![root]);
        }
        let rows = tree_rows(&root, false);
        assert_eq!(rows.len(), 100_001);
        assert_eq!(rows.last().map(|row| row.depth), Some(100_000));
        assert_eq!(rows.last().map(|row| row.kind.as_str()), Some("leaf"));
    }
}
