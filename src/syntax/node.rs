//! Owned syntax nodes
//!
//! A [`Node`] is a materialized copy of a Tree-sitter node: its metadata,
//! its source slice, and all of its children. Nothing in it points back into
//! the parse tree, so it stays valid after the tree is dropped.

use std::collections::HashMap;

use serde::Serialize;

use super::fields::FieldTable;
use super::languages::Language;

/// Zero-based row/column position; columns count bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl From<tree_sitter::Point> for Point {
    fn from(point: tree_sitter::Point) -> Self {
        Self::new(point.row, point.column)
    }
}

impl From<Point> for tree_sitter::Point {
    fn from(point: Point) -> Self {
        tree_sitter::Point::new(point.row, point.column)
    }
}

/// Byte range `[start_byte, end_byte)` with matching points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<tree_sitter::Range> for Span {
    fn from(range: tree_sitter::Range) -> Self {
        Self {
            start_byte: range.start_byte,
            end_byte: range.end_byte,
            start: range.start_point.into(),
            end: range.end_point.into(),
        }
    }
}

impl From<Span> for tree_sitter::Range {
    fn from(span: Span) -> Self {
        tree_sitter::Range {
            start_byte: span.start_byte,
            end_byte: span.end_byte,
            start_point: span.start.into(),
            end_point: span.end.into(),
        }
    }
}

/// Whole-tree operations (clone, equality, drop) walk with an explicit stack,
/// so nesting depth is bounded by memory rather than by the thread's stack.
#[derive(Debug, Serialize)]
pub struct Node {
    pub language: Language,
    /// Type tag, e.g. `atx_heading`
    pub kind: String,
    /// Type tag before aliasing
    pub grammar_kind: String,
    pub symbol: u16,
    pub grammar_symbol: u16,
    pub span: Span,
    pub is_null: bool,
    pub is_named: bool,
    pub is_missing: bool,
    pub has_error: bool,
    pub is_error: bool,
    pub is_extra: bool,
    pub has_changes: bool,
    /// Role this node plays in its parent, if the grammar declares one
    pub field_name: Option<String>,
    pub depth: u32,
    /// Copy of `source[span.start_byte..span.end_byte]`
    pub text: String,
    /// Every child, named or anonymous, in document order
    pub children: Vec<Node>,
}

impl Node {
    /// Materialize `raw` and its whole subtree
    pub fn materialize(
        raw: tree_sitter::Node<'_>,
        source: &str,
        language: Language,
        fields: &FieldTable,
    ) -> Self {
        build(raw, source, language, fields)
    }

    /// Placeholder for a node that could not be read
    pub fn null(kind: impl Into<String>, language: Language) -> Self {
        let kind = kind.into();
        Self {
            language,
            grammar_kind: kind.clone(),
            kind,
            symbol: 0,
            grammar_symbol: 0,
            span: Span::default(),
            is_null: true,
            is_named: false,
            is_missing: false,
            has_error: false,
            is_error: false,
            is_extra: false,
            has_changes: false,
            field_name: None,
            depth: 0,
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn start_byte(&self) -> usize {
        self.span.start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.span.end_byte
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Children visible to viewers: named nodes only
    pub fn named_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|child| child.is_named)
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, index: usize) -> Option<&Node> {
        self.named_children().nth(index)
    }

    pub fn child_by_field(&self, field: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|child| child.field_name.as_deref() == Some(field))
    }

    pub fn first_named_child_of_kind(&self, kind: &str) -> Option<&Node> {
        self.named_children().find(|child| child.kind == kind)
    }

    /// This node and every descendant, pre-order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First node of `kind` in pre-order, starting with this one
    pub fn find(&self, kind: &str) -> Option<&Node> {
        self.descendants().find(|node| node.kind == kind)
    }

    /// S-expression of the named structure, with field labels
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(self, &mut out);
        out
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A node whose children are still being materialized
struct Frame<'t, 'f> {
    raw: tree_sitter::Node<'t>,
    field_name: Option<String>,
    depth: u32,
    child_fields: HashMap<usize, &'f str>,
    children: Vec<Node>,
}

impl<'t, 'f> Frame<'t, 'f> {
    fn open(
        raw: tree_sitter::Node<'t>,
        field_name: Option<String>,
        depth: u32,
        fields: &'f FieldTable,
    ) -> Self {
        let child_fields = if raw.child_count() > 0 {
            fields.child_fields(raw)
        } else {
            HashMap::new()
        };
        Self {
            raw,
            field_name,
            depth,
            child_fields,
            children: Vec::with_capacity(raw.child_count()),
        }
    }

    fn field_of(&self, child: tree_sitter::Node<'_>) -> Option<String> {
        self.child_fields.get(&child.id()).map(|name| name.to_string())
    }

    fn finish(self, source: &str, language: Language) -> Node {
        let raw = self.raw;
        let span = Span::from(raw.range());
        Node {
            language,
            kind: raw.kind().to_string(),
            grammar_kind: raw.grammar_name().to_string(),
            symbol: raw.kind_id(),
            grammar_symbol: raw.grammar_id(),
            span,
            is_null: false,
            is_named: raw.is_named(),
            is_missing: raw.is_missing(),
            has_error: raw.has_error(),
            is_error: raw.is_error(),
            is_extra: raw.is_extra(),
            has_changes: raw.has_changes(),
            field_name: self.field_name,
            depth: self.depth,
            text: slice(source, span.start_byte, span.end_byte),
            children: self.children,
        }
    }
}

/// Pre-order walk with one cursor; a node is finished once its last child is
fn build(
    root: tree_sitter::Node<'_>,
    source: &str,
    language: Language,
    fields: &FieldTable,
) -> Node {
    let mut cursor = root.walk();
    // The root has no parent, so no field name
    let mut current = Frame::open(root, None, 0, fields);
    let mut ancestors: Vec<Frame> = Vec::new();

    loop {
        if cursor.goto_first_child() {
            let child = cursor.node();
            let next = Frame::open(child, current.field_of(child), current.depth + 1, fields);
            ancestors.push(std::mem::replace(&mut current, next));
            continue;
        }

        // Close finished nodes until one has a next sibling
        loop {
            let Some(mut parent) = ancestors.pop() else {
                return current.finish(source, language);
            };
            parent.children.push(current.finish(source, language));
            if cursor.goto_next_sibling() {
                let child = cursor.node();
                current = Frame::open(child, parent.field_of(child), parent.depth + 1, fields);
                ancestors.push(parent);
                break;
            }
            cursor.goto_parent();
            current = parent;
        }
    }
}

impl Node {
    /// Copy of every field except the children
    fn shallow_clone(&self) -> Node {
        Node {
            language: self.language,
            kind: self.kind.clone(),
            grammar_kind: self.grammar_kind.clone(),
            symbol: self.symbol,
            grammar_symbol: self.grammar_symbol,
            span: self.span,
            is_null: self.is_null,
            is_named: self.is_named,
            is_missing: self.is_missing,
            has_error: self.has_error,
            is_error: self.is_error,
            is_extra: self.is_extra,
            has_changes: self.has_changes,
            field_name: self.field_name.clone(),
            depth: self.depth,
            text: self.text.clone(),
            children: Vec::with_capacity(self.children.len()),
        }
    }

    fn same_fields(&self, other: &Node) -> bool {
        self.language == other.language
            && self.kind == other.kind
            && self.grammar_kind == other.grammar_kind
            && self.symbol == other.symbol
            && self.grammar_symbol == other.grammar_symbol
            && self.span == other.span
            && self.is_null == other.is_null
            && self.is_named == other.is_named
            && self.is_missing == other.is_missing
            && self.has_error == other.has_error
            && self.is_error == other.is_error
            && self.is_extra == other.is_extra
            && self.has_changes == other.has_changes
            && self.field_name == other.field_name
            && self.depth == other.depth
            && self.text == other.text
            && self.children.len() == other.children.len()
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        let mut current = (self, self.shallow_clone());
        let mut ancestors: Vec<(&Node, Node)> = Vec::new();
        loop {
            let original: &Node = current.0;
            if let Some(child) = original.children.get(current.1.children.len()) {
                ancestors.push(std::mem::replace(&mut current, (child, child.shallow_clone())));
                continue;
            }
            match ancestors.pop() {
                Some(mut parent) => {
                    parent.1.children.push(current.1);
                    current = parent;
                }
                None => return current.1,
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.same_fields(b) {
                return false;
            }
            pending.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Eq for Node {}

impl Drop for Node {
    fn drop(&mut self) {
        // Detach descendants so each one drops with no children of its own
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Copy a byte range out of `source`, clamped to its length
pub fn slice(source: &str, start: usize, end: usize) -> String {
    let end = end.min(source.len());
    let start = start.min(end);
    match source.get(start..end) {
        Some(text) => text.to_string(),
        None => String::from_utf8_lossy(&source.as_bytes()[start..end]).into_owned(),
    }
}

fn write_sexp(root: &Node, out: &mut String) {
    enum Step<'a> {
        /// Node, and whether it follows a sibling or its parent's type
        Open(&'a Node, bool),
        Close,
    }

    let mut steps = vec![Step::Open(root, false)];
    while let Some(step) = steps.pop() {
        let node = match step {
            Step::Close => {
                out.push(')');
                continue;
            }
            Step::Open(node, spaced) => {
                if spaced {
                    out.push(' ');
                }
                node
            }
        };
        if let Some(field) = &node.field_name {
            out.push_str(field);
            out.push_str(": ");
        }
        out.push('(');
        out.push_str(&node.kind);
        steps.push(Step::Close);
        let children: Vec<&Node> = node.named_children().collect();
        steps.extend(children.into_iter().rev().map(|child| Step::Open(child, true)));
    }
}
