//! Projection of node trees into render trees
//!
//! Dispatch for each node, first match wins:
//! 1. an "invalid" placeholder for null nodes
//! 2. a factory registered for the node's type tag
//! 3. splicing for transparent containers (`document`, `section`)
//! 4. a built-in rule for a known Markdown block type
//! 5. a generic container over the node's named children

use tracing::{debug, trace};

use super::markdown::{self, is_list_marker};
use super::unit::{RenderUnit, RuleStyle, TextStyle};
use super::widgets::WidgetRegistry;
use crate::syntax::Node;

/// Node types with a built-in projection rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Containers whose children are spliced into the parent's sequence
    Document,
    Section,
    AtxHeading,
    SetextHeading,
    Paragraph,
    BlockQuote,
    PipeTable,
    List,
    ListItem,
    FencedCodeBlock,
    IndentedCodeBlock,
    ThematicBreak,
    Other,
}

impl NodeKind {
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "document" => NodeKind::Document,
            "section" => NodeKind::Section,
            "atx_heading" => NodeKind::AtxHeading,
            "setext_heading" => NodeKind::SetextHeading,
            "paragraph" => NodeKind::Paragraph,
            "block_quote" => NodeKind::BlockQuote,
            "pipe_table" => NodeKind::PipeTable,
            "list" => NodeKind::List,
            "list_item" => NodeKind::ListItem,
            "fenced_code_block" => NodeKind::FencedCodeBlock,
            "indented_code_block" => NodeKind::IndentedCodeBlock,
            "thematic_break" => NodeKind::ThematicBreak,
            _ => NodeKind::Other,
        }
    }

    pub fn is_transparent(self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Section)
    }
}

/// Render trees stop here; deeper subtrees become a placeholder
pub const MAX_PROJECTION_DEPTH: usize = 256;

pub struct Projector<'a> {
    widgets: &'a WidgetRegistry,
}

impl<'a> Projector<'a> {
    pub fn new(widgets: &'a WidgetRegistry) -> Self {
        Self { widgets }
    }

    /// Project `node` and its subtree
    pub fn project(&self, node: &Node, source: &str) -> RenderUnit {
        self.project_at(node, source, 0)
    }

    fn project_at(&self, node: &Node, source: &str, depth: usize) -> RenderUnit {
        if node.is_null {
            return RenderUnit::invalid(&node.kind);
        }
        if depth >= MAX_PROJECTION_DEPTH {
            debug!(target: "render", node_type = %node.kind, "projection depth limit reached");
            return RenderUnit::placeholder(
                &node.kind,
                format!("Nested deeper than {} levels", MAX_PROJECTION_DEPTH),
            );
        }
        if self.widgets.contains(&node.kind) {
            trace!(target: "render", node_type = %node.kind, "custom widget");
            return self.widgets.create(&node.kind, node, source);
        }

        let kind = NodeKind::from_kind(&node.kind);
        if kind.is_transparent() {
            return RenderUnit::column(self.project_children(node, source, depth));
        }
        self.project_builtin(kind, node, source, depth)
            .unwrap_or_else(|| self.project_generic(node, source, depth))
    }

    fn project_builtin(
        &self,
        kind: NodeKind,
        node: &Node,
        source: &str,
        depth: usize,
    ) -> Option<RenderUnit> {
        let unit = match kind {
            NodeKind::AtxHeading | NodeKind::SetextHeading => {
                let level = markdown::heading_level(node);
                RenderUnit::Heading {
                    level,
                    text: markdown::heading_text(node),
                    style: TextStyle::body().sized(markdown::heading_size(level)).bold(),
                    rule: None,
                }
            }
            NodeKind::Paragraph => RenderUnit::text(markdown::paragraph_text(node)),
            NodeKind::BlockQuote => RenderUnit::Quote {
                border: None,
                body: Box::new(RenderUnit::text(markdown::quote_text(node))),
            },
            NodeKind::PipeTable => markdown::extract_table(node).into_unit(),
            NodeKind::List => RenderUnit::column(
                node.named_children()
                    .map(|item| self.project_at(item, source, depth + 1))
                    .collect(),
            ),
            NodeKind::ListItem => self.project_list_item(node, source, depth),
            NodeKind::FencedCodeBlock | NodeKind::IndentedCodeBlock => {
                let (language, text) = markdown::code_block(node);
                RenderUnit::Code { language, text }
            }
            NodeKind::ThematicBreak => RenderUnit::Rule(RuleStyle {
                thickness: 1,
                color: None,
            }),
            NodeKind::Document | NodeKind::Section | NodeKind::Other => return None,
        };
        Some(unit)
    }

    fn project_list_item(&self, node: &Node, source: &str, depth: usize) -> RenderUnit {
        let body: Vec<RenderUnit> = node
            .named_children()
            .filter(|child| !is_list_marker(&child.kind) && child.kind != "block_continuation")
            .map(|child| self.project_at(child, source, depth + 1))
            .collect();
        let body = match body.len() {
            0 => RenderUnit::Empty,
            1 => body.into_iter().next().unwrap_or(RenderUnit::Empty),
            _ => RenderUnit::column(body),
        };
        RenderUnit::row(vec![
            RenderUnit::styled(markdown::list_bullet(node), TextStyle::body().nowrap()),
            body,
        ])
    }

    /// Leaves render their text; anything else is a column of its named children
    fn project_generic(&self, node: &Node, source: &str, depth: usize) -> RenderUnit {
        if node.named_child_count() == 0 {
            return RenderUnit::text(node.text.clone());
        }
        RenderUnit::column(self.project_children(node, source, depth))
    }

    /// Named children, with transparent containers spliced in place
    fn project_children(&self, node: &Node, source: &str, depth: usize) -> Vec<RenderUnit> {
        let mut out = Vec::new();
        let mut pending: Vec<&Node> = node.named_children().collect();
        pending.reverse();
        while let Some(child) = pending.pop() {
            let transparent = !child.is_null
                && !self.widgets.contains(&child.kind)
                && NodeKind::from_kind(&child.kind).is_transparent();
            if transparent {
                let start = pending.len();
                pending.extend(child.named_children());
                pending[start..].reverse();
            } else {
                out.push(self.project_at(child, source, depth + 1));
            }
        }
        out
    }
}

/// Project with `widgets` consulted first
pub fn project(node: &Node, source: &str, widgets: &WidgetRegistry) -> RenderUnit {
    Projector::new(widgets).project(node, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markdown::register_markdown_widgets;
    use crate::syntax::testing::{self, node};
    use crate::syntax::{Language, Node, parse_to_node};
    use crate::theme::Theme;

    fn markdown(source: &str) -> Node {
        parse_to_node(&testing::registry(), Language::Markdown, source).unwrap()
    }

    #[test]
    fn heading_then_paragraph() {
        let source = "# Hello\nWorld";
        let unit = project(&markdown(source), source, &WidgetRegistry::new());

        let children = unit.children();
        assert_eq!(children.len(), 2);
        let RenderUnit::Heading { level, text, style, .. } = &children[0] else {
            panic!("expected heading, got {:?}", children[0]);
        };
        assert_eq!((*level, text.as_str()), (1, "Hello"));
        assert!(style.bold);
        assert!(style.size > TextStyle::body().size);

        let RenderUnit::Text(block) = &children[1] else {
            panic!("expected text, got {:?}", children[1]);
        };
        assert_eq!(block.text, "World");
        assert!(block.style.wrap);
    }

    #[test]
    fn custom_factory_takes_precedence() {
        let source = "# Hello\nWorld";
        let mut widgets = WidgetRegistry::new();
        widgets.register("atx_heading", |node: &Node, _: &str| {
            RenderUnit::text(format!("custom {}", node.kind))
        });
        let unit = project(&markdown(source), source, &widgets);
        assert_eq!(unit.children()[0], RenderUnit::text("custom atx_heading"));
    }

    #[test]
    fn transparent_container_can_be_overridden() {
        let source = "para";
        let mut widgets = WidgetRegistry::new();
        widgets.register("section", |_: &Node, _: &str| RenderUnit::Empty);
        let root = node("document", source, vec![node("section", source, vec![])]);
        assert_eq!(
            project(&root, source, &widgets),
            RenderUnit::column(vec![RenderUnit::Empty])
        );
    }

    #[test]
    fn null_node_yields_placeholder() {
        let null = Node::null("paragraph", Language::Markdown);
        let mut widgets = WidgetRegistry::new();
        widgets.register("paragraph", |_: &Node, _: &str| RenderUnit::Empty);
        assert_eq!(
            project(&null, "", &widgets),
            RenderUnit::invalid("paragraph")
        );
    }

    #[test]
    fn generic_fallback_projects_json() {
        let source = r#"{"a": [1, "two"]}"#;
        let root = parse_to_node(&testing::registry(), Language::Json, source).unwrap();
        let unit = project(&root, source, &WidgetRegistry::new());
        // Strings project through their string_content child
        assert_eq!(unit.texts(), vec!["a", "1", "two"]);
    }

    #[test]
    fn leaf_text_round_trips_multibyte() {
        let source = "[\"日本語\", \"🎉\", 3]";
        let root = parse_to_node(&testing::registry(), Language::Json, source).unwrap();
        let unit = project(&root, source, &WidgetRegistry::new());

        let leaves: Vec<&str> = root
            .descendants()
            .filter(|n| n.is_named && n.named_child_count() == 0)
            .map(|n| &source[n.start_byte()..n.end_byte()])
            .collect();
        assert_eq!(unit.texts(), leaves);
    }

    #[test]
    fn list_items_render_as_bulleted_rows() {
        let source = "- one\n- [x] two\n";
        let unit = project(&markdown(source), source, &WidgetRegistry::new());
        let list = &unit.children()[0];
        assert_eq!(list.children().len(), 2);

        let first = &list.children()[0];
        assert_eq!(first.texts(), vec!["•", "one"]);
        assert_eq!(list.children()[1].texts(), vec!["[x]", "two"]);
    }

    #[test]
    fn nested_list_stays_inside_item() {
        let source = "- outer\n  - inner\n";
        let unit = project(&markdown(source), source, &WidgetRegistry::new());
        let item = &unit.children()[0].children()[0];
        assert_eq!(item.texts(), vec!["•", "outer", "•", "inner"]);
    }

    #[test]
    fn code_quote_and_rule() {
        let source = "> quoted\n\n```js\nlet a;\n```\n\n---\n";
        let unit = project(&markdown(source), source, &WidgetRegistry::new());
        let children = unit.children();
        assert_eq!(children.len(), 3);
        assert!(matches!(&children[0], RenderUnit::Quote { body, .. } if body.texts() == vec!["quoted"]));
        assert_eq!(
            children[1],
            RenderUnit::Code {
                language: Some("js".to_string()),
                text: "let a;".to_string(),
            }
        );
        assert!(matches!(children[2], RenderUnit::Rule(_)));
    }

    #[test]
    fn markdown_widgets_style_the_document() {
        let theme = Theme::default();
        let mut widgets = WidgetRegistry::new();
        register_markdown_widgets(&mut widgets, &theme);

        let source = "## Title\n\n| k | v |\n|---|---|\n| x | 1 |\n";
        let unit = project(&markdown(source), source, &widgets);
        let children = unit.children();
        assert!(matches!(
            &children[0],
            RenderUnit::Heading { level: 2, rule: Some(_), .. }
        ));
        let RenderUnit::Table { columns, rows } = &children[1] else {
            panic!("expected table, got {:?}", children[1]);
        };
        assert_eq!(columns, &vec!["k".to_string(), "v".to_string()]);
        assert_eq!(rows[0].get("v").map(String::as_str), Some("1"));
    }

    #[test]
    fn deep_nesting_is_cut_off() {
        let mut root = node("leaf", "x", vec![]);
        for _ in 0..10_000 {
            root = node("wrap", "", vec![root]);
        }
        let unit = project(&root, "", &WidgetRegistry::new());

        let mut depth = 0;
        let mut current = &unit;
        while let [child] = current.children() {
            current = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_PROJECTION_DEPTH);
        assert!(matches!(
            current,
            RenderUnit::Placeholder { node_type, message }
                if node_type == "wrap" && message.contains("256")
        ));
    }

    #[test]
    fn deep_json_projects_without_overflow() {
        let depth = 5_000;
        let source = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let root = parse_to_node(&testing::registry(), Language::Json, &source).unwrap();
        let unit = project(&root, &source, &WidgetRegistry::new());
        assert_eq!(unit.texts().len(), 1);
    }

    #[test]
    fn node_kind_lookup() {
        assert_eq!(NodeKind::from_kind("atx_heading"), NodeKind::AtxHeading);
        assert_eq!(NodeKind::from_kind("emphasis"), NodeKind::Other);
        assert!(NodeKind::from_kind("section").is_transparent());
        assert!(!NodeKind::from_kind("list").is_transparent());
    }
}
