//! Dual-grammar parsing
//!
//! Markdown is parsed twice: the block grammar first, then the inline grammar
//! restricted to the byte ranges of the block tree's `inline` nodes. Both trees
//! share the coordinate space of the original buffer.

use tracing::{debug, warn};

use super::error::{Result, SyntaxError};
use super::languages::{GrammarHandle, GrammarRegistry, Language};
use super::node::{Node, Span};
use super::parser::SyntaxParser;

/// Node type whose content the inline grammar re-parses
pub const INLINE_MARKER: &str = "inline";

/// Spans of every `marker` node, in document order
///
/// Each marker node is collected once and its children are not searched, so
/// the result is ordered and free of overlaps.
pub fn collect_embedded_ranges(root: &Node, marker: &str) -> Vec<Span> {
    let mut ranges = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_null {
            continue;
        }
        if node.kind == marker {
            ranges.push(node.span);
            continue;
        }
        stack.extend(node.children.iter().rev());
    }
    ranges
}

/// Check that ranges are well formed, ordered, and disjoint
pub fn validate_ranges(ranges: &[Span]) -> Result<()> {
    let mut previous_end = 0;
    for (index, range) in ranges.iter().enumerate() {
        if range.start_byte > range.end_byte || range.start_byte < previous_end {
            return Err(SyntaxError::RangeRestrictionRejected { index });
        }
        previous_end = range.end_byte;
    }
    Ok(())
}

/// Outcome of the secondary parse
#[derive(Debug, Clone, PartialEq)]
pub enum InlineLayer {
    Parsed(Node),
    /// No embedded ranges; nothing to re-parse
    Skipped,
    Rejected(SyntaxError),
}

impl InlineLayer {
    pub fn tree(&self) -> Option<&Node> {
        match self {
            InlineLayer::Parsed(node) => Some(node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayeredTree {
    pub block: Node,
    pub ranges: Vec<Span>,
    pub inline: InlineLayer,
}

impl LayeredTree {
    /// Inline nodes whose span lies inside `span`
    pub fn inline_within(&self, span: Span) -> Vec<&Node> {
        let Some(inline) = self.inline.tree() else {
            return Vec::new();
        };
        inline
            .named_children()
            .filter(|node| node.start_byte() >= span.start_byte && node.end_byte() <= span.end_byte)
            .collect()
    }
}

pub struct LayeredParser {
    block: SyntaxParser,
    inline: SyntaxParser,
    marker: String,
}

impl LayeredParser {
    pub fn new(block: GrammarHandle, inline: GrammarHandle) -> Result<Self> {
        Ok(Self {
            block: SyntaxParser::with_grammar(block)?,
            inline: SyntaxParser::with_grammar(inline)?,
            marker: INLINE_MARKER.to_string(),
        })
    }

    /// Markdown block grammar over Markdown inline grammar
    pub fn markdown(registry: &GrammarRegistry) -> Result<Self> {
        Self::new(
            registry.resolve(Language::Markdown)?,
            registry.resolve(Language::MarkdownInline)?,
        )
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Parse with the block grammar, then re-parse the embedded ranges
    ///
    /// Only a block parse failure is an error. A rejected inline pass is
    /// reported in the result and the block tree is still returned.
    pub fn parse(&mut self, source: &str) -> Result<LayeredTree> {
        let block = self.block.parse(source)?.materialize();
        let ranges = collect_embedded_ranges(&block, &self.marker);
        debug!(target: "syntax", ranges = ranges.len(), "collected embedded ranges");

        let inline = if ranges.is_empty() {
            InlineLayer::Skipped
        } else {
            match self.parse_inline(source, &ranges) {
                Ok(node) => InlineLayer::Parsed(node),
                Err(err) => {
                    warn!(target: "syntax", "inline pass skipped: {}", err);
                    InlineLayer::Rejected(err)
                }
            }
        };

        Ok(LayeredTree {
            block,
            ranges,
            inline,
        })
    }

    fn parse_inline(&mut self, source: &str, ranges: &[Span]) -> Result<Node> {
        self.inline.set_included_ranges(ranges)?;
        let tree = self.inline.parse(source)?;
        Ok(tree.materialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::node::tests::node;
    use crate::syntax::testing;

    fn spanned(kind: &str, start: usize, end: usize, children: Vec<Node>) -> Node {
        let mut n = node(kind, "", children);
        n.span.start_byte = start;
        n.span.end_byte = end;
        n
    }

    fn span(start: usize, end: usize) -> Span {
        Span {
            start_byte: start,
            end_byte: end,
            ..Span::default()
        }
    }

    #[test]
    fn collects_leaf_and_branch_markers_once() {
        let tree = spanned(
            "document",
            0,
            40,
            vec![
                spanned("paragraph", 0, 10, vec![spanned("inline", 0, 9, vec![])]),
                spanned(
                    "block_quote",
                    11,
                    30,
                    vec![spanned(
                        "paragraph",
                        13,
                        30,
                        vec![spanned(
                            "inline",
                            13,
                            29,
                            vec![spanned("inline", 14, 20, vec![])],
                        )],
                    )],
                ),
                spanned("inline", 31, 40, vec![]),
            ],
        );

        let ranges = collect_embedded_ranges(&tree, INLINE_MARKER);
        let bounds: Vec<(usize, usize)> =
            ranges.iter().map(|r| (r.start_byte, r.end_byte)).collect();
        assert_eq!(bounds, vec![(0, 9), (13, 29), (31, 40)]);
        assert!(validate_ranges(&ranges).is_ok());
    }

    #[test]
    fn custom_marker_and_null_nodes() {
        let mut missing = spanned("text", 0, 3, vec![]);
        missing.is_null = true;
        let tree = spanned("root", 0, 10, vec![missing, spanned("text", 4, 10, vec![])]);
        let ranges = collect_embedded_ranges(&tree, "text");
        assert_eq!(ranges, vec![span(4, 10)]);
    }

    #[test]
    fn validate_rejects_overlap_and_inversion() {
        assert!(validate_ranges(&[]).is_ok());
        assert!(validate_ranges(&[span(0, 4), span(4, 8)]).is_ok());
        assert_eq!(
            validate_ranges(&[span(0, 4), span(3, 8)]),
            Err(SyntaxError::RangeRestrictionRejected { index: 1 })
        );
        assert_eq!(
            validate_ranges(&[span(5, 2)]),
            Err(SyntaxError::RangeRestrictionRejected { index: 0 })
        );
    }

    #[test]
    fn markdown_heading_and_paragraph() {
        let registry = testing::registry();
        let mut parser = LayeredParser::markdown(&registry).unwrap();
        let source = "# Hello\nWorld";
        let layered = parser.parse(source).unwrap();

        assert_eq!(layered.block.kind, "document");
        let heading = layered.block.find("atx_heading").unwrap();
        assert_eq!(heading.named_child(0).unwrap().kind, "atx_h1_marker");
        assert_eq!(
            heading.child_by_field("heading_content").unwrap().text.trim(),
            "Hello"
        );
        assert_eq!(
            layered.block.find("paragraph").unwrap().text.trim(),
            "World"
        );

        assert_eq!(layered.ranges.len(), 2);
        let texts: Vec<&str> = layered
            .ranges
            .iter()
            .map(|r| source[r.start_byte..r.end_byte].trim())
            .collect();
        assert_eq!(texts, vec!["Hello", "World"]);

        let inline = layered.inline.tree().unwrap();
        assert_eq!(inline.kind, "inline");
        assert_eq!(inline.language, Language::MarkdownInline);
    }

    #[test]
    fn inline_pass_finds_emphasis() {
        let registry = testing::registry();
        let mut parser = LayeredParser::markdown(&registry).unwrap();
        let source = "Some *stress* and `code` here\n";
        let layered = parser.parse(source).unwrap();

        let inline = layered.inline.tree().unwrap();
        let emphasis = inline.find("emphasis").unwrap();
        assert_eq!(emphasis.text, "*stress*");
        assert!(inline.find("code_span").is_some());

        let paragraph = layered.block.find("paragraph").unwrap();
        assert!(!layered.inline_within(paragraph.span).is_empty());
    }

    #[test]
    fn empty_document_skips_inline_pass() {
        let registry = testing::registry();
        let mut parser = LayeredParser::markdown(&registry).unwrap();
        let layered = parser.parse("").unwrap();
        assert!(layered.ranges.is_empty());
        assert_eq!(layered.inline, InlineLayer::Skipped);
    }

    #[test]
    fn unknown_marker_skips_inline_pass() {
        let registry = testing::registry();
        let mut parser = LayeredParser::markdown(&registry)
            .unwrap()
            .with_marker("no_such_node");
        assert_eq!(parser.marker(), "no_such_node");
        let layered = parser.parse("# Title\n").unwrap();
        assert_eq!(layered.inline, InlineLayer::Skipped);
        assert!(layered.block.find("atx_heading").is_some());
    }

    #[test]
    fn missing_inline_grammar_is_an_error() {
        let registry = GrammarRegistry::new("/nonexistent");
        registry
            .register(Language::Markdown, tree_sitter_md::LANGUAGE.into())
            .unwrap();
        let err = LayeredParser::markdown(&registry).err().unwrap();
        assert!(matches!(
            err,
            SyntaxError::GrammarNotFound {
                language: Language::MarkdownInline,
                ..
            }
        ));
    }
}
