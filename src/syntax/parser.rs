//! Parser engine
//!
//! Wraps a Tree-sitter parser holding one grammar at a time. A parse always
//! yields a tree; malformed input shows up as error flags on its nodes.

use tracing::{debug, trace};

use super::error::{Result, SyntaxError};
use super::languages::{GrammarHandle, Language};
use super::node::{Node, Span};
use super::ranges::validate_ranges;

pub struct SyntaxParser {
    parser: tree_sitter::Parser,
    grammar: Option<GrammarHandle>,
}

impl SyntaxParser {
    pub fn new() -> Self {
        Self {
            parser: tree_sitter::Parser::new(),
            grammar: None,
        }
    }

    pub fn with_grammar(grammar: GrammarHandle) -> Result<Self> {
        let mut parser = Self::new();
        parser.set_language(grammar)?;
        Ok(parser)
    }

    /// Replace the active grammar
    pub fn set_language(&mut self, grammar: GrammarHandle) -> Result<()> {
        self.parser
            .set_language(grammar.language())
            .map_err(|_| SyntaxError::IncompatibleGrammar {
                language: grammar.id(),
                version: grammar.language().version(),
                min: tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: tree_sitter::LANGUAGE_VERSION,
            })?;
        debug!(target: "syntax", language = %grammar.id(), "parser language set");
        self.grammar = Some(grammar);
        Ok(())
    }

    pub fn grammar(&self) -> Option<&GrammarHandle> {
        self.grammar.as_ref()
    }

    pub fn language(&self) -> Option<Language> {
        self.grammar.as_ref().map(GrammarHandle::id)
    }

    /// Restrict the next parses to `ranges`, which must be ordered and disjoint
    pub fn set_included_ranges(&mut self, ranges: &[Span]) -> Result<()> {
        validate_ranges(ranges)?;
        let ranges: Vec<tree_sitter::Range> = ranges.iter().copied().map(Into::into).collect();
        self.parser
            .set_included_ranges(&ranges)
            .map_err(|e| SyntaxError::RangeRestrictionRejected { index: e.0 })
    }

    /// Parse the whole document again
    pub fn clear_included_ranges(&mut self) {
        // An empty list is always accepted
        if let Err(err) = self.parser.set_included_ranges(&[]) {
            debug!(target: "syntax", index = err.0, "clearing included ranges failed");
        }
    }

    pub fn parse<'s>(&mut self, source: &'s str) -> Result<SyntaxTree<'s>> {
        let grammar = self.grammar.clone().ok_or(SyntaxError::NoLanguage)?;
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(SyntaxError::ParseAborted {
                language: grammar.id(),
            })?;
        trace!(target: "syntax", language = %grammar.id(), bytes = source.len(), "parsed");
        Ok(SyntaxTree {
            tree,
            source,
            grammar,
        })
    }
}

impl Default for SyntaxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one parse, borrowing the text it was parsed from
///
/// The borrow keeps the buffer unchanged for as long as the tree is alive.
/// Dropping the tree releases it.
pub struct SyntaxTree<'src> {
    tree: tree_sitter::Tree,
    source: &'src str,
    grammar: GrammarHandle,
}

impl<'src> SyntaxTree<'src> {
    pub fn language(&self) -> Language {
        self.grammar.id()
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn root_kind(&self) -> &str {
        self.tree.root_node().kind()
    }

    pub fn to_sexp(&self) -> String {
        self.tree.root_node().to_sexp()
    }

    pub fn raw_root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn included_ranges(&self) -> Vec<Span> {
        self.tree.included_ranges().into_iter().map(Span::from).collect()
    }

    /// Copy the whole tree into owned nodes
    pub fn materialize(&self) -> Node {
        Node::materialize(
            self.tree.root_node(),
            self.source,
            self.grammar.id(),
            self.grammar.fields(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::testing;

    fn javascript() -> SyntaxParser {
        let registry = testing::registry();
        SyntaxParser::with_grammar(registry.resolve(Language::JavaScript).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_statement() {
        let mut parser = javascript();
        let tree = parser.parse("let x = 42;").unwrap();
        assert_eq!(tree.root_kind(), "program");
        assert_eq!(tree.language(), Language::JavaScript);
        assert_eq!(tree.materialize().named_child_count(), 1);
    }

    #[test]
    fn test_parse_empty_source() {
        let mut parser = javascript();
        let tree = parser.parse("").unwrap();
        assert_eq!(tree.root_kind(), "program");
        assert_eq!(tree.materialize().child_count(), 0);
    }

    #[test]
    fn test_parse_nested_function() {
        let mut parser = javascript();
        let tree = parser
            .parse("function greet() { console.log('hello'); }")
            .unwrap();
        let root = tree.materialize();
        assert_eq!(root.named_child(0).unwrap().kind, "function_declaration");
        assert!(root.find("call_expression").is_some());
    }

    #[test]
    fn test_parse_invalid_source_still_yields_tree() {
        let mut parser = javascript();
        let tree = parser.parse("function () {").unwrap();
        assert_eq!(tree.root_kind(), "program");
        let root = tree.materialize();
        assert!(root.has_error);
        assert!(root.descendants().any(|n| n.is_error || n.is_missing));
    }

    #[test]
    fn test_parse_twice_is_equal() {
        let mut parser = javascript();
        let source = "const answer = compute(1, [2, 3]);";
        let first = parser.parse(source).unwrap().materialize();
        let second = parser.parse(source).unwrap().materialize();
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_root_is_document() {
        let registry = testing::registry();
        let mut parser =
            SyntaxParser::with_grammar(registry.resolve(Language::Json).unwrap()).unwrap();
        let tree = parser.parse("[1, null]").unwrap();
        assert_eq!(tree.root_kind(), "document");
        assert_eq!(tree.to_sexp(), "(document (array (number) (null)))");
    }

    #[test]
    fn test_parse_without_language() {
        let mut parser = SyntaxParser::new();
        assert_eq!(parser.parse("x").err(), Some(SyntaxError::NoLanguage));
    }

    #[test]
    fn test_set_language_replaces_grammar() {
        let registry = testing::registry();
        let mut parser = javascript();
        parser
            .set_language(registry.resolve(Language::Json).unwrap())
            .unwrap();
        assert_eq!(parser.language(), Some(Language::Json));
        assert_eq!(parser.parse("{}").unwrap().root_kind(), "document");
    }

    #[test]
    fn test_overlapping_ranges_are_rejected() {
        let mut parser = javascript();
        let span = |start, end| Span {
            start_byte: start,
            end_byte: end,
            ..Span::default()
        };
        let err = parser
            .set_included_ranges(&[span(0, 10), span(5, 12)])
            .unwrap_err();
        assert_eq!(err, SyntaxError::RangeRestrictionRejected { index: 1 });

        // Parsing still works over the whole document
        assert_eq!(parser.parse("let a;").unwrap().root_kind(), "program");
    }

    #[test]
    fn test_included_ranges_limit_the_parse() {
        let mut parser = javascript();
        let source = "let a = 1; garbage ((( let b = 2;";
        let range = Span {
            start_byte: 0,
            end_byte: 10,
            start: Default::default(),
            end: super::super::node::Point::new(0, 10),
        };
        parser.set_included_ranges(&[range]).unwrap();
        let tree = parser.parse(source).unwrap();
        assert_eq!(tree.included_ranges(), vec![range]);
        assert!(!tree.materialize().has_error);

        parser.clear_included_ranges();
        assert!(parser.parse(source).unwrap().materialize().has_error);
    }
}
