//! Syntax trees using Tree-sitter
//!
//! Grammars are registered in-process or loaded on demand from
//! `~/.config/sylva/grammars/`. Parses are materialized into owned [`Node`]
//! trees straight away; the raw tree never outlives the parse call's scope.

mod error;
mod fields;
mod languages;
mod node;
mod parser;
mod ranges;

pub use error::{Result, SyntaxError};
pub use fields::FieldTable;
pub use languages::{GrammarHandle, GrammarRegistry, Language};
pub use node::{Descendants, Node, Point, Span};
pub use parser::{SyntaxParser, SyntaxTree};
pub use ranges::{
    INLINE_MARKER, InlineLayer, LayeredParser, LayeredTree, collect_embedded_ranges,
    validate_ranges,
};

/// Parse `source` with `language` and return the owned tree
pub fn parse_to_node(registry: &GrammarRegistry, language: Language, source: &str) -> Result<Node> {
    let mut parser = SyntaxParser::with_grammar(registry.resolve(language)?)?;
    Ok(parser.parse(source)?.materialize())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{GrammarRegistry, Language};

    /// Registry with the statically linked test grammars
    pub(crate) fn registry() -> GrammarRegistry {
        let registry = GrammarRegistry::new("/nonexistent");
        registry
            .register(Language::Json, tree_sitter_json::LANGUAGE.into())
            .unwrap();
        registry
            .register(Language::JavaScript, tree_sitter_javascript::LANGUAGE.into())
            .unwrap();
        registry
            .register(Language::Markdown, tree_sitter_md::LANGUAGE.into())
            .unwrap();
        registry
            .register(Language::MarkdownInline, tree_sitter_md::INLINE_LANGUAGE.into())
            .unwrap();
        registry
    }

    pub(crate) use super::node::tests::{anonymous, node};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_grammar_parses_empty_source_to_childless_root() {
        let registry = testing::registry();
        for (language, root) in [
            (Language::Json, "document"),
            (Language::JavaScript, "program"),
            (Language::Markdown, "document"),
        ] {
            let node = parse_to_node(&registry, language, "").unwrap();
            assert_eq!(node.kind, root);
            assert_eq!(node.child_count(), 0, "{} root has children", language);
        }
    }

    #[test]
    fn unresolved_language_fails_before_parsing() {
        let registry = GrammarRegistry::new("/nonexistent");
        let err = parse_to_node(&registry, Language::Go, "package main").unwrap_err();
        assert!(matches!(err, SyntaxError::GrammarNotFound { .. }));
    }
}
