//! Error types for grammar resolution and parsing

use thiserror::Error;

use super::languages::Language;

/// Errors raised by the grammar registry and the parser engine.
///
/// Malformed source is not represented here: a parse always yields a tree and
/// syntax problems show up as error/missing flags on its nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("grammar for {language} not found: {reason}")]
    GrammarNotFound { language: Language, reason: String },

    #[error("grammar for {language} has ABI version {version}, supported range is {min}..={max}")]
    IncompatibleGrammar {
        language: Language,
        version: usize,
        min: usize,
        max: usize,
    },

    #[error("parser has no language set")]
    NoLanguage,

    #[error("parsing {language} source did not complete")]
    ParseAborted { language: Language },

    #[error("included range {index} is out of order or overlaps the previous range")]
    RangeRestrictionRejected { index: usize },
}

pub type Result<T, E = SyntaxError> = std::result::Result<T, E>;
