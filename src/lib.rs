//! Syntax tree extraction and Markdown projection over tree-sitter grammars
//! loaded at runtime.

pub mod config;
pub mod pipeline;
pub mod playground;
pub mod render;
pub mod scripting;
pub mod syntax;
pub mod theme;
