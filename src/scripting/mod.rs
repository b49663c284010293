//! Scripting module - Rhai runtime for configuration
//!
//! All functions are exposed under the `sylva` namespace:
//! - `sylva::config::*` - grammars, parsing and display settings
//! - `sylva::widgets::*` - rendering overrides per node type

mod api;
mod engine;

pub use engine::ScriptEngine;
