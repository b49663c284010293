//! Configuration values and their errors
//!
//! Settings are produced by evaluating the user's `init.rhai`; see
//! [`crate::scripting`].

mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use settings::{
    MAX_DEBOUNCE_MS, MAX_WRAP_WIDTH, MIN_WRAP_WIDTH, Settings, WidgetOverride, WidgetStyle,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Compile(String),

    #[error("config error: {0}")]
    Eval(String),
}
