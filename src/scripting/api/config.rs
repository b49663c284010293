//! sylva::config - Grammars, parsing and display settings
//!
//! Usage in Rhai:
//! ```rhai
//! sylva::config::set_grammars_dir("~/grammars");
//! sylva::config::set_debounce_ms(250);
//! sylva::config::preload("yaml");
//! sylva::config::set_color("h1_rule", "#ababab");
//! ```

use rhai::plugin::*;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::config::Settings;
use crate::syntax::Language;
use crate::theme::{Color, Theme};

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Create the config module with access to settings
pub fn create_module(settings: Arc<RwLock<Settings>>) -> rhai::Module {
    let mut module = rhai::Module::new();

    // set_grammars_dir(path: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn("set_grammars_dir", move |path: &str| {
            if let Ok(mut settings) = s.write() {
                settings.grammars_dir = expand_home(path);
            }
            Ok(())
        });
    }

    // get_grammars_dir() -> String
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "get_grammars_dir",
            move || -> Result<String, Box<EvalAltResult>> {
                Ok(s.read()
                    .map(|s| s.grammars_dir.display().to_string())
                    .unwrap_or_default())
            },
        );
    }

    // set_debounce_ms(ms: i64)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn("set_debounce_ms", move |ms: i64| {
            if let Ok(mut settings) = s.write() {
                settings.set_debounce_ms(ms);
            }
            Ok(())
        });
    }

    // get_debounce_ms() -> i64
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "get_debounce_ms",
            move || -> Result<i64, Box<EvalAltResult>> {
                Ok(s.read().map(|s| s.debounce_ms as i64).unwrap_or(100))
            },
        );
    }

    // preload(language: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "preload",
            move |name: &str| -> Result<(), Box<EvalAltResult>> {
                let language = Language::from_name(name)
                    .ok_or_else(|| format!("unknown language: {}", name))?;
                if let Ok(mut settings) = s.write() {
                    settings.add_preload(language);
                }
                Ok(())
            },
        );
    }

    // set_inline_marker(node_type: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_inline_marker",
            move |node_type: &str| -> Result<(), Box<EvalAltResult>> {
                if node_type.trim().is_empty() {
                    return Err("inline marker cannot be empty".into());
                }
                if let Ok(mut settings) = s.write() {
                    settings.inline_marker = node_type.trim().to_string();
                }
                Ok(())
            },
        );
    }

    // set_show_anonymous(enabled: bool)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn("set_show_anonymous", move |enabled: bool| {
            if let Ok(mut settings) = s.write() {
                settings.show_anonymous = enabled;
            }
            Ok(())
        });
    }

    // set_wrap_width(width: i64)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn("set_wrap_width", move |width: i64| {
            if let Ok(mut settings) = s.write() {
                settings.set_wrap_width(width);
            }
            Ok(())
        });
    }

    // set_color(slot: &str, hex: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_color",
            move |slot: &str, hex: &str| -> Result<(), Box<EvalAltResult>> {
                if !Theme::SLOTS.contains(&slot) {
                    return Err(format!("unknown color slot: {}", slot).into());
                }
                let color =
                    Color::from_hex(hex).ok_or_else(|| format!("invalid color: {}", hex))?;
                if let Ok(mut settings) = s.write() {
                    settings.colors.push((slot.to_string(), color));
                }
                Ok(())
            },
        );
    }

    // list_languages() -> Array
    module.set_native_fn(
        "list_languages",
        || -> Result<rhai::Array, Box<EvalAltResult>> {
            Ok(Language::all()
                .into_iter()
                .filter_map(|lang| lang.grammar_name())
                .map(|name| rhai::Dynamic::from(name.to_string()))
                .collect())
        },
    );

    module
}
