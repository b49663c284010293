//! sylva::widgets - Per-node-type rendering overrides
//!
//! Usage in Rhai:
//! ```rhai
//! sylva::widgets::register("thematic_break", "hidden");
//! sylva::widgets::unregister("pipe_table");
//! ```
//!
//! Changes are recorded in order and applied on top of the built-in Markdown
//! widgets whenever the registry is (re)built.

use rhai::plugin::*;
use std::sync::{Arc, RwLock};

use crate::config::{Settings, WidgetOverride, WidgetStyle};

pub fn create_module(settings: Arc<RwLock<Settings>>) -> rhai::Module {
    let mut module = rhai::Module::new();

    // register(node_type: &str, style: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "register",
            move |node_type: &str, style: &str| -> Result<(), Box<EvalAltResult>> {
                if node_type.is_empty() {
                    return Err("node type cannot be empty".into());
                }
                let style = WidgetStyle::from_name(style)
                    .ok_or_else(|| format!("unknown widget style: {}", style))?;
                if let Ok(mut settings) = s.write() {
                    settings.widgets.push(WidgetOverride::Register {
                        node_type: node_type.to_string(),
                        style,
                    });
                }
                Ok(())
            },
        );
    }

    // unregister(node_type: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn("unregister", move |node_type: &str| {
            if let Ok(mut settings) = s.write() {
                settings.widgets.push(WidgetOverride::Unregister {
                    node_type: node_type.to_string(),
                });
            }
            Ok(())
        });
    }

    // list_styles() -> Array
    module.set_native_fn(
        "list_styles",
        || -> Result<rhai::Array, Box<EvalAltResult>> {
            Ok(WidgetStyle::ALL
                .iter()
                .map(|style| rhai::Dynamic::from(style.name().to_string()))
                .collect())
        },
    );

    module
}
