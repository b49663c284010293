use std::path::PathBuf;
use std::time::Duration;

use crate::render::{RenderUnit, RuleStyle, TextStyle, WidgetRegistry, register_markdown_widgets};
use crate::syntax::{GrammarRegistry, INLINE_MARKER, Language, Node};
use crate::theme::{Color, Theme, default_theme};

pub const MAX_DEBOUNCE_MS: u64 = 5000;
pub const MIN_WRAP_WIDTH: usize = 20;
pub const MAX_WRAP_WIDTH: usize = 400;

/// Built-in rendering styles a script can assign to a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetStyle {
    Text,
    Bold,
    Code,
    Quote,
    Rule,
    Hidden,
}

impl WidgetStyle {
    pub const ALL: [WidgetStyle; 6] = [
        WidgetStyle::Text,
        WidgetStyle::Bold,
        WidgetStyle::Code,
        WidgetStyle::Quote,
        WidgetStyle::Rule,
        WidgetStyle::Hidden,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            WidgetStyle::Text => "text",
            WidgetStyle::Bold => "bold",
            WidgetStyle::Code => "code",
            WidgetStyle::Quote => "quote",
            WidgetStyle::Rule => "rule",
            WidgetStyle::Hidden => "hidden",
        }
    }

    /// Render `node` in this style
    pub fn render(&self, node: &Node, theme: &Theme) -> RenderUnit {
        let text = node.text.trim_end();
        match self {
            WidgetStyle::Text => RenderUnit::text(text),
            WidgetStyle::Bold => RenderUnit::styled(text, TextStyle::body().bold()),
            WidgetStyle::Code => RenderUnit::Code {
                language: None,
                text: text.to_string(),
            },
            WidgetStyle::Quote => RenderUnit::Quote {
                border: Some(theme.quote_border),
                body: Box::new(RenderUnit::styled(
                    text,
                    TextStyle::body().colored(theme.quote_text),
                )),
            },
            WidgetStyle::Rule => RenderUnit::Rule(RuleStyle {
                thickness: 1,
                color: Some(theme.rule),
            }),
            WidgetStyle::Hidden => RenderUnit::Empty,
        }
    }
}

/// A widget change requested by the config script, applied in script order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOverride {
    Register { node_type: String, style: WidgetStyle },
    Unregister { node_type: String },
}

/// Settings that can be customized via the Rhai config
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    // Grammars
    pub grammars_dir: PathBuf,
    pub preload: Vec<Language>,

    // Parsing
    pub debounce_ms: u64,
    pub inline_marker: String,

    // Display
    pub show_anonymous: bool,
    pub wrap_width: usize,
    pub colors: Vec<(String, Color)>,

    pub widgets: Vec<WidgetOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grammars_dir: GrammarRegistry::default_dir(),
            preload: vec![
                Language::Json,
                Language::JavaScript,
                Language::Markdown,
                Language::MarkdownInline,
            ],

            debounce_ms: 100,
            inline_marker: INLINE_MARKER.to_string(),

            show_anonymous: false,
            wrap_width: 80,
            colors: Vec::new(),

            widgets: Vec::new(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn set_debounce_ms(&mut self, ms: i64) {
        self.debounce_ms = ms.clamp(0, MAX_DEBOUNCE_MS as i64) as u64;
    }

    pub fn set_wrap_width(&mut self, width: i64) {
        self.wrap_width = width.clamp(MIN_WRAP_WIDTH as i64, MAX_WRAP_WIDTH as i64) as usize;
    }

    pub fn add_preload(&mut self, language: Language) {
        if !self.preload.contains(&language) {
            self.preload.push(language);
        }
    }

    /// Default theme with the configured color overrides
    pub fn theme(&self) -> Theme {
        let mut theme = default_theme();
        for (slot, color) in &self.colors {
            theme.set_color(slot, *color);
        }
        theme
    }

    /// Reset `registry` to the Markdown widgets plus this config's overrides
    pub fn apply_widgets(&self, registry: &mut WidgetRegistry) {
        let theme = self.theme();
        registry.reload(|registry| {
            register_markdown_widgets(registry, &theme);
            for change in &self.widgets {
                match change {
                    WidgetOverride::Register { node_type, style } => {
                        let (style, theme) = (*style, theme.clone());
                        registry.register(node_type.clone(), move |node, _| {
                            style.render(node, &theme)
                        });
                    }
                    WidgetOverride::Unregister { node_type } => {
                        registry.unregister(node_type);
                    }
                }
            }
        });
    }
}
