//! Parse-and-project pipeline
//!
//! Holds the process-scoped pieces (grammar registry, widget registry,
//! settings, theme) and runs one text buffer through them. Each call parses
//! the whole buffer again and hands back owned results only.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Settings;
use crate::render::{RenderUnit, WidgetRegistry, project};
use crate::syntax::{
    GrammarRegistry, InlineLayer, Language, LayeredParser, LayeredTree, Node, Result,
    SyntaxError, SyntaxParser,
};
use crate::theme::Theme;

/// A Markdown buffer after the layered parse and projection
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownView {
    pub layered: LayeredTree,
    pub unit: RenderUnit,
}

pub struct Pipeline {
    grammars: Arc<GrammarRegistry>,
    widgets: WidgetRegistry,
    settings: Settings,
    theme: Theme,
    parsers: HashMap<Language, SyntaxParser>,
    markdown: Option<LayeredParser>,
}

impl Pipeline {
    /// Pipeline loading grammars from the configured directory
    pub fn new(settings: Settings) -> Self {
        let grammars = Arc::new(GrammarRegistry::new(settings.grammars_dir.clone()));
        Self::with_registry(grammars, settings)
    }

    pub fn with_registry(grammars: Arc<GrammarRegistry>, settings: Settings) -> Self {
        let mut widgets = WidgetRegistry::new();
        settings.apply_widgets(&mut widgets);
        let theme = settings.theme();
        Self {
            grammars,
            widgets,
            settings,
            theme,
            parsers: HashMap::new(),
            markdown: None,
        }
    }

    /// Resolve the configured startup languages, returning every failure
    pub fn preload(&self) -> Vec<SyntaxError> {
        self.grammars.preload(&self.settings.preload)
    }

    pub fn grammars(&self) -> &GrammarRegistry {
        &self.grammars
    }

    pub fn widgets(&self) -> &WidgetRegistry {
        &self.widgets
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Swap in reloaded settings and rebuild the widget registry from scratch
    pub fn apply_settings(&mut self, settings: Settings) {
        if settings.grammars_dir != self.settings.grammars_dir {
            info!(target: "config", dir = %settings.grammars_dir.display(), "grammars directory changed");
            self.grammars = Arc::new(self.grammars.relocated(settings.grammars_dir.clone()));
            self.parsers.clear();
        } else {
            // Give libraries installed since the last attempt another chance
            self.grammars.clear_failures();
        }
        self.markdown = None;
        settings.apply_widgets(&mut self.widgets);
        self.theme = settings.theme();
        self.settings = settings;
    }

    fn parser(&mut self, language: Language) -> Result<&mut SyntaxParser> {
        if !self.parsers.contains_key(&language) {
            let parser = SyntaxParser::with_grammar(self.grammars.resolve(language)?)?;
            self.parsers.insert(language, parser);
        }
        self.parsers
            .get_mut(&language)
            .ok_or(SyntaxError::NoLanguage)
    }

    /// Parse `source` and return its owned node tree
    pub fn syntax_tree(&mut self, language: Language, source: &str) -> Result<Node> {
        let parser = self.parser(language)?;
        let tree = parser.parse(source)?;
        Ok(tree.materialize())
    }

    /// Block parse plus inline re-parse of a Markdown buffer
    pub fn layered(&mut self, source: &str) -> Result<LayeredTree> {
        if self.markdown.is_none() {
            let parser = LayeredParser::markdown(&self.grammars)?
                .with_marker(self.settings.inline_marker.clone());
            self.markdown = Some(parser);
        }
        match self.markdown.as_mut() {
            Some(parser) => parser.parse(source),
            None => Err(SyntaxError::NoLanguage),
        }
    }

    /// Project any node tree through the widget registry
    pub fn project(&self, node: &Node, source: &str) -> RenderUnit {
        project(node, source, &self.widgets)
    }

    pub fn render_markdown(&mut self, source: &str) -> Result<MarkdownView> {
        let layered = self.layered(source)?;
        let unit = self.project(&layered.block, source);
        debug!(target: "render", units = unit.children().len(), "projected markdown");
        Ok(MarkdownView { layered, unit })
    }
}

/// Outcome of one built-in sanity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub outcome: std::result::Result<(), String>,
}

impl Check {
    fn run(name: &'static str, f: impl FnOnce() -> std::result::Result<(), String>) -> Self {
        Self {
            name,
            outcome: f(),
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

fn expect<T: PartialEq + std::fmt::Debug>(what: &str, actual: T, expected: T) -> std::result::Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("{}: expected {:?}, got {:?}", what, expected, actual))
    }
}

/// Parse known inputs and verify the shapes that come back
pub fn run_checks(pipeline: &mut Pipeline) -> Vec<Check> {
    let json = Check::run("json [1, null]", || {
        let root = pipeline
            .syntax_tree(Language::Json, "[1, null]")
            .map_err(|e| e.to_string())?;
        expect("root type", root.kind.as_str(), "document")?;
        expect("root children", root.child_count(), 1)?;
        let array = root.named_child(0).ok_or("root has no array")?;
        expect("array type", array.kind.as_str(), "array")?;
        expect("array children", array.child_count(), 5)?;
        expect("array named children", array.named_child_count(), 2)?;
        let number = array.named_child(0).ok_or("array has no number")?;
        expect("number type", number.kind.as_str(), "number")?;
        expect("number children", number.child_count(), 0)
    });

    let javascript = Check::run("javascript program", || {
        let root = pipeline
            .syntax_tree(Language::JavaScript, "let x = 42;")
            .map_err(|e| e.to_string())?;
        expect("root type", root.kind.as_str(), "program")
    });

    let markdown = Check::run("markdown layered parse", || {
        let view = pipeline
            .render_markdown("# Hello\nWorld")
            .map_err(|e| e.to_string())?;
        expect("embedded ranges", view.layered.ranges.len(), 2)?;
        if let InlineLayer::Rejected(err) = &view.layered.inline {
            return Err(format!("inline pass rejected: {}", err));
        }
        expect("rendered blocks", view.unit.children().len(), 2)
    });

    vec![json, javascript, markdown]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{WidgetOverride, WidgetStyle};
    use crate::syntax::testing;

    fn pipeline() -> Pipeline {
        Pipeline::with_registry(Arc::new(testing::registry()), Settings::default())
    }

    #[test]
    fn checks_pass_with_static_grammars() {
        let mut pipeline = pipeline();
        for check in run_checks(&mut pipeline) {
            assert!(check.passed(), "{}: {:?}", check.name, check.outcome);
        }
    }

    #[test]
    fn checks_report_missing_grammars() {
        let mut pipeline =
            Pipeline::with_registry(Arc::new(GrammarRegistry::new("/nonexistent")), Settings::default());
        let checks = run_checks(&mut pipeline);
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|c| !c.passed()));
        assert!(checks[0].outcome.as_ref().unwrap_err().contains("not found"));
    }

    #[test]
    fn render_markdown_uses_widget_set() {
        let mut pipeline = pipeline();
        let view = pipeline.render_markdown("# Hello\nWorld").unwrap();
        assert!(matches!(
            view.unit.children()[0],
            RenderUnit::Heading { level: 1, rule: Some(_), .. }
        ));
        assert!(view.layered.inline.tree().is_some());
    }

    #[test]
    fn reloaded_settings_replace_widgets() {
        let mut pipeline = pipeline();
        let mut settings = Settings::default();
        settings.grammars_dir = pipeline.settings().grammars_dir.clone();
        settings.widgets.push(WidgetOverride::Register {
            node_type: "atx_heading".to_string(),
            style: WidgetStyle::Hidden,
        });
        pipeline.apply_settings(settings);

        let view = pipeline.render_markdown("# Hello\nWorld").unwrap();
        assert_eq!(view.unit.children()[0], RenderUnit::Empty);
        assert!(pipeline.widgets().contains("pipe_table"));
    }

    #[test]
    fn new_grammars_dir_keeps_static_grammars() {
        let mut pipeline = pipeline();
        let mut settings = Settings::default();
        settings.grammars_dir = "/elsewhere".into();
        pipeline.apply_settings(settings);

        assert_eq!(pipeline.grammars().grammars_dir(), std::path::Path::new("/elsewhere"));
        assert!(pipeline.grammars().is_loaded(Language::Markdown));
        let view = pipeline.render_markdown("# Hello\nWorld").unwrap();
        assert_eq!(view.unit.texts(), vec!["Hello", "World"]);
    }

    #[test]
    fn syntax_tree_reuses_parser() {
        let mut pipeline = pipeline();
        let first = pipeline.syntax_tree(Language::Json, "[]").unwrap();
        let second = pipeline.syntax_tree(Language::Json, "[]").unwrap();
        assert_eq!(first, second);
        assert!(pipeline.syntax_tree(Language::Go, "").is_err());
    }

    #[test]
    fn custom_inline_marker_is_used() {
        let mut settings = Settings::default();
        settings.inline_marker = "paragraph".to_string();
        let mut pipeline = Pipeline::with_registry(Arc::new(testing::registry()), settings);
        let layered = pipeline.layered("one\n\ntwo\n").unwrap();
        assert_eq!(layered.ranges.len(), 2);
    }
}
