//! Playground state
//!
//! The source buffer on the left, and on the right either the syntax tree of
//! the buffer or its rendered Markdown. Edits are debounced; only the latest
//! buffer revision is ever parsed.

use std::time::Instant;

use tracing::{debug, warn};

use super::buffer::Buffer;
use super::debounce::Debouncer;
use crate::pipeline::Pipeline;
use crate::render::terminal::{SpanStyle, StyledLine, layout, tree_lines};
use crate::render::tree_rows;
use crate::scripting::ScriptEngine;
use crate::syntax::{InlineLayer, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Tree,
    Markdown,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Tree => ViewMode::Markdown,
            ViewMode::Markdown => ViewMode::Tree,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::Tree => "tree",
            ViewMode::Markdown => "markdown",
        }
    }
}

pub struct App {
    pub buffer: Buffer,
    pub language: Language,
    pub view: ViewMode,
    pub running: bool,
    pub scroll: usize,
    /// Right-hand pane content
    pub output: Vec<StyledLine>,
    pub message: Option<String>,
    pipeline: Pipeline,
    scripts: ScriptEngine,
    debouncer: Debouncer<u64>,
    output_width: usize,
    rendered_revision: Option<u64>,
}

impl App {
    pub fn new(buffer: Buffer, language: Language, pipeline: Pipeline, scripts: ScriptEngine) -> Self {
        let debouncer = Debouncer::new(pipeline.settings().debounce());
        let view = if language == Language::Markdown {
            ViewMode::Markdown
        } else {
            ViewMode::Tree
        };
        Self {
            buffer,
            language,
            view,
            running: true,
            scroll: 0,
            output: Vec::new(),
            message: None,
            pipeline,
            scripts,
            debouncer,
            output_width: 40,
            rendered_revision: None,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn set_output_width(&mut self, width: usize) {
        let width = width.min(self.pipeline.settings().wrap_width).max(1);
        if width != self.output_width {
            self.output_width = width;
            self.refresh();
        }
    }

    /// Record an edit; the re-parse happens once the debounce delay passes
    pub fn edited(&mut self, now: Instant) {
        self.debouncer.trigger(now, self.buffer.revision());
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Run a pending re-parse if its delay has elapsed
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            // Stale revisions are superseded by a later trigger
            Some(revision) if revision == self.buffer.revision() => {
                self.refresh();
                true
            }
            _ => false,
        }
    }

    pub fn toggle_view(&mut self) {
        self.view = self.view.toggle();
        self.scroll = 0;
        self.refresh();
    }

    /// Switch to the next language with a grammar
    pub fn cycle_language(&mut self) {
        let languages: Vec<Language> = Language::all()
            .into_iter()
            .filter(|lang| *lang != Language::MarkdownInline)
            .collect();
        let current = languages
            .iter()
            .position(|lang| *lang == self.language)
            .unwrap_or(0);
        self.language = languages[(current + 1) % languages.len()];
        self.message = Some(format!("language: {}", self.language));
        self.refresh();
    }

    /// Re-run the config and rebuild widgets from scratch
    pub fn reload_config(&mut self) {
        match self.scripts.reload() {
            Ok(settings) => {
                self.debouncer.set_delay(settings.debounce());
                self.pipeline.apply_settings(settings);
                self.message = Some(format!(
                    "config reloaded, {} widgets",
                    self.pipeline.widgets().len()
                ));
            }
            Err(err) => {
                warn!(target: "playground", "config reload failed: {}", err);
                self.message = Some(err.to_string());
            }
        }
        self.refresh();
    }

    /// Parse the buffer and rebuild the output pane
    pub fn refresh(&mut self) {
        let source = self.buffer.text();
        let theme = self.pipeline.theme().clone();
        let error_style = SpanStyle::fg(theme.tree_error);

        self.output = match self.view {
            ViewMode::Tree => match self.pipeline.syntax_tree(self.language, &source) {
                Ok(root) => {
                    let rows = tree_rows(&root, self.pipeline.settings().show_anonymous);
                    tree_lines(&rows, &theme)
                }
                Err(err) => vec![StyledLine::new(err.to_string(), error_style)],
            },
            ViewMode::Markdown if self.language != Language::Markdown => vec![StyledLine::new(
                format!("{} is not Markdown; press Tab for the tree", self.language),
                error_style,
            )],
            ViewMode::Markdown => match self.pipeline.render_markdown(&source) {
                Ok(view) => {
                    let mut lines = layout(&view.unit, self.output_width, &theme);
                    if let InlineLayer::Rejected(err) = &view.layered.inline {
                        lines.push(StyledLine::new(err.to_string(), error_style));
                    }
                    lines
                }
                Err(err) => vec![StyledLine::new(err.to_string(), error_style)],
            },
        };
        self.rendered_revision = Some(self.buffer.revision());
        debug!(target: "playground", lines = self.output.len(), "output refreshed");
    }

    /// Revision the output pane was built from
    pub fn rendered_revision(&self) -> Option<u64> {
        self.rendered_revision
    }

    pub fn scroll_down(&mut self) {
        if self.scroll + 1 < self.output.len() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}
