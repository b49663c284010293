//! Projection of syntax trees into render trees, and their presentation

mod markdown;
mod project;
pub mod terminal;
mod tree_view;
mod unit;
mod widgets;

pub use markdown::{
    TableData, code_block, extract_table, heading_level, heading_size, heading_text,
    list_bullet, marker_level, quote_text, register_markdown_widgets,
};
pub use project::{MAX_PROJECTION_DEPTH, NodeKind, Projector, project};
pub use tree_view::{TreeRow, format_tree, tree_rows};
pub use unit::{BODY_SIZE, RenderUnit, RuleStyle, TextBlock, TextStyle};
pub use widgets::{WidgetFactory, WidgetRegistry};
