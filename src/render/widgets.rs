//! Widget factory registry
//!
//! Maps a node type tag to the function that renders it. Entries are
//! consulted before any built-in rule, so registering a tag overrides how that
//! node type is projected.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::unit::RenderUnit;
use crate::syntax::Node;

/// Renders one node given the full source it was parsed from
pub type WidgetFactory = Arc<dyn Fn(&Node, &str) -> RenderUnit + Send + Sync>;

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    factories: HashMap<String, WidgetFactory>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; the last registration for a tag wins
    pub fn register<F>(&mut self, node_type: impl Into<String>, factory: F)
    where
        F: Fn(&Node, &str) -> RenderUnit + Send + Sync + 'static,
    {
        let node_type = node_type.into();
        if node_type.is_empty() {
            debug!(target: "render", "ignoring widget registration with empty node type");
            return;
        }
        if self
            .factories
            .insert(node_type.clone(), Arc::new(factory))
            .is_some()
        {
            debug!(target: "render", node_type = %node_type, "replaced widget factory");
        }
    }

    pub fn unregister(&mut self, node_type: &str) -> bool {
        self.factories.remove(node_type).is_some()
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.factories.contains_key(node_type)
    }

    pub fn get(&self, node_type: &str) -> Option<&WidgetFactory> {
        self.factories.get(node_type)
    }

    /// Render `node` with the factory for `node_type`
    ///
    /// Without a registered factory this returns an "Unknown Node Type"
    /// placeholder rather than nothing.
    pub fn create(&self, node_type: &str, node: &Node, source: &str) -> RenderUnit {
        match self.factories.get(node_type) {
            Some(factory) => factory(node, source),
            None => RenderUnit::unknown(node_type),
        }
    }

    pub fn clear(&mut self) {
        self.factories.clear();
    }

    /// Clear the registry, then let `populate` register the new set
    pub fn reload(&mut self, populate: impl FnOnce(&mut Self)) {
        self.clear();
        populate(self);
        debug!(target: "render", widgets = self.len(), "widget registry reloaded");
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered node types, sorted
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("node_types", &self.node_types())
            .finish()
    }
}
