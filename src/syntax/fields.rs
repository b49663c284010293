//! Per-grammar field table
//!
//! A node's field name is the first field id (in ascending order) whose
//! `child_by_field_id` on the parent returns that node. The id/name table is
//! built once per grammar, and resolution is done once per parent for all of
//! its children instead of once per child.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    fields: Vec<(u16, String)>,
}

impl FieldTable {
    pub fn new(language: &tree_sitter::Language) -> Self {
        let count = language.field_count();
        let fields = (1..=count)
            .filter_map(|id| u16::try_from(id).ok())
            .filter_map(|id| {
                language
                    .field_name_for_id(id)
                    .map(|name| (id, name.to_string()))
            })
            .collect();
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in id order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, name)| name.as_str())
    }

    /// Field names of `parent`'s children, keyed by child node id
    pub fn child_fields(&self, parent: tree_sitter::Node<'_>) -> HashMap<usize, &str> {
        let mut resolved = HashMap::new();
        for (id, name) in &self.fields {
            if let Some(child) = parent.child_by_field_id(*id) {
                resolved.entry(child.id()).or_insert(name.as_str());
            }
        }
        resolved
    }

    /// Field name of a single node, looked up through its parent
    pub fn field_name_of(&self, node: tree_sitter::Node<'_>) -> Option<&str> {
        let parent = node.parent()?;
        self.fields.iter().find_map(|(id, name)| {
            parent
                .child_by_field_id(*id)
                .filter(|child| *child == node)
                .map(|_| name.as_str())
        })
    }
}
