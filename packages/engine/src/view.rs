//! # Flattened View Projector
//!
//! Pure projection of the tree into the ordered row sequence a grid
//! renders. Expansion state is UI-session-scoped and lives beside the
//! tree, never inside it; this module has no write access to the tree.
//!
//! The search filter is applied per row over the expansion-aware flattened
//! list. Ancestors of matches are NOT auto-expanded, so matches inside a
//! collapsed subtree stay hidden. That mirrors the shipped behavior and is
//! flagged as an open UX question in DESIGN.md.

use crate::{BomTree, Fields, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Which nodes are currently expanded, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpansionState {
    expanded: HashSet<NodeId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn expand(&mut self, id: NodeId) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: NodeId) {
        self.expanded.remove(&id);
    }

    pub fn toggle(&mut self, id: NodeId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    /// Expands every node that has children.
    pub fn expand_all(&mut self, tree: &BomTree) {
        self.expanded = tree
            .nodes()
            .filter(|n| !n.children.is_empty())
            .map(|n| n.id)
            .collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Expands exactly the nodes with children whose `level < n`, so rows
    /// down to level `n` become visible.
    pub fn expand_to_level(&mut self, tree: &BomTree, n: u32) {
        self.expanded = tree
            .nodes()
            .filter(|node| node.level < n && !node.children.is_empty())
            .map(|node| node.id)
            .collect();
    }

    /// Collapses everything at `n` and deeper, keeping shallower expansion.
    pub fn collapse_from_level(&mut self, tree: &BomTree, n: u32) {
        self.expanded
            .retain(|id| tree.get(*id).map(|node| node.level < n).unwrap_or(false));
    }

    /// Drops ids that no longer exist, after deletes or imports.
    pub fn prune(&mut self, tree: &BomTree) {
        self.expanded.retain(|id| tree.contains(*id));
    }
}

/// One visible grid row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    pub id: NodeId,
    pub level: u32,
    pub fields: &'a Fields,
    pub has_children: bool,
    pub is_expanded: bool,
}

/// Pre-order flatten of the visible tree: a node's children are emitted
/// only while the node is expanded. A non-empty `search` then filters rows
/// by case-insensitive containment over their field values.
pub fn project<'a>(
    tree: &'a BomTree,
    expansion: &ExpansionState,
    search: Option<&str>,
) -> Vec<Row<'a>> {
    let mut rows = Vec::new();
    let mut stack: Vec<NodeId> = tree.roots().iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        let node = match tree.get(id) {
            Some(n) => n,
            None => continue,
        };

        let is_expanded = expansion.is_expanded(id);
        rows.push(Row {
            id,
            level: node.level,
            fields: &node.fields,
            has_children: !node.children.is_empty(),
            is_expanded,
        });

        if is_expanded {
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
    }

    match search {
        Some(term) if !term.is_empty() => {
            let needle = term.to_lowercase();
            rows.retain(|row| matches_search(row.fields, &needle));
            rows
        }
        _ => rows,
    }
}

fn matches_search(fields: &Fields, needle: &str) -> bool {
    fields.values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Null => false,
        other => other.to_string().to_lowercase().contains(needle),
    })
}
