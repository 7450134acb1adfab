//! Single-slot clipboard for copy and paste.
//!
//! The slot holds an id-free deep copy of a node, optionally with its
//! subtree. Fresh ids are allocated at paste time, so pasted nodes never
//! alias the source. Copy overwrites the slot; paste does not consume it,
//! so one copy can be pasted repeatedly.

use crate::{NodeArena, NodeId, OutlineNode, TreeError};
use serde::{Deserialize, Serialize};

/// Contents of the clipboard slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub item: OutlineNode,
    /// Whether the subtree was captured along with the node.
    pub include_children: bool,
}

impl ClipboardEntry {
    /// Deep-copies `id` (and its subtree when `include_children`) out of
    /// the arena.
    pub fn capture(
        arena: &NodeArena,
        id: NodeId,
        include_children: bool,
    ) -> Result<Self, TreeError> {
        arena.require(id)?;
        Ok(Self {
            item: subtree_outline(arena, id, include_children),
            include_children,
        })
    }
}

/// Id-free deep copy of `id` (and optionally its subtree) out of the arena.
pub(crate) fn subtree_outline(
    arena: &NodeArena,
    id: NodeId,
    include_children: bool,
) -> OutlineNode {
    let node = arena.get(id).expect("subtree copy: broken child link");
    let children = if include_children {
        node.children
            .iter()
            .map(|c| subtree_outline(arena, *c, true))
            .collect()
    } else {
        Vec::new()
    };

    OutlineNode {
        fields: node.fields.clone(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fields;
    use serde_json::json;

    fn named(name: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("partName".to_string(), json!(name));
        f
    }

    #[test]
    fn test_capture_without_children() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(named("A"), None, None).unwrap();
        arena.allocate(named("B"), Some(a), None).unwrap();

        let entry = ClipboardEntry::capture(&arena, a, false).unwrap();
        assert!(entry.item.children.is_empty());
        assert_eq!(entry.item.node_count(), 1);
    }

    #[test]
    fn test_capture_with_subtree() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(named("A"), None, None).unwrap();
        let b = arena.allocate(named("B"), Some(a), None).unwrap();
        arena.allocate(named("C"), Some(b), None).unwrap();

        let entry = ClipboardEntry::capture(&arena, a, true).unwrap();
        assert_eq!(entry.item.node_count(), 3);
        assert_eq!(entry.item.children[0].fields, named("B"));
    }

    #[test]
    fn test_capture_unknown_node_fails() {
        let arena = NodeArena::new();
        let err = ClipboardEntry::capture(&arena, NodeId(9), false).unwrap_err();
        assert!(matches!(err, TreeError::UnknownNode(_)));
    }
}
