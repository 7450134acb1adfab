//! Node records and identifiers.
//!
//! Nodes reference each other by id only (`parent`, `children`), never by
//! embedded pointers. The arena owns every record; everything else borrows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque node identifier, unique within one arena and stable for the
/// node's lifetime. Only [`crate::NodeArena`] allocates these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Field name to value mapping for one BOM line item. Opaque to the tree
/// engine apart from the display-label peek in [`Node::label`].
pub type Fields = BTreeMap<String, Value>;

/// A single BOM line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Owning parent, `None` for a root.
    pub parent: Option<NodeId>,
    /// Depth invariant: `level == parent.level + 1`, roots are 0.
    pub level: u32,
    /// Ordered child ids. Order is semantically meaningful (BOM order).
    pub children: Vec<NodeId>,
    pub fields: Fields,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Display label for change descriptions: part name, else part number,
    /// else the id.
    pub fn label(&self) -> String {
        for key in ["partName", "partNumber"] {
            if let Some(Value::String(s)) = self.fields.get(key) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
        self.id.to_string()
    }
}

/// Hierarchical node data without identity: the shape shared by clipboard
/// entries and bulk import. Ids are substituted when the outline is
/// materialized into an arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub fields: Fields,
    #[serde(default)]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this outline, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(OutlineNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_prefers_part_name() {
        let mut fields = Fields::new();
        fields.insert("partNumber".to_string(), json!("G4FG-11100-A"));
        fields.insert("partName".to_string(), json!("CYLINDER BLOCK"));

        let node = Node {
            id: NodeId(7),
            parent: None,
            level: 0,
            children: vec![],
            fields,
        };

        assert_eq!(node.label(), "CYLINDER BLOCK");
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let node = Node {
            id: NodeId(3),
            parent: None,
            level: 0,
            children: vec![],
            fields: Fields::new(),
        };

        assert_eq!(node.label(), "n3");
    }

    #[test]
    fn test_outline_node_count() {
        let mut outline = OutlineNode::new(Fields::new());
        outline.children.push(OutlineNode::new(Fields::new()));
        outline.children.push(OutlineNode::new(Fields::new()));
        outline.children[0]
            .children
            .push(OutlineNode::new(Fields::new()));

        assert_eq!(outline.node_count(), 4);
    }
}
