//! # BOM Tree
//!
//! The aggregate the rest of the engine operates on: arena storage plus the
//! clipboard slot, owned per instance so independent trees (and tests)
//! never interfere through ambient state.
//!
//! All structural edits go through [`BomTree::apply`] in
//! [`crate::mutations`]; this module holds construction, read access and
//! the snapshot pair the persistence collaborator uses.

use crate::clipboard::{subtree_outline, ClipboardEntry};
use crate::levels::{recompute_levels, validate, Violation};
use crate::{Node, NodeArena, NodeId, OutlineNode};

/// An editable BOM tree.
#[derive(Debug, Clone, Default)]
pub struct BomTree {
    pub(crate) arena: NodeArena,
    pub(crate) clipboard: Option<ClipboardEntry>,
    version: u64,
}

impl BomTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from hierarchical outline data, roots in order.
    pub fn from_outline(items: &[OutlineNode]) -> Self {
        let mut tree = Self::new();
        for item in items {
            let root = tree.graft_outline(item, None, None);
            recompute_levels(&mut tree.arena, root);
        }
        tree
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Ordered root ids.
    pub fn roots(&self) -> &[NodeId] {
        self.arena.roots()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.arena.iter()
    }

    /// Deepest level present, 0 for an empty tree.
    pub fn max_level(&self) -> u32 {
        self.nodes().map(|n| n.level).max().unwrap_or(0)
    }

    /// Current clipboard contents, if anything was copied.
    pub fn clipboard(&self) -> Option<&ClipboardEntry> {
        self.clipboard.as_ref()
    }

    /// Monotonic edit counter, bumped once per applied mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Full consistency sweep, see [`crate::levels::validate`].
    pub fn check_consistency(&self) -> Vec<Violation> {
        validate(&self.arena)
    }

    /// Serializes the node map and root order. The clipboard and version
    /// are session state and stay out of the snapshot.
    pub fn snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.arena)
    }

    /// Rebuilds a tree from [`BomTree::snapshot`] output.
    pub fn restore(snapshot: &str) -> serde_json::Result<Self> {
        let arena: NodeArena = serde_json::from_str(snapshot)?;
        Ok(Self {
            arena,
            clipboard: None,
            version: 0,
        })
    }

    /// Captures `id` (optionally with subtree) as id-free outline data.
    pub fn outline_of(&self, id: NodeId, include_children: bool) -> Option<OutlineNode> {
        self.contains(id)
            .then(|| subtree_outline(&self.arena, id, include_children))
    }

    /// Materializes outline data under `parent` at `at`, allocating fresh
    /// ids throughout. Levels are the caller's responsibility.
    pub(crate) fn graft_outline(
        &mut self,
        outline: &OutlineNode,
        parent: Option<NodeId>,
        at: Option<usize>,
    ) -> NodeId {
        let id = self
            .arena
            .allocate(outline.fields.clone(), parent, at)
            .expect("graft under a known parent");
        for child in &outline.children {
            self.graft_outline(child, Some(id), None);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fields;
    use serde_json::json;

    fn outline(name: &str, children: Vec<OutlineNode>) -> OutlineNode {
        let mut fields = Fields::new();
        fields.insert("partName".to_string(), json!(name));
        OutlineNode { fields, children }
    }

    #[test]
    fn test_from_outline_builds_levelled_tree() {
        let tree = BomTree::from_outline(&[
            outline("ENGINE", vec![outline("BLOCK", vec![outline("LINER", vec![])])]),
            outline("TRANSMISSION", vec![]),
        ]);

        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.max_level(), 2);
        assert!(tree.check_consistency().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let tree = BomTree::from_outline(&[outline(
            "ENGINE",
            vec![outline("BLOCK", vec![]), outline("HEAD", vec![])],
        )]);

        let json = tree.snapshot().unwrap();
        let restored = BomTree::restore(&json).unwrap();

        assert_eq!(restored.len(), tree.len());
        assert_eq!(restored.roots(), tree.roots());
        assert!(restored.check_consistency().is_empty());

        let root = restored.roots()[0];
        assert_eq!(restored.get(root).unwrap().children.len(), 2);
    }
}
