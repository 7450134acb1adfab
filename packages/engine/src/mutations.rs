//! # Mutation Operations
//!
//! High-level structural operations on a BOM tree.
//!
//! ## Semantics
//!
//! - **Validated**: precondition checks (existence, cycles) run before any
//!   structural change. A failed mutation leaves the tree untouched.
//! - **Atomic**: each mutation runs to completion before the caller sees
//!   the new state. There is no partial application and no rollback.
//! - **Levelled**: every successful structural mutation ends with a level
//!   recompute over the affected subtree.
//! - **Observable**: applied mutations that change the tree produce one
//!   [`ChangeEvent`] for the change-tracking collaborator. Ignored no-ops
//!   (indent with no preceding sibling, outdent on a root, moves relative
//!   to self) produce [`MutationOutcome::Noop`] and no event.

use crate::clipboard::{subtree_outline, ClipboardEntry};
use crate::levels::{recompute_levels, would_create_cycle};
use crate::{BomTree, Fields, NodeArena, NodeId, OutlineNode, TreeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// What kind of change a mutation produced, for the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    Move,
    Import,
}

/// Structural facts about one node at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub parent: Option<NodeId>,
    pub level: u32,
    pub fields: Fields,
}

/// Description of one applied change, handed to the change-tracking
/// collaborator. The engine composes `description`; storage, attribution
/// and rendering belong to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub node: Option<NodeId>,
    pub before: Option<NodeState>,
    pub after: Option<NodeState>,
    pub description: String,
}

/// The full structural operation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeMutation {
    /// Append a new root at the end of the root list.
    InsertRoot { fields: Fields },

    /// Insert at the same level as `after`, immediately following it.
    /// With `after: None` this appends a new root instead.
    InsertSibling {
        after: Option<NodeId>,
        fields: Fields,
    },

    /// Append as the last child of `parent`.
    InsertChild { parent: NodeId, fields: Fields },

    /// In-place cell edit of a single field.
    UpdateField {
        id: NodeId,
        field: String,
        value: Value,
    },

    /// Remove the node and its entire subtree.
    Delete { id: NodeId },

    /// Re-parent under the immediately preceding sibling. No preceding
    /// sibling is a silent no-op.
    Indent { id: NodeId },

    /// Re-parent next to the current parent, one level up. Roots are a
    /// silent no-op.
    Outdent { id: NodeId },

    /// Relocate to sit immediately before `before`. The destination parent
    /// is `parent` when given (cycle checked), otherwise `before`'s parent.
    /// `level` is advisory and only flows into the change description.
    MoveBefore {
        id: NodeId,
        before: NodeId,
        level: Option<u32>,
        parent: Option<NodeId>,
    },

    /// Relocate to sit immediately after `after`; `after: None` moves to
    /// the front of the root list (or of `parent`'s children when given).
    MoveAfter {
        id: NodeId,
        after: Option<NodeId>,
        level: Option<u32>,
        parent: Option<NodeId>,
    },

    /// Re-parent as the last child of `parent`, cycle checked.
    MoveAsChild { id: NodeId, parent: NodeId },

    /// Deep-clone with fresh ids, inserted as the next sibling of the
    /// source. Copied part numbers get a `-COPY` suffix.
    Duplicate { id: NodeId, include_children: bool },

    /// Overwrite the clipboard slot with a deep copy. Does not change the
    /// tree.
    CopyToClipboard { id: NodeId, include_children: bool },

    /// Insert the clipboard contents near `target`: as its child when
    /// `force_level_change` is set and the target is a leaf, as its next
    /// sibling otherwise. Fresh ids throughout; the slot is not consumed.
    PasteFromClipboard {
        target: NodeId,
        force_level_change: bool,
    },

    /// Replace the whole tree from hierarchical outline data (bulk import).
    ReplaceAll { outline: Vec<OutlineNode> },
}

/// Result of [`BomTree::apply`]. Rejections are `Err(TreeError)`.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The mutation ran. `node` is the created or affected node, `change`
    /// the event for the change log (absent for clipboard copies, which
    /// leave the tree untouched).
    Applied {
        node: Option<NodeId>,
        change: Option<ChangeEvent>,
    },
    /// Ignored without touching the tree. Not an error.
    Noop,
}

impl MutationOutcome {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            MutationOutcome::Applied { node, .. } => *node,
            MutationOutcome::Noop => None,
        }
    }

    pub fn change(&self) -> Option<&ChangeEvent> {
        match self {
            MutationOutcome::Applied { change, .. } => change.as_ref(),
            MutationOutcome::Noop => None,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, MutationOutcome::Noop)
    }

    fn changed(node: NodeId, change: ChangeEvent) -> Self {
        MutationOutcome::Applied {
            node: Some(node),
            change: Some(change),
        }
    }
}

impl BomTree {
    /// Applies a mutation, validating before any structural change.
    pub fn apply(&mut self, mutation: TreeMutation) -> Result<MutationOutcome, TreeError> {
        debug!(?mutation, "applying tree mutation");

        let outcome = match mutation {
            TreeMutation::InsertRoot { fields } => self.insert_root(fields),
            TreeMutation::InsertSibling { after, fields } => self.insert_sibling(after, fields),
            TreeMutation::InsertChild { parent, fields } => self.insert_child(parent, fields),
            TreeMutation::UpdateField { id, field, value } => self.update_field(id, &field, value),
            TreeMutation::Delete { id } => self.delete(id),
            TreeMutation::Indent { id } => self.indent(id),
            TreeMutation::Outdent { id } => self.outdent(id),
            TreeMutation::MoveBefore {
                id,
                before,
                level,
                parent,
            } => self.move_before(id, before, level, parent),
            TreeMutation::MoveAfter {
                id,
                after,
                level,
                parent,
            } => self.move_after(id, after, level, parent),
            TreeMutation::MoveAsChild { id, parent } => self.move_as_child(id, parent),
            TreeMutation::Duplicate {
                id,
                include_children,
            } => self.duplicate(id, include_children),
            TreeMutation::CopyToClipboard {
                id,
                include_children,
            } => self.copy_to_clipboard(id, include_children),
            TreeMutation::PasteFromClipboard {
                target,
                force_level_change,
            } => self.paste_from_clipboard(target, force_level_change),
            TreeMutation::ReplaceAll { outline } => self.replace_all(&outline),
        }?;

        if outcome.change().is_some() {
            self.bump_version();
        }

        Ok(outcome)
    }

    fn state_of(&self, id: NodeId) -> Option<NodeState> {
        self.arena.get(id).map(|n| NodeState {
            parent: n.parent,
            level: n.level,
            fields: n.fields.clone(),
        })
    }

    fn label_of(&self, id: NodeId) -> String {
        self.arena
            .get(id)
            .map(|n| n.label())
            .unwrap_or_else(|| id.to_string())
    }

    fn insert_root(&mut self, fields: Fields) -> Result<MutationOutcome, TreeError> {
        let id = self.arena.allocate(fields, None, None)?;
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Create,
            node: Some(id),
            before: None,
            after: self.state_of(id),
            description: format!("added root \"{}\"", self.label_of(id)),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn insert_sibling(
        &mut self,
        after: Option<NodeId>,
        fields: Fields,
    ) -> Result<MutationOutcome, TreeError> {
        let anchor = match after {
            Some(a) => a,
            None => return self.insert_root(fields),
        };

        let parent = self.arena.require(anchor)?.parent;
        let at = self.arena.position_of(anchor).map(|p| p + 1);
        let anchor_label = self.label_of(anchor);

        let id = self.arena.allocate(fields, parent, at)?;
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Create,
            node: Some(id),
            before: None,
            after: self.state_of(id),
            description: format!(
                "added \"{}\" next to \"{}\"",
                self.label_of(id),
                anchor_label
            ),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn insert_child(&mut self, parent: NodeId, fields: Fields) -> Result<MutationOutcome, TreeError> {
        let parent_label = self
            .arena
            .get(parent)
            .map(|n| n.label())
            .ok_or(TreeError::InvalidParent(parent))?;

        let id = self.arena.allocate(fields, Some(parent), None)?;
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Create,
            node: Some(id),
            before: None,
            after: self.state_of(id),
            description: format!("added \"{}\" under \"{}\"", self.label_of(id), parent_label),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn update_field(
        &mut self,
        id: NodeId,
        field: &str,
        value: Value,
    ) -> Result<MutationOutcome, TreeError> {
        self.arena.require(id)?;
        let before = self.state_of(id);
        let label = self.label_of(id);

        let old = {
            let node = self.arena.get_mut(id).expect("checked above");
            node.fields.insert(field.to_string(), value.clone())
        };

        let change = ChangeEvent {
            kind: ChangeKind::Update,
            node: Some(id),
            before,
            after: self.state_of(id),
            description: format!(
                "changed {} of \"{}\" from {} to {}",
                field,
                label,
                show(old.as_ref()),
                show(Some(&value))
            ),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn delete(&mut self, id: NodeId) -> Result<MutationOutcome, TreeError> {
        let before = self.state_of(id).ok_or(TreeError::UnknownNode(id))?;
        let label = self.label_of(id);
        let had_children = !self.arena.require(id)?.children.is_empty();

        self.arena.remove(id)?;

        let description = if had_children {
            format!("deleted \"{}\" and its subtree", label)
        } else {
            format!("deleted \"{}\"", label)
        };
        let change = ChangeEvent {
            kind: ChangeKind::Delete,
            node: Some(id),
            before: Some(before),
            after: None,
            description,
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn indent(&mut self, id: NodeId) -> Result<MutationOutcome, TreeError> {
        self.arena.require(id)?;
        let new_parent = match self.arena.preceding_sibling(id) {
            Some(p) => p,
            None => return Ok(MutationOutcome::Noop),
        };

        let before = self.state_of(id);
        let label = self.label_of(id);
        let parent_label = self.label_of(new_parent);

        self.arena.reparent(id, Some(new_parent), None)?;
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Move,
            node: Some(id),
            before,
            after: self.state_of(id),
            description: format!("made \"{}\" a child of \"{}\"", label, parent_label),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn outdent(&mut self, id: NodeId) -> Result<MutationOutcome, TreeError> {
        let parent = match self.arena.require(id)?.parent {
            Some(p) => p,
            None => return Ok(MutationOutcome::Noop),
        };

        let grandparent = self.arena.require(parent)?.parent;
        let at = self.arena.position_of(parent).map(|p| p + 1);
        let before = self.state_of(id);
        let label = self.label_of(id);
        let parent_label = self.label_of(parent);

        self.arena.reparent(id, grandparent, at)?;
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Move,
            node: Some(id),
            before,
            after: self.state_of(id),
            description: format!("promoted \"{}\" next to \"{}\"", label, parent_label),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    /// Destination parent for a relative move: the explicit parent when
    /// given, otherwise the anchor's parent. Cycle-checked either way.
    fn resolve_destination(
        &self,
        id: NodeId,
        explicit: Option<NodeId>,
        anchor: Option<NodeId>,
    ) -> Result<Option<NodeId>, TreeError> {
        let dest = match explicit {
            Some(p) => {
                if !self.arena.contains(p) {
                    return Err(TreeError::InvalidParent(p));
                }
                Some(p)
            }
            None => match anchor {
                Some(a) => self.arena.require(a)?.parent,
                None => None,
            },
        };

        if let Some(p) = dest {
            if would_create_cycle(&self.arena, id, p) {
                return Err(TreeError::CircularReference);
            }
        }

        Ok(dest)
    }

    fn move_before(
        &mut self,
        id: NodeId,
        anchor: NodeId,
        level: Option<u32>,
        parent: Option<NodeId>,
    ) -> Result<MutationOutcome, TreeError> {
        self.arena.require(id)?;
        self.arena.require(anchor)?;
        if id == anchor {
            return Ok(MutationOutcome::Noop);
        }

        let dest = self.resolve_destination(id, parent, Some(anchor))?;
        let before = self.state_of(id);
        let label = self.label_of(id);
        let anchor_label = self.label_of(anchor);

        self.arena.reparent(id, dest, None)?;
        if self.arena.get(anchor).map(|n| n.parent) == Some(dest) {
            let pos = self.arena.position_of(anchor).expect("anchor is attached");
            self.arena.move_in_order(id, pos)?;
        } else {
            // Anchor lives elsewhere (explicit parent given): go first.
            self.arena.move_in_order(id, 0)?;
        }
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Move,
            node: Some(id),
            before: before.clone(),
            after: self.state_of(id),
            description: move_description(&label, before.as_ref(), level, Some(anchor_label.as_str()), "before"),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn move_after(
        &mut self,
        id: NodeId,
        anchor: Option<NodeId>,
        level: Option<u32>,
        parent: Option<NodeId>,
    ) -> Result<MutationOutcome, TreeError> {
        self.arena.require(id)?;
        if anchor == Some(id) {
            return Ok(MutationOutcome::Noop);
        }

        let dest = self.resolve_destination(id, parent, anchor)?;
        let before = self.state_of(id);
        let label = self.label_of(id);
        let anchor_label = anchor.map(|a| self.label_of(a));

        self.arena.reparent(id, dest, None)?;
        match anchor {
            Some(a) if self.arena.get(a).map(|n| n.parent) == Some(dest) => {
                let pos = self.arena.position_of(a).expect("anchor is attached");
                self.arena.move_in_order(id, pos + 1)?;
            }
            Some(_) => {} // anchor in another list: stay appended
            None => self.arena.move_in_order(id, 0)?,
        }
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Move,
            node: Some(id),
            before: before.clone(),
            after: self.state_of(id),
            description: move_description(&label, before.as_ref(), level, anchor_label.as_deref(), "after"),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn move_as_child(&mut self, id: NodeId, parent: NodeId) -> Result<MutationOutcome, TreeError> {
        self.arena.require(id)?;
        if !self.arena.contains(parent) {
            return Err(TreeError::InvalidParent(parent));
        }
        if would_create_cycle(&self.arena, id, parent) {
            return Err(TreeError::CircularReference);
        }

        let before = self.state_of(id);
        let label = self.label_of(id);
        let parent_label = self.label_of(parent);

        self.arena.reparent(id, Some(parent), None)?;
        recompute_levels(&mut self.arena, id);

        let change = ChangeEvent {
            kind: ChangeKind::Move,
            node: Some(id),
            before,
            after: self.state_of(id),
            description: format!("moved \"{}\" under \"{}\"", label, parent_label),
        };
        Ok(MutationOutcome::changed(id, change))
    }

    fn duplicate(
        &mut self,
        id: NodeId,
        include_children: bool,
    ) -> Result<MutationOutcome, TreeError> {
        let source = self.arena.require(id)?;
        let parent = source.parent;
        let with_subtree = include_children && !source.children.is_empty();
        let label = source.label();

        let mut outline = subtree_outline(&self.arena, id, include_children);
        mark_as_copy(&mut outline);

        let at = self.arena.position_of(id).map(|p| p + 1);
        let new_id = self.graft_outline(&outline, parent, at);
        recompute_levels(&mut self.arena, new_id);

        let description = if with_subtree {
            format!("duplicated \"{}\" and its subtree", label)
        } else {
            format!("duplicated \"{}\"", label)
        };
        let change = ChangeEvent {
            kind: ChangeKind::Create,
            node: Some(new_id),
            before: None,
            after: self.state_of(new_id),
            description,
        };
        Ok(MutationOutcome::changed(new_id, change))
    }

    fn copy_to_clipboard(
        &mut self,
        id: NodeId,
        include_children: bool,
    ) -> Result<MutationOutcome, TreeError> {
        let entry = ClipboardEntry::capture(&self.arena, id, include_children)?;
        self.clipboard = Some(entry);

        Ok(MutationOutcome::Applied {
            node: Some(id),
            change: None,
        })
    }

    fn paste_from_clipboard(
        &mut self,
        target: NodeId,
        force_level_change: bool,
    ) -> Result<MutationOutcome, TreeError> {
        let entry = self.clipboard.clone().ok_or(TreeError::EmptyClipboard)?;
        let target_node = self.arena.require(target)?;
        let target_label = target_node.label();

        // Destination depends on the TARGET's leaf-ness, not on what was
        // copied. See DESIGN.md for why this asymmetry is intentional.
        let as_child = force_level_change && target_node.is_leaf();
        let (parent, at) = if as_child {
            (Some(target), None)
        } else {
            (target_node.parent, self.arena.position_of(target).map(|p| p + 1))
        };

        let new_id = self.graft_outline(&entry.item, parent, at);
        recompute_levels(&mut self.arena, new_id);

        let description = if as_child {
            format!("pasted \"{}\" under \"{}\"", self.label_of(new_id), target_label)
        } else {
            format!("pasted \"{}\" after \"{}\"", self.label_of(new_id), target_label)
        };
        let change = ChangeEvent {
            kind: ChangeKind::Create,
            node: Some(new_id),
            before: None,
            after: self.state_of(new_id),
            description,
        };
        Ok(MutationOutcome::changed(new_id, change))
    }

    fn replace_all(&mut self, outline: &[OutlineNode]) -> Result<MutationOutcome, TreeError> {
        let count: usize = outline.iter().map(OutlineNode::node_count).sum();

        self.arena = NodeArena::new();
        for item in outline {
            let root = self.graft_outline(item, None, None);
            recompute_levels(&mut self.arena, root);
        }

        let change = ChangeEvent {
            kind: ChangeKind::Import,
            node: None,
            before: None,
            after: None,
            description: format!("imported {} items", count),
        };
        Ok(MutationOutcome::Applied {
            node: None,
            change: Some(change),
        })
    }
}

fn move_description(
    label: &str,
    before: Option<&NodeState>,
    advisory_level: Option<u32>,
    anchor_label: Option<&str>,
    direction: &str,
) -> String {
    if let (Some(lv), Some(before)) = (advisory_level, before) {
        if lv != before.level {
            return format!(
                "moved \"{}\" from level {} to level {}",
                label, before.level, lv
            );
        }
    }
    match anchor_label {
        Some(anchor) => format!("moved \"{}\" {} \"{}\"", label, direction, anchor),
        None => format!("moved \"{}\" to the front", label),
    }
}

fn mark_as_copy(outline: &mut OutlineNode) {
    if let Some(Value::String(s)) = outline.fields.get_mut("partNumber") {
        s.push_str("-COPY");
    }
    if let Some(Value::String(s)) = outline.fields.get_mut("partName") {
        s.push_str(" (copy)");
    }
    for child in &mut outline.children {
        mark_as_copy(child);
    }
}

fn show(value: Option<&Value>) -> String {
    match value {
        None => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
