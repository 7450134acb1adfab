//! # Drag-and-Drop Intent Resolver
//!
//! Translates a (dragged, target, drop half) triple into a structural
//! intent, using the level delta `dragged.level - target.level` as the
//! discriminant:
//!
//! - delta 0: sibling reorder next to the target, per drop half
//! - delta +1: the target adopts the dragged node (appended, half ignored)
//! - delta -1: the dragged node moves next to the target's parent
//! - anything else: rejected, the gap is too large to interpret
//!
//! This is a pure function over the tree. It performs no mutation and knows
//! nothing about rendering; the embedding layer executes the resolved
//! intent through [`BomTree::apply`].

use crate::{BomTree, NodeId, TreeError, TreeMutation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which half of the target row the pointer was released on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropHalf {
    Before,
    After,
}

/// Resolved structural intent of a drop gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragIntent {
    /// Dropped onto itself: ignore silently, no warning, no change record.
    Ignore,

    /// Same level: reorder next to `anchor` under its parent.
    Reorder {
        dragged: NodeId,
        anchor: NodeId,
        half: DropHalf,
    },

    /// One level below the target: the target becomes the parent.
    Adopt { dragged: NodeId, parent: NodeId },

    /// One level above the target: move next to the target's parent.
    Promote {
        dragged: NodeId,
        uncle: NodeId,
        half: DropHalf,
    },
}

impl DragIntent {
    /// The mutation realizing this intent, `None` for [`DragIntent::Ignore`].
    pub fn into_mutation(self) -> Option<TreeMutation> {
        match self {
            DragIntent::Ignore => None,
            DragIntent::Reorder {
                dragged,
                anchor,
                half,
            } => Some(relative_move(dragged, anchor, half)),
            DragIntent::Adopt { dragged, parent } => Some(TreeMutation::MoveAsChild {
                id: dragged,
                parent,
            }),
            DragIntent::Promote {
                dragged,
                uncle,
                half,
            } => Some(relative_move(dragged, uncle, half)),
        }
    }
}

fn relative_move(id: NodeId, anchor: NodeId, half: DropHalf) -> TreeMutation {
    match half {
        DropHalf::Before => TreeMutation::MoveBefore {
            id,
            before: anchor,
            level: None,
            parent: None,
        },
        DropHalf::After => TreeMutation::MoveAfter {
            id,
            after: Some(anchor),
            level: None,
            parent: None,
        },
    }
}

/// Resolves a drop gesture into an intent, or rejects it.
///
/// Rejections carry a user-facing message; the caller surfaces it as a
/// warning and records nothing.
pub fn resolve_drag_intent(
    tree: &BomTree,
    dragged: NodeId,
    target: NodeId,
    half: DropHalf,
) -> Result<DragIntent, TreeError> {
    let dragged_node = tree.get(dragged).ok_or(TreeError::UnknownNode(dragged))?;
    let target_node = tree.get(target).ok_or(TreeError::UnknownNode(target))?;

    if dragged == target {
        return Ok(DragIntent::Ignore);
    }

    if is_descendant(tree, target, dragged) {
        warn!(%dragged, %target, "drop target inside dragged subtree");
        return Err(TreeError::CircularReference);
    }

    let dragged_level = dragged_node.level;
    let target_level = target_node.level;
    let delta = i64::from(dragged_level) - i64::from(target_level);

    let (intent, destination_level) = match delta {
        0 => (
            DragIntent::Reorder {
                dragged,
                anchor: target,
                half,
            },
            target_level,
        ),
        1 => (
            DragIntent::Adopt {
                dragged,
                parent: target,
            },
            target_level + 1,
        ),
        -1 => {
            let uncle = target_node.parent.ok_or_else(|| {
                TreeError::IllegalLevelTransition(
                    "cannot promote above the root level".to_string(),
                )
            })?;
            (
                DragIntent::Promote {
                    dragged,
                    uncle,
                    half,
                },
                target_level - 1,
            )
        }
        _ => {
            return Err(TreeError::IllegalLevelTransition(format!(
                "level gap of {} between dragged item (level {}) and target (level {})",
                delta.abs(),
                dragged_level,
                target_level
            )))
        }
    };

    // A parent with children may not end up nested deeper than it already is.
    if !dragged_node.children.is_empty() && destination_level > dragged_level {
        return Err(TreeError::IllegalLevelTransition(format!(
            "\"{}\" has children and cannot move below level {}",
            dragged_node.label(),
            dragged_level
        )));
    }

    debug!(%dragged, %target, ?half, ?intent, "resolved drop intent");
    Ok(intent)
}

/// True when `node` sits anywhere inside `ancestor`'s subtree.
fn is_descendant(tree: &BomTree, node: NodeId, ancestor: NodeId) -> bool {
    let mut cursor = tree.get(node).and_then(|n| n.parent);
    while let Some(id) = cursor {
        if id == ancestor {
            return true;
        }
        cursor = tree.get(id).and_then(|n| n.parent);
    }
    false
}
