//! # Tree Invariant Maintainer
//!
//! Keeps `level` correct and detects structural corruption.
//!
//! The cycle check is a precondition gate: mutations consult
//! [`would_create_cycle`] before committing any reparent. Nothing here rolls
//! back a partially applied change, because no mutation is ever partially
//! applied.

use crate::{NodeArena, NodeId};
use std::collections::HashSet;
use thiserror::Error;

/// Re-derives `level` for `from` and all of its descendants, walking down
/// from the (possibly new) parent's level + 1. O(size of affected subtree).
///
/// Calling this on an id that is not in the arena, or whose parent is not,
/// is a bug in the engine itself and panics.
pub fn recompute_levels(arena: &mut NodeArena, from: NodeId) {
    let base = {
        let node = arena.get(from).expect("recompute_levels: unknown node");
        match node.parent {
            Some(p) => {
                arena
                    .get(p)
                    .expect("recompute_levels: detached parent")
                    .level
                    + 1
            }
            None => 0,
        }
    };

    let mut stack = vec![(from, base)];
    while let Some((id, level)) = stack.pop() {
        let node = arena.get_mut(id).expect("recompute_levels: broken child link");
        node.level = level;
        for child in node.children.clone() {
            stack.push((child, level + 1));
        }
    }
}

/// True when attaching `candidate` under `new_parent` would make `candidate`
/// its own ancestor. Also true for `candidate == new_parent`.
pub fn would_create_cycle(arena: &NodeArena, candidate: NodeId, new_parent: NodeId) -> bool {
    if candidate == new_parent {
        return true;
    }

    let mut cursor = Some(new_parent);
    while let Some(id) = cursor {
        if id == candidate {
            return true;
        }
        cursor = arena.get(id).and_then(|n| n.parent);
    }

    false
}

/// A single consistency violation found by [`validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("{node} refers to missing parent {parent}")]
    DanglingParent { node: NodeId, parent: NodeId },

    #[error("{node} is its own ancestor")]
    CyclicAncestry { node: NodeId },

    #[error("{node} has level {actual}, expected {expected}")]
    WrongLevel {
        node: NodeId,
        actual: u32,
        expected: u32,
    },

    #[error("order list of {owner:?} disagrees with parent links")]
    OrderMismatch { owner: Option<NodeId> },
}

/// Full-tree consistency sweep. Test harness aid, not on the hot path.
///
/// Confirms that every parent reference resolves, that no node is its own
/// ancestor, that every level equals parent level + 1 (roots 0), and that
/// each order list (children, roots) holds exactly the ids whose parent is
/// the list owner, without duplicates.
pub fn validate(arena: &NodeArena) -> Vec<Violation> {
    let mut violations = Vec::new();
    let max_steps = arena.len();

    for node in arena.iter() {
        match node.parent {
            Some(p) if arena.get(p).is_none() => {
                violations.push(Violation::DanglingParent {
                    node: node.id,
                    parent: p,
                });
                continue;
            }
            _ => {}
        }

        // Ancestor walk, bounded so a corrupted parent loop still terminates.
        let mut cursor = node.parent;
        let mut steps = 0;
        let mut cyclic = false;
        while let Some(id) = cursor {
            if id == node.id || steps > max_steps {
                cyclic = true;
                break;
            }
            steps += 1;
            cursor = arena.get(id).and_then(|n| n.parent);
        }
        if cyclic {
            violations.push(Violation::CyclicAncestry { node: node.id });
            continue;
        }

        let expected = match node.parent {
            Some(p) => arena.get(p).map(|n| n.level + 1).unwrap_or(0),
            None => 0,
        };
        if node.level != expected {
            violations.push(Violation::WrongLevel {
                node: node.id,
                actual: node.level,
                expected,
            });
        }
    }

    let mut owners: Vec<Option<NodeId>> = vec![None];
    owners.extend(arena.node_ids().map(Some));

    for owner in owners {
        let order = arena.sibling_order(owner);
        let mut seen = HashSet::new();
        let mut broken = false;

        for entry in order {
            let consistent = seen.insert(*entry)
                && arena.get(*entry).map(|n| n.parent) == Some(owner);
            if !consistent {
                broken = true;
            }
        }

        // Reverse direction: every node claiming this owner must be listed.
        let claimed = arena.iter().filter(|n| n.parent == owner).count();
        if claimed != order.len() {
            broken = true;
        }

        if broken {
            violations.push(Violation::OrderMismatch { owner });
        }
    }

    violations
}
