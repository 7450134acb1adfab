//! # Bomgrid Engine
//!
//! In-memory tree-mutation engine for hierarchical bill-of-materials
//! editing: assemblies, sub-assemblies and parts in a levelled,
//! parent-indexed tree under arbitrary structural edits.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ arena: id → node map + ordered root list    │
//! │  - only allocator of node identities        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ mutations: insert / delete / indent /       │
//! │ outdent / move / duplicate / copy-paste     │
//! │  - validate before any structural change    │
//! │  - levels recomputed after every mutation   │
//! │  - one ChangeEvent per applied change       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ view: expansion-aware flattened row list    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Drag gestures go through [`resolve_drag_intent`], which maps the level
//! delta between dragged item and drop target onto a closed intent set
//! before any mutation runs.
//!
//! ## Core principles
//!
//! 1. **Arena storage**: nodes reference each other by id only, so the
//!    conceptually cyclic parent/child links stay plain data.
//! 2. **Invariants are transactional**: a child's level always equals its
//!    parent's level + 1 after every mutation, never left stale.
//! 3. **Precondition gates, not rollbacks**: cycle checks run before a
//!    reparent commits; no mutation is partially applied.
//! 4. **Single writer**: the engine is synchronous and single-threaded;
//!    embedders with real threads put one mutex around the whole tree.
//!
//! ## Usage
//!
//! ```rust
//! use bomgrid_engine::{BomTree, Fields, TreeMutation};
//!
//! let mut tree = BomTree::new();
//! let root = tree
//!     .apply(TreeMutation::InsertRoot { fields: Fields::new() })
//!     .unwrap()
//!     .node()
//!     .unwrap();
//! let child = tree
//!     .apply(TreeMutation::InsertChild { parent: root, fields: Fields::new() })
//!     .unwrap()
//!     .node()
//!     .unwrap();
//!
//! assert_eq!(tree.get(child).unwrap().level, 1);
//! ```

mod arena;
mod clipboard;
mod dragdrop;
mod errors;
mod levels;
mod mutations;
mod node;
mod tree;
mod view;

pub use arena::NodeArena;
pub use clipboard::ClipboardEntry;
pub use dragdrop::{resolve_drag_intent, DragIntent, DropHalf};
pub use errors::TreeError;
pub use levels::{recompute_levels, validate, would_create_cycle, Violation};
pub use mutations::{ChangeEvent, ChangeKind, MutationOutcome, NodeState, TreeMutation};
pub use node::{Fields, Node, NodeId, OutlineNode};
pub use tree::BomTree;
pub use view::{project, ExpansionState, Row};
