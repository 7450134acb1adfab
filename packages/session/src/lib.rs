//! # Bomgrid Session
//!
//! The editing-session layer an embedding UI talks to. It wraps
//! `bomgrid-engine` with everything a grid surface needs besides the tree
//! itself:
//!
//! - change tracking with actor attribution and timestamps, feeding the
//!   approval workflow
//! - notification fan-out through a [`Notifier`] the surface supplies
//! - UI-session side state: selection, expansion, the transient highlight
//!   on a just-moved row
//! - column layout customization
//!
//! The engine stays pure; nothing in here can bypass its invariant checks.

mod changes;
mod columns;
mod notify;
mod session;

pub use changes::{ChangeLog, ChangeRecord};
pub use columns::{Column, ColumnLayout};
pub use notify::{MemoryNotifier, Notice, NoticeKind, Notifier, NullNotifier};
pub use session::{EditSession, MOVE_HIGHLIGHT_TTL};
