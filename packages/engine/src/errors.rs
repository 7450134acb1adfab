//! Error types for the tree engine.
//!
//! Every variant is a local, recoverable condition. Expected failures are
//! returned, never thrown; ignored no-ops are modeled as
//! [`crate::MutationOutcome::Noop`], not as errors.

use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    UnknownNode(NodeId),

    #[error("parent not found: {0}")]
    InvalidParent(NodeId),

    #[error("operation would make a node its own ancestor")]
    CircularReference,

    #[error("illegal level transition: {0}")]
    IllegalLevelTransition(String),

    #[error("clipboard is empty")]
    EmptyClipboard,
}
