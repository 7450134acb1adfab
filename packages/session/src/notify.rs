//! Notification fan-out.
//!
//! The engine reports outcomes; something user-facing has to show them.
//! That something is a [`Notifier`] implementation supplied by the
//! embedding surface (toast area, status bar, test buffer). Messages are
//! advisory only, never an error channel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// One transient user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Sink for transient messages.
pub trait Notifier {
    fn notify(&mut self, kind: NoticeKind, message: &str);
}

/// Buffering notifier for tests and headless embedding.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Vec<Notice>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, kind: NoticeKind, message: &str) {
        self.notices.push(Notice {
            kind,
            message: message.to_string(),
        });
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _kind: NoticeKind, _message: &str) {}
}
