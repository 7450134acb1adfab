//! Change tracking for approval workflows.
//!
//! The engine emits one [`ChangeEvent`] per applied mutation; this module
//! attributes it to the acting user, timestamps it and keeps the ordered
//! history the approval surface reads. History is append-only here; review
//! and persistence live with the approval collaborator.

use bomgrid_engine::{ChangeEvent, ChangeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attributed entry in the change history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Record id, `"{session}-{n}"`.
    pub id: String,
    pub event: ChangeEvent,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered change history for one editing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeLog {
    records: Vec<ChangeRecord>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, session_id: &str, actor: &str, event: ChangeEvent) -> &ChangeRecord {
        let record = ChangeRecord {
            id: format!("{}-{}", session_id, self.records.len()),
            event,
            actor: actor.to_string(),
            timestamp: Utc::now(),
        };
        self.records.push(record);
        self.records.last().expect("just pushed")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&ChangeRecord> {
        self.records.last()
    }

    /// Records of one kind, newest last.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(move |r| r.event.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(description: &str) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Update,
            node: None,
            before: None,
            after: None,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_record_ids_follow_session_counter() {
        let mut log = ChangeLog::new();
        log.record("client-1", "kim", event("one"));
        let second = log.record("client-1", "kim", event("two")).clone();

        assert_eq!(second.id, "client-1-1");
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().event.description, "two");
    }

    #[test]
    fn test_records_carry_actor() {
        let mut log = ChangeLog::new();
        log.record("client-1", "lee", event("edit"));

        assert_eq!(log.iter().next().unwrap().actor, "lee");
    }
}
