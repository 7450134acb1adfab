//! # Edit Session
//!
//! One user's editing surface over a BOM tree: every structural operation
//! goes through here so that change tracking, notification fan-out and the
//! UI side state (selection, expansion, the transient moved-row highlight)
//! can never be bypassed. The tree itself stays ignorant of all of this.

use crate::{ChangeLog, NoticeKind, Notifier};
use bomgrid_engine::{
    project, resolve_drag_intent, BomTree, DragIntent, DropHalf, ExpansionState, Fields,
    MutationOutcome, NodeId, OutlineNode, Row, TreeError, TreeMutation,
};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a just-moved row keeps its highlight.
pub const MOVE_HIGHLIGHT_TTL: Duration = Duration::from_millis(2400);

const DRAFT_SAVED: &str = "Changes saved to draft.";

/// Editing session: tree, side state, change attribution, notices.
pub struct EditSession<N: Notifier> {
    id: String,
    actor: String,
    tree: BomTree,
    expansion: ExpansionState,
    selection: Option<NodeId>,
    changes: ChangeLog,
    notifier: N,
    recently_moved: Option<(NodeId, Instant)>,
}

impl<N: Notifier> EditSession<N> {
    pub fn new(id: impl Into<String>, actor: impl Into<String>, tree: BomTree, notifier: N) -> Self {
        Self {
            id: id.into(),
            actor: actor.into(),
            tree,
            expansion: ExpansionState::new(),
            selection: None,
            changes: ChangeLog::new(),
            notifier,
            recently_moved: None,
        }
    }

    pub fn tree(&self) -> &BomTree {
        &self.tree
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    pub fn set_selection(&mut self, id: Option<NodeId>) {
        self.selection = id;
    }

    /// The rows a grid should render right now.
    pub fn visible_rows(&self, search: Option<&str>) -> Vec<Row<'_>> {
        project(&self.tree, &self.expansion, search)
    }

    /// The just-moved row to highlight, if the marker has not expired.
    pub fn recently_moved(&self) -> Option<NodeId> {
        match self.recently_moved {
            Some((id, at)) if at.elapsed() < MOVE_HIGHLIGHT_TTL => Some(id),
            _ => None,
        }
    }

    pub fn toggle_expanded(&mut self, id: NodeId) {
        self.expansion.toggle(id);
    }

    pub fn expand_all(&mut self) {
        self.expansion.expand_all(&self.tree);
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    pub fn expand_to_level(&mut self, n: u32) {
        self.expansion.expand_to_level(&self.tree, n);
    }

    pub fn collapse_from_level(&mut self, n: u32) {
        self.expansion.collapse_from_level(&self.tree, n);
    }

    /// Applies a mutation and records its change with actor attribution.
    fn track(&mut self, mutation: TreeMutation) -> Result<MutationOutcome, TreeError> {
        let outcome = self.tree.apply(mutation)?;
        if let Some(event) = outcome.change() {
            let record = self.changes.record(&self.id, &self.actor, event.clone());
            debug!(record = %record.id, "tracked change");
        }
        Ok(outcome)
    }

    fn applied_node(outcome: &MutationOutcome) -> NodeId {
        outcome.node().expect("insert mutations always produce a node")
    }

    pub fn add_root(&mut self, fields: Fields) -> Result<NodeId, TreeError> {
        let outcome = self.track(TreeMutation::InsertRoot { fields })?;
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(Self::applied_node(&outcome))
    }

    pub fn add_sibling(
        &mut self,
        after: Option<NodeId>,
        fields: Fields,
    ) -> Result<NodeId, TreeError> {
        let outcome = self.track(TreeMutation::InsertSibling { after, fields })?;
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(Self::applied_node(&outcome))
    }

    pub fn add_child(&mut self, parent: NodeId, fields: Fields) -> Result<NodeId, TreeError> {
        let outcome = self.track(TreeMutation::InsertChild { parent, fields })?;
        self.expansion.expand(parent);
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(Self::applied_node(&outcome))
    }

    pub fn update_field(
        &mut self,
        id: NodeId,
        field: impl Into<String>,
        value: Value,
    ) -> Result<(), TreeError> {
        self.track(TreeMutation::UpdateField {
            id,
            field: field.into(),
            value,
        })?;
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(())
    }

    pub fn delete(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.track(TreeMutation::Delete { id })?;
        self.expansion.prune(&self.tree);
        if self.selection.map(|s| !self.tree.contains(s)).unwrap_or(false) {
            self.selection = None;
        }
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(())
    }

    /// Returns whether the node actually moved; no preceding sibling is a
    /// silent no-op.
    pub fn indent(&mut self, id: NodeId) -> Result<bool, TreeError> {
        let outcome = self.track(TreeMutation::Indent { id })?;
        if outcome.is_noop() {
            return Ok(false);
        }
        self.expand_parent_of(id);
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(true)
    }

    /// Returns whether the node actually moved; roots are a silent no-op.
    pub fn outdent(&mut self, id: NodeId) -> Result<bool, TreeError> {
        let outcome = self.track(TreeMutation::Outdent { id })?;
        if outcome.is_noop() {
            return Ok(false);
        }
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(true)
    }

    pub fn move_after(
        &mut self,
        id: NodeId,
        after: Option<NodeId>,
        level: Option<u32>,
        parent: Option<NodeId>,
    ) -> Result<bool, TreeError> {
        let old_level = self.tree.get(id).map(|n| n.level);
        let outcome = self.track(TreeMutation::MoveAfter {
            id,
            after,
            level,
            parent,
        })?;
        Ok(self.after_move(id, old_level, level, &outcome))
    }

    pub fn move_before(
        &mut self,
        id: NodeId,
        before: NodeId,
        level: Option<u32>,
        parent: Option<NodeId>,
    ) -> Result<bool, TreeError> {
        let old_level = self.tree.get(id).map(|n| n.level);
        let outcome = self.track(TreeMutation::MoveBefore {
            id,
            before,
            level,
            parent,
        })?;
        Ok(self.after_move(id, old_level, level, &outcome))
    }

    fn after_move(
        &mut self,
        id: NodeId,
        old_level: Option<u32>,
        advisory_level: Option<u32>,
        outcome: &MutationOutcome,
    ) -> bool {
        if outcome.is_noop() {
            return false;
        }
        self.expand_parent_of(id);

        match (advisory_level, old_level) {
            (Some(new), Some(old)) if new != old => {
                self.notifier
                    .notify(NoticeKind::Info, &format!("Level changed: {} to {}.", old, new));
            }
            _ => self.notifier.notify(NoticeKind::Info, "Item order updated."),
        }
        true
    }

    pub fn duplicate(&mut self, id: NodeId, include_children: bool) -> Result<NodeId, TreeError> {
        let outcome = self.track(TreeMutation::Duplicate {
            id,
            include_children,
        })?;
        let copy = Self::applied_node(&outcome);
        if self.tree.get(copy).map(|n| !n.children.is_empty()).unwrap_or(false) {
            self.expansion.expand(copy);
        }
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(copy)
    }

    pub fn copy(&mut self, id: NodeId, include_children: bool) -> Result<(), TreeError> {
        self.track(TreeMutation::CopyToClipboard {
            id,
            include_children,
        })?;
        self.notifier.notify(NoticeKind::Success, "Copied to clipboard.");
        Ok(())
    }

    pub fn paste(&mut self, target: NodeId, force_level_change: bool) -> Result<NodeId, TreeError> {
        let outcome = self.track(TreeMutation::PasteFromClipboard {
            target,
            force_level_change,
        })?;
        let pasted = Self::applied_node(&outcome);

        self.expand_parent_of(pasted);
        if self.tree.get(pasted).map(|n| !n.children.is_empty()).unwrap_or(false) {
            self.expansion.expand(pasted);
        }
        self.notifier.notify(NoticeKind::Info, DRAFT_SAVED);
        Ok(pasted)
    }

    /// Replaces the whole tree from imported outline data and expands
    /// everything, the way a fresh import is presented.
    pub fn import_outline(&mut self, outline: Vec<OutlineNode>) -> Result<(), TreeError> {
        self.track(TreeMutation::ReplaceAll { outline })?;
        self.selection = None;
        self.expansion.expand_all(&self.tree);
        self.notifier.notify(NoticeKind::Success, "Import complete.");
        Ok(())
    }

    /// Executes a drop gesture end to end: resolve the intent, run the
    /// mutation, mark the moved row. Rejections surface as warnings and
    /// record nothing; dropping a row onto itself is silently ignored.
    pub fn drop_row(&mut self, dragged: NodeId, target: NodeId, half: DropHalf) -> Option<NodeId> {
        let intent = match resolve_drag_intent(&self.tree, dragged, target, half) {
            Ok(DragIntent::Ignore) => return None,
            Ok(intent) => intent,
            Err(err) => {
                self.notifier.notify(NoticeKind::Warning, &err.to_string());
                return None;
            }
        };

        let mutation = intent.into_mutation().expect("non-ignore intent maps to a mutation");
        match self.track(mutation) {
            Ok(outcome) if !outcome.is_noop() => {
                self.expand_parent_of(dragged);
                self.recently_moved = Some((dragged, Instant::now()));
                self.notifier.notify(NoticeKind::Success, "Item moved.");
                Some(dragged)
            }
            Ok(_) => None,
            Err(err) => {
                self.notifier.notify(NoticeKind::Warning, &err.to_string());
                None
            }
        }
    }

    fn expand_parent_of(&mut self, id: NodeId) {
        if let Some(parent) = self.tree.get(id).and_then(|n| n.parent) {
            self.expansion.expand(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryNotifier;
    use bomgrid_engine::ChangeKind;
    use serde_json::json;

    fn part(name: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("partName".to_string(), json!(name));
        f
    }

    fn session() -> EditSession<MemoryNotifier> {
        EditSession::new("client-1", "kim", BomTree::new(), MemoryNotifier::new())
    }

    #[test]
    fn test_tracked_operations_attribute_changes() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        s.update_field(root, "material", json!("Aluminum")).unwrap();

        assert_eq!(s.changes().len(), 2);
        let last = s.changes().last().unwrap();
        assert_eq!(last.actor, "kim");
        assert_eq!(last.id, "client-1-1");
        assert_eq!(last.event.kind, ChangeKind::Update);
    }

    #[test]
    fn test_add_child_expands_parent() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let child = s.add_child(root, part("BLOCK")).unwrap();

        assert!(s.expansion().is_expanded(root));
        let rows = s.visible_rows(None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, child);
    }

    #[test]
    fn test_delete_prunes_expansion_and_selection() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let child = s.add_child(root, part("BLOCK")).unwrap();
        s.set_selection(Some(child));

        s.delete(root).unwrap();

        assert_eq!(s.selection(), None);
        assert!(!s.expansion().is_expanded(root));
        assert!(s.visible_rows(None).is_empty());
    }

    #[test]
    fn test_indent_returns_false_without_preceding_sibling() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let child = s.add_child(root, part("BLOCK")).unwrap();
        let before = s.changes().len();

        assert!(!s.indent(child).unwrap());
        assert_eq!(s.changes().len(), before);
    }

    #[test]
    fn test_drop_row_marks_moved_node() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let b = s.add_child(root, part("BLOCK")).unwrap();
        let h = s.add_child(root, part("HEAD")).unwrap();

        let moved = s.drop_row(b, h, DropHalf::After);

        assert_eq!(moved, Some(b));
        assert_eq!(s.recently_moved(), Some(b));
        assert_eq!(s.tree().get(root).unwrap().children, vec![h, b]);
        assert!(s
            .notifier()
            .notices()
            .iter()
            .any(|n| n.kind == NoticeKind::Success && n.message == "Item moved."));
    }

    #[test]
    fn test_rejected_drop_warns_and_records_nothing() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let b = s.add_child(root, part("BLOCK")).unwrap();
        let c = s.add_child(b, part("LINER")).unwrap();
        let before = s.changes().len();

        // Level gap of 2.
        let moved = s.drop_row(c, root, DropHalf::After);

        assert_eq!(moved, None);
        assert_eq!(s.changes().len(), before);
        assert_eq!(s.recently_moved(), None);
        let last = s.notifier().notices().last().unwrap();
        assert_eq!(last.kind, NoticeKind::Warning);
        assert!(last.message.contains("level"));
    }

    #[test]
    fn test_drop_onto_self_is_silent() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let notices = s.notifier().notices().len();

        assert_eq!(s.drop_row(root, root, DropHalf::Before), None);
        assert_eq!(s.notifier().notices().len(), notices);
    }

    #[test]
    fn test_copy_produces_no_change_record() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let before = s.changes().len();

        s.copy(root, false).unwrap();
        assert_eq!(s.changes().len(), before);

        let pasted = s.paste(root, false).unwrap();
        assert_eq!(s.changes().len(), before + 1);
        assert!(s.tree().contains(pasted));
    }

    #[test]
    fn test_move_with_advisory_level_notifies_level_change() {
        let mut s = session();
        let root = s.add_root(part("ENGINE")).unwrap();
        let b = s.add_child(root, part("BLOCK")).unwrap();
        let h = s.add_child(root, part("HEAD")).unwrap();

        s.move_after(h, Some(b), Some(2), Some(b)).unwrap();

        let last = s.notifier().notices().last().unwrap();
        assert!(last.message.contains("Level changed"));
        assert_eq!(s.tree().get(h).unwrap().parent, Some(b));
        assert_eq!(s.tree().get(h).unwrap().level, 2);
    }

    #[test]
    fn test_import_expands_everything() {
        let mut s = session();
        s.add_root(part("OLD")).unwrap();

        let outline = vec![OutlineNode {
            fields: part("FRAME"),
            children: vec![OutlineNode::new(part("STRUT"))],
        }];
        s.import_outline(outline).unwrap();

        let rows = s.visible_rows(None);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            s.changes().last().unwrap().event.kind,
            ChangeKind::Import
        );
    }
}
