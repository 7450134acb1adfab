//! Full editing flows through the session layer.

use bomgrid_engine::{BomTree, ChangeKind, DropHalf, Fields};
use bomgrid_session::{EditSession, MemoryNotifier, NoticeKind};
use serde_json::json;

fn part(number: &str, name: &str) -> Fields {
    let mut f = Fields::new();
    f.insert("partNumber".to_string(), json!(number));
    f.insert("partName".to_string(), json!(name));
    f
}

#[test]
fn test_build_edit_and_review_flow() -> anyhow::Result<()> {
    let mut s = EditSession::new("client-1", "kim", BomTree::new(), MemoryNotifier::new());

    // Build a small assembly.
    let engine = s.add_root(part("G4FG-2E000", "ENGINE ASSY"))?;
    let block = s.add_child(engine, part("G4FG-11100", "CYLINDER BLOCK"))?;
    let head = s.add_child(engine, part("G4FG-11310", "CYLINDER HEAD"))?;

    // Edit a cell, reorder with a drop, duplicate the block.
    s.update_field(head, "material", json!("Aluminum Alloy"))?;
    s.drop_row(block, head, DropHalf::After).unwrap();
    let copy = s.duplicate(block, false)?;

    assert_eq!(s.tree().get(engine).unwrap().children, vec![head, block, copy]);
    assert!(s.tree().check_consistency().is_empty());

    // The history reads like the user's actions.
    let kinds: Vec<ChangeKind> = s.changes().iter().map(|r| r.event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChangeKind::Create,
            ChangeKind::Create,
            ChangeKind::Create,
            ChangeKind::Update,
            ChangeKind::Move,
            ChangeKind::Create,
        ]
    );
    assert!(s.changes().iter().all(|r| r.actor == "kim"));
    assert!(s
        .changes()
        .of_kind(ChangeKind::Move)
        .next()
        .unwrap()
        .event
        .description
        .contains("CYLINDER BLOCK"));

    Ok(())
}

#[test]
fn test_search_and_expansion_drive_visible_rows() {
    let mut s = EditSession::new("client-1", "kim", BomTree::new(), MemoryNotifier::new());

    let engine = s.add_root(part("G4FG-2E000", "ENGINE ASSY")).unwrap();
    s.add_child(engine, part("G4FG-11100", "CYLINDER BLOCK")).unwrap();
    s.add_root(part("A6GF1-2C000", "TRANSAXLE ASSY")).unwrap();

    // add_child expanded the engine row.
    assert_eq!(s.visible_rows(None).len(), 3);

    s.collapse_all();
    assert_eq!(s.visible_rows(None).len(), 2);

    // Per-row filter over visible rows only.
    assert_eq!(s.visible_rows(Some("transaxle")).len(), 1);
    assert!(s.visible_rows(Some("cylinder")).is_empty());

    s.expand_all();
    assert_eq!(s.visible_rows(Some("cylinder")).len(), 1);
}

#[test]
fn test_clipboard_flow_with_notices() {
    let mut s = EditSession::new("client-2", "lee", BomTree::new(), MemoryNotifier::new());

    let frame = s.add_root(part("CN7-51100", "FRAME ASSY")).unwrap();
    let strut = s.add_child(frame, part("CN7-54610", "STRUT ASSY")).unwrap();

    s.copy(strut, false).unwrap();
    let first = s.paste(strut, false).unwrap();
    let second = s.paste(strut, true).unwrap();

    // First paste lands beside the leaf, the forced one lands inside it.
    assert_eq!(s.tree().get(first).unwrap().parent, Some(frame));
    assert_eq!(s.tree().get(second).unwrap().parent, Some(strut));
    assert_eq!(s.tree().get(second).unwrap().level, 2);

    assert!(s
        .notifier()
        .notices()
        .iter()
        .any(|n| n.kind == NoticeKind::Success && n.message.contains("Copied")));
}
