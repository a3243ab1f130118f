use memopad_core::note::{Note, NotePatch, EMPTY_DOC};

#[test]
fn test_empty_doc_is_valid_json() {
    let doc: serde_json::Value = serde_json::from_str(EMPTY_DOC).expect("valid json");
    assert_eq!(doc["type"], "doc");
}

#[test]
fn test_note_serde_omits_absent_pin() -> anyhow::Result<()> {
    let note = Note::new("t", EMPTY_DOC);
    let value = serde_json::to_value(&note)?;
    assert!(value.get("pinned").is_none());

    let mut pinned = note.clone();
    pinned.pinned = Some(42);
    let value = serde_json::to_value(&pinned)?;
    assert_eq!(value["pinned"], 42);

    let back: Note = serde_json::from_value(value)?;
    assert_eq!(back, pinned);
    Ok(())
}

#[test]
fn test_new_note_timestamps() {
    let note = Note::new("", "");
    assert_eq!(note.created_at, note.updated_at);
    assert!(note.pinned.is_none());
}

#[test]
fn test_patch_apply_only_touches_present_fields() {
    let mut note = Note::new("old title", "old body");
    NotePatch::body("new body").apply(&mut note);
    assert_eq!(note.title, "old title");
    assert_eq!(note.body, "new body");

    NotePatch::pin(Some(7)).apply(&mut note);
    assert_eq!(note.pinned, Some(7));
    NotePatch::pin(None).apply(&mut note);
    assert_eq!(note.pinned, None);
}

#[test]
fn test_patch_fold_later_fields_win() {
    let mut patch = NotePatch::title("first");
    patch.fold(NotePatch::body("body"));
    patch.fold(NotePatch::title("second"));

    assert_eq!(patch.title.as_deref(), Some("second"));
    assert_eq!(patch.body.as_deref(), Some("body"));
    assert!(patch.pinned.is_none());
    assert!(!patch.is_empty());
}
