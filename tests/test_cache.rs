use memopad_core::cache::NoteCache;
use memopad_core::note::Note;

fn note(title: &str, updated_at: i64, pinned: Option<i64>) -> Note {
    let mut note = Note::new(title, "");
    note.created_at = 0;
    note.updated_at = updated_at;
    note.pinned = pinned;
    note
}

#[test]
fn test_sorted_pins_first_then_recency() {
    let mut cache = NoteCache::new();
    cache.upsert(note("old-unpinned", 10, None));
    cache.upsert(note("new-unpinned", 30, None));
    cache.upsert(note("old-pin", 5, Some(100)));
    cache.upsert(note("new-pin", 50, Some(200)));

    let sorted = cache.sorted();
    let titles: Vec<&str> = sorted.iter().map(|n| n.title.as_str()).collect();
    // Pinned first, newest pin first; then unpinned by updated_at descending.
    assert_eq!(titles, vec!["new-pin", "old-pin", "new-unpinned", "old-unpinned"]);
}

#[test]
fn test_upsert_replaces_in_place() {
    let mut cache = NoteCache::new();
    let first = note("first", 1, None);
    let id = first.id;
    cache.upsert(first);
    cache.upsert(note("front", 2, None));

    let mut replacement = note("replaced", 3, None);
    replacement.id = id;
    cache.upsert(replacement);

    assert_eq!(cache.len(), 2);
    // Still at its old position, not re-inserted at the front.
    assert_eq!(cache.notes()[1].id, id);
    assert_eq!(cache.notes()[1].title, "replaced");
}

#[test]
fn test_remove_returns_the_note() {
    let mut cache = NoteCache::new();
    let n = note("gone", 1, None);
    let id = n.id;
    cache.upsert(n);

    let removed = cache.remove(id).expect("note was cached");
    assert_eq!(removed.id, id);
    assert!(cache.is_empty());
    assert!(cache.remove(id).is_none());
}

#[test]
fn test_reconcile_only_raises_updated_at() {
    let mut cache = NoteCache::new();
    let n = note("n", 100, None);
    let id = n.id;
    cache.upsert(n);

    cache.reconcile_updated_at(id, 50);
    assert_eq!(cache.get(id).expect("cached").updated_at, 100);

    cache.reconcile_updated_at(id, 150);
    assert_eq!(cache.get(id).expect("cached").updated_at, 150);
}
