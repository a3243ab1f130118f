use std::cmp::Ordering;

use uuid::Uuid;

use crate::note::Note;

/// In-memory mirror of the durable note table. Owned by the note service;
/// everything outside the service sees it read-only, so all mutation goes
/// through one place.
#[derive(Debug, Default)]
pub struct NoteCache {
    notes: Vec<Note>,
}

impl NoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole cache, e.g. on initial load. Callers pass notes
    /// already ordered by `updated_at` descending.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.notes.iter().position(|n| n.id == id)
    }

    /// Inserts at the front (newest-first), used for freshly created notes.
    pub fn insert_front(&mut self, note: Note) {
        self.notes.insert(0, note);
    }

    /// Replaces the record with the same id in place, or front-inserts when
    /// the id is new.
    pub fn upsert(&mut self, note: Note) {
        match self.position(note.id) {
            Some(idx) => self.notes[idx] = note,
            None => self.insert_front(note),
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Note> {
        self.position(id).map(|idx| self.notes.remove(idx))
    }

    /// Raises a note's `updated_at` to `committed_at` if that is newer.
    /// Never lowers it: an edit typed while a drain was in flight may already
    /// carry a later optimistic stamp.
    pub fn reconcile_updated_at(&mut self, id: Uuid, committed_at: i64) {
        if let Some(idx) = self.position(id) {
            let note = &mut self.notes[idx];
            note.updated_at = note.updated_at.max(committed_at);
        }
    }

    /// Display order: pinned notes first, newest pin first; then unpinned
    /// notes by `updated_at` descending.
    pub fn sorted(&self) -> Vec<Note> {
        let mut notes = self.notes.clone();
        notes.sort_by(|a, b| match (a.pinned, b.pinned) {
            (Some(pa), Some(pb)) => pb.cmp(&pa),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.updated_at.cmp(&a.updated_at),
        });
        notes
    }
}
