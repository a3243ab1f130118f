use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::mem;

use uuid::Uuid;

use crate::note::NotePatch;

/// A pending mutation awaiting durable commit. Ephemeral: lives only for the
/// session, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub id: Uuid,
    pub op: QueueOp,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOp {
    Update(NotePatch),
    Delete,
}

/// Append-only buffer of pending mutations. Dedup happens at drain time, not
/// on push, so arrival order is preserved until a batch is actually built.
#[derive(Debug, Default)]
pub struct OperationQueue {
    items: Vec<QueueItem>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: QueueItem) {
        self.items.push(item);
    }

    /// Snapshots the queue for a drain, leaving it empty so enqueues during
    /// the drain start a fresh batch.
    pub fn take(&mut self) -> Vec<QueueItem> {
        mem::take(&mut self.items)
    }

    /// Puts a failed batch back, ahead of anything that arrived while the
    /// drain was in flight. Failure is all-or-nothing per batch; nothing is
    /// dropped.
    pub fn restore_front(&mut self, mut batch: Vec<QueueItem>) {
        batch.append(&mut self.items);
        self.items = batch;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collapses a drain snapshot to one winning item per note id.
///
/// A `Delete` dominates unconditionally. Update payloads are deltas, so they
/// fold in arrival order — a later item's fields override, untouched fields
/// survive — and the winner carries the merged set with the greatest
/// timestamp. Only final state needs to reach the store. Winners come out in
/// first-arrival group order.
pub fn dedup(items: Vec<QueueItem>) -> Vec<QueueItem> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut winners: HashMap<Uuid, QueueItem> = HashMap::new();

    for item in items {
        let QueueItem { id, op, timestamp } = item;
        match winners.entry(id) {
            Entry::Vacant(slot) => {
                order.push(id);
                slot.insert(QueueItem { id, op, timestamp });
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                match (&mut current.op, op) {
                    // Delete already won; nothing later revives the note.
                    (QueueOp::Delete, _) => {}
                    (_, QueueOp::Delete) => {
                        current.op = QueueOp::Delete;
                        current.timestamp = current.timestamp.max(timestamp);
                    }
                    (QueueOp::Update(patch), QueueOp::Update(later)) => {
                        patch.fold(later);
                        current.timestamp = current.timestamp.max(timestamp);
                    }
                }
            }
        }
    }

    order.into_iter().filter_map(|id| winners.remove(&id)).collect()
}
