use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::NoteError;
use crate::note::Note;

/// One mutation inside a store transaction.
#[derive(Debug, Clone)]
pub enum StoreOp {
    Put(Note),
    Delete(Uuid),
}

/// Contract the durable store must provide: point reads, a sorted range read,
/// and an atomic multi-record commit. A single put or delete is a one-op
/// commit.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Note>, NoteError>;

    /// All notes, ordered by `updated_at` descending.
    async fn list_by_updated_desc(&self) -> Result<Vec<Note>, NoteError>;

    /// Applies every op or none of them.
    async fn commit(&self, ops: Vec<StoreOp>) -> Result<(), NoteError>;
}

/// In-memory store backend. Serves as the session-local table in tests and
/// demos; cloning yields another handle onto the same table. Records are held
/// as serialized JSON, the same shape a file- or IndexedDB-backed adapter
/// would persist.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<Uuid, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

fn decode(bytes: &[u8]) -> Result<Note, NoteError> {
    serde_json::from_slice(bytes).map_err(|e| NoteError::Other(e.into()))
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Note>, NoteError> {
        match self.records.lock().await.get(&id) {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_by_updated_desc(&self) -> Result<Vec<Note>, NoteError> {
        let records = self.records.lock().await;
        let mut notes = Vec::with_capacity(records.len());
        for bytes in records.values() {
            notes.push(decode(bytes)?);
        }
        drop(records);
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn commit(&self, ops: Vec<StoreOp>) -> Result<(), NoteError> {
        let mut records = self.records.lock().await;
        // Stage into a copy and swap, so the table never holds half a batch.
        let mut staged = records.clone();
        for op in ops {
            match op {
                StoreOp::Put(note) => {
                    let bytes = serde_json::to_vec(&note)
                        .map_err(|e| NoteError::Transaction(e.to_string()))?;
                    staged.insert(note.id, bytes);
                }
                StoreOp::Delete(id) => {
                    staged.remove(&id);
                }
            }
        }
        *records = staged;
        Ok(())
    }
}
