use uuid::Uuid;

/// Errors surfaced by the note service and its write paths.
#[derive(thiserror::Error, Debug)]
pub enum NoteError {
    /// The target note is absent from the durable store.
    #[error("note not found in store: {0}")]
    NotFound(Uuid),

    /// The stored record's version token has advanced past the writer's
    /// baseline; the writer is operating on stale data.
    #[error("conflict on note {id}: stored revision {theirs} is newer than baseline {ours}")]
    Conflict { id: Uuid, ours: i64, theirs: i64 },

    /// The store transaction aborted; nothing from the batch was applied.
    #[error("store transaction failed: {0}")]
    Transaction(String),

    /// The note is missing from the in-memory cache. Distinct from
    /// [`NoteError::NotFound`]: this is a client-side state problem, not a
    /// durable-store miss.
    #[error("note not present in local cache: {0}")]
    LocalNotFound(Uuid),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NoteError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, NoteError::Conflict { .. })
    }
}
