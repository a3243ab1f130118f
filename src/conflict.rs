use uuid::Uuid;

use crate::error::NoteError;
use crate::store::NoteStore;

/// Validates a proposed write against the durable store's current record.
///
/// Reads the store at call time: for queued batches that means drain time,
/// because the baseline may have gone stale during the debounce interval.
/// Equal timestamps pass; only a strictly newer stored revision is a
/// conflict.
pub async fn check<S: NoteStore + ?Sized>(
    store: &S,
    id: Uuid,
    expected_updated_at: i64,
) -> Result<(), NoteError> {
    let stored = store.get(id).await?.ok_or(NoteError::NotFound(id))?;
    if stored.updated_at > expected_updated_at {
        return Err(NoteError::Conflict {
            id,
            ours: expected_updated_at,
            theirs: stored.updated_at,
        });
    }
    Ok(())
}
