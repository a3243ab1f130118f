use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use memopad_core::error::NoteError;
use memopad_core::note::Note;
use memopad_core::service::NoteService;
use memopad_core::store::{MemoryStore, NoteStore, StoreOp};
use uuid::Uuid;

#[allow(dead_code)]
pub fn setup_service() -> (NoteService<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    (NoteService::new(store.clone()), store)
}

/// Memory store wrapper that counts commit attempts and can be told to fail
/// the next N commits or range reads.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    commits: Arc<AtomicUsize>,
    fail_commits: Arc<AtomicUsize>,
    fail_lists: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_attempts(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn fail_next_commits(&self, n: usize) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_lists(&self, n: usize) {
        self.fail_lists.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl NoteStore for FlakyStore {
    async fn get(&self, id: Uuid) -> Result<Option<Note>, NoteError> {
        self.inner.get(id).await
    }

    async fn list_by_updated_desc(&self) -> Result<Vec<Note>, NoteError> {
        if take_one(&self.fail_lists) {
            return Err(NoteError::Transaction("injected list failure".into()));
        }
        self.inner.list_by_updated_desc().await
    }

    async fn commit(&self, ops: Vec<StoreOp>) -> Result<(), NoteError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.fail_commits) {
            return Err(NoteError::Transaction("injected commit failure".into()));
        }
        self.inner.commit(ops).await
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
