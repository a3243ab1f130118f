use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use uuid::Uuid;

use crate::cache::NoteCache;
use crate::conflict;
use crate::error::NoteError;
use crate::note::{now_millis, Note, NotePatch, EMPTY_DOC};
use crate::queue::{self, OperationQueue, QueueItem, QueueOp};
use crate::scheduler::{DebounceTimer, DrainState, BATCH_DELAY, EDIT_DEBOUNCE};
use crate::store::{NoteStore, StoreOp};
use crate::toast::{Severity, ToastHub};

/// Façade over the note cache, operation queue, and batch scheduler. The only
/// entry point for note mutation: the cache and queue are owned here and
/// never handed out mutably.
///
/// Cloning is cheap and yields another handle onto the same session state.
pub struct NoteService<S: NoteStore> {
    inner: Arc<Inner<S>>,
}

impl<S: NoteStore> Clone for NoteService<S> {
    fn clone(&self) -> Self {
        NoteService {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S> {
    store: S,
    toasts: ToastHub,
    revision: watch::Sender<u64>,
    state: Mutex<ServiceState>,
}

/// All session-mutable state behind one lock. The lock is never held across
/// an await; store I/O happens between short lock windows.
#[derive(Default)]
struct ServiceState {
    cache: NoteCache,
    queue: OperationQueue,
    drain: DrainState,
    batch_timer: DebounceTimer,
    pending_edits: HashMap<Uuid, PendingEdit>,
    editing: Option<Uuid>,
}

/// Folded patch for one note awaiting its edit-debounce flush.
#[derive(Default)]
struct PendingEdit {
    patch: NotePatch,
    timer: DebounceTimer,
}

impl<S: NoteStore + 'static> NoteService<S> {
    pub fn new(store: S) -> Self {
        let (revision, _) = watch::channel(0);
        NoteService {
            inner: Arc::new(Inner {
                store,
                toasts: ToastHub::new(),
                revision,
                state: Mutex::new(ServiceState::default()),
            }),
        }
    }

    /// Handle onto the notification sink, for display layers.
    pub fn toasts(&self) -> ToastHub {
        self.inner.toasts.clone()
    }

    /// Change-notification hook: the value bumps on every cache mutation.
    /// Consumers await `changed()` or poll.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Read-only snapshot of the cache in its current order.
    pub fn notes_snapshot(&self) -> Vec<Note> {
        self.lock().cache.notes().to_vec()
    }

    /// Display ordering: pinned first (newest pin first), then by
    /// `updated_at` descending.
    pub fn sorted_notes(&self) -> Vec<Note> {
        self.lock().cache.sorted()
    }

    pub fn get_note(&self, id: Uuid) -> Option<Note> {
        self.lock().cache.get(id).cloned()
    }

    /// True while a batch drain is in flight.
    pub fn is_saving(&self) -> bool {
        self.lock().drain == DrainState::Draining
    }

    pub fn editing_id(&self) -> Option<Uuid> {
        self.lock().editing
    }

    pub fn set_editing(&self, id: Option<Uuid>) {
        self.lock().editing = id;
    }

    /// Replaces the cache with the store's contents, newest first. A failed
    /// load leaves the cache untouched.
    pub async fn load_all(&self) -> Result<(), NoteError> {
        match self.inner.store.list_by_updated_desc().await {
            Ok(notes) => {
                self.lock().cache.replace_all(notes);
                self.touch();
                Ok(())
            }
            Err(err) => Err(self.report("Failed to load notes", err)),
        }
    }

    /// Creates a note and commits it synchronously — creation is never
    /// queued, so later edits to the same id cannot race it. Returns the new
    /// id.
    pub async fn create(
        &self,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Uuid, NoteError> {
        let note = Note::new(
            title.unwrap_or_default(),
            body.unwrap_or_else(|| EMPTY_DOC.to_string()),
        );
        let id = note.id;
        self.inner
            .store
            .commit(vec![StoreOp::Put(note.clone())])
            .await
            .map_err(|err| self.report("Failed to create note", err))?;
        self.lock().cache.insert_front(note);
        self.touch();
        tracing::debug!(%id, "note created");
        Ok(id)
    }

    /// Immediate write path: conflict-checked against the local baseline and
    /// committed in one transaction. On any failure the cache is left at its
    /// pre-call value.
    pub async fn update(&self, id: Uuid, patch: NotePatch) -> Result<(), NoteError> {
        let baseline = self
            .lock()
            .cache
            .get(id)
            .cloned()
            .ok_or(NoteError::LocalNotFound(id))?;

        conflict::check(&self.inner.store, id, baseline.updated_at)
            .await
            .map_err(|err| {
                let message = if err.is_conflict() {
                    "Note changed elsewhere, refresh before editing"
                } else {
                    "Failed to save note"
                };
                self.report(message, err)
            })?;

        let mut updated = baseline.clone();
        patch.apply(&mut updated);
        updated.updated_at = now_millis().max(baseline.updated_at);

        self.inner
            .store
            .commit(vec![StoreOp::Put(updated.clone())])
            .await
            .map_err(|err| self.report("Failed to save note", err))?;

        self.lock().cache.upsert(updated);
        self.touch();
        Ok(())
    }

    /// Deferred write path: the cache takes the edit immediately, and the
    /// durable write is debounced per note, then batched. Never awaits store
    /// I/O.
    pub fn queue_update(&self, id: Uuid, patch: NotePatch) -> Result<(), NoteError> {
        let mut state = self.lock();
        let current = state
            .cache
            .get(id)
            .cloned()
            .ok_or(NoteError::LocalNotFound(id))?;

        let mut updated = current;
        patch.apply(&mut updated);
        updated.updated_at = now_millis().max(updated.updated_at);
        state.cache.upsert(updated);

        let entry = state.pending_edits.entry(id).or_default();
        entry.patch.fold(patch);
        let service = self.clone();
        entry.timer.reschedule(EDIT_DEBOUNCE, async move {
            service.flush_pending(id).await;
        });

        drop(state);
        self.touch();
        Ok(())
    }

    /// Removes a note. The cache (and any edit focus on the note) reflects
    /// the removal instantly; the durable delete is queued and drained like
    /// updates. Conflict-checked against the durable baseline first, same
    /// policy as `update`; a store miss counts as already deleted.
    pub async fn remove(&self, id: Uuid) -> Result<(), NoteError> {
        let baseline = self
            .lock()
            .cache
            .get(id)
            .cloned()
            .ok_or(NoteError::LocalNotFound(id))?;

        match conflict::check(&self.inner.store, id, baseline.updated_at).await {
            Ok(()) | Err(NoteError::NotFound(_)) => {}
            Err(err) => {
                let message = if err.is_conflict() {
                    "Note changed elsewhere, refresh before deleting"
                } else {
                    "Failed to delete note"
                };
                return Err(self.report(message, err));
            }
        }

        {
            let mut state = self.lock();
            state.cache.remove(id);
            if state.editing == Some(id) {
                state.editing = None;
            }
            // Any pending edit is superseded by the delete.
            state.pending_edits.remove(&id);
            state.queue.push(QueueItem {
                id,
                op: QueueOp::Delete,
                timestamp: now_millis(),
            });
            self.arm_batch_timer(&mut state);
        }
        self.touch();
        self.inner.toasts.push("Note deleted", Severity::Success);
        tracing::debug!(%id, "note removed, delete queued");
        Ok(())
    }

    /// Flips pin state. Routed through the immediate path: ordering changes
    /// should be visible and durable right away, and pinning is too
    /// infrequent to be worth batching.
    pub async fn toggle_pin(&self, id: Uuid) -> Result<(), NoteError> {
        let pinned = self
            .lock()
            .cache
            .get(id)
            .map(|n| n.pinned)
            .ok_or(NoteError::LocalNotFound(id))?;
        let next = match pinned {
            Some(_) => None,
            None => Some(now_millis()),
        };
        self.update(id, NotePatch::pin(next)).await
    }

    /// Pushes every pending edit into the queue and drains once, bypassing
    /// the timers. For shutdown and tests.
    pub async fn flush(&self) {
        let ids: Vec<Uuid> = self.lock().pending_edits.keys().copied().collect();
        for id in ids {
            self.flush_pending(id).await;
        }
        self.lock().batch_timer.cancel();
        self.drain().await;
    }

    /// Edit-debounce flush for one note: move the folded patch into the
    /// operation queue and poke the batch scheduler. If the queued path
    /// rejects the edit (stale baseline, store error), fall back to one
    /// immediate write attempt rather than dropping the edit.
    async fn flush_pending(&self, id: Uuid) {
        let patch = {
            let mut state = self.lock();
            match state.pending_edits.remove(&id) {
                Some(pending) => pending.patch,
                None => return,
            }
        };
        if patch.is_empty() {
            return;
        }

        match self.enqueue_patch(id, patch.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                // Note was removed locally while the edit was pending; the
                // delete supersedes it.
                tracing::debug!(%id, "pending edit dropped, note gone from cache");
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "queued save failed, writing directly");
                // `update` surfaces its own toast on failure.
                let _ = self.update(id, patch).await;
            }
        }
    }

    /// Validates the note against the store and appends an update to the
    /// operation queue. `Ok(false)` means the note vanished from the cache
    /// and the edit is moot.
    ///
    /// The queued payload is the folded edit delta, not a snapshot of the
    /// whole note: the drain applies it over the note's state at drain time,
    /// so a write that commits through the immediate path in between is not
    /// clobbered by stale fields.
    async fn enqueue_patch(&self, id: Uuid, patch: NotePatch) -> Result<bool, NoteError> {
        let baseline = self.lock().cache.get(id).map(|n| n.updated_at);
        let Some(baseline) = baseline else {
            return Ok(false);
        };

        conflict::check(&self.inner.store, id, baseline).await?;

        let mut state = self.lock();
        if state.cache.get(id).is_none() {
            return Ok(false);
        }
        state.queue.push(QueueItem {
            id,
            op: QueueOp::Update(patch),
            timestamp: now_millis(),
        });
        self.arm_batch_timer(&mut state);
        Ok(true)
    }

    /// Cancel-and-reschedule the batch timer; every enqueue restarts the
    /// window, so a burst of activity defers the drain until it settles.
    fn arm_batch_timer(&self, state: &mut ServiceState) {
        if state.drain == DrainState::Idle {
            state.drain = DrainState::Scheduled;
        }
        let service = self.clone();
        state.batch_timer.reschedule(BATCH_DELAY, async move {
            service.drain().await;
        });
    }

    /// Drains the queue into one atomic transaction. At most one drain runs
    /// at a time; a fire while draining is a no-op (the finishing drain
    /// reschedules if anything is left). Errors never escape: a failed batch
    /// is restored to the queue and retried.
    async fn drain(&self) {
        let (snapshot, baselines) = {
            let mut state = self.lock();
            if state.drain == DrainState::Draining {
                return;
            }
            if state.queue.is_empty() {
                state.drain = DrainState::Idle;
                return;
            }
            state.drain = DrainState::Draining;
            let snapshot = state.queue.take();
            let mut baselines: HashMap<Uuid, Note> = HashMap::new();
            for item in &snapshot {
                if let Some(note) = state.cache.get(item.id) {
                    baselines.entry(item.id).or_insert_with(|| note.clone());
                }
            }
            (snapshot, baselines)
        };

        tracing::debug!(items = snapshot.len(), "draining operation queue");
        match self.commit_batch(&snapshot, &baselines).await {
            Ok(committed) => {
                let mut state = self.lock();
                for (id, stamp) in committed {
                    state.cache.reconcile_updated_at(id, stamp);
                }
                state.drain = DrainState::Idle;
                if !state.queue.is_empty() {
                    // New work arrived during the drain; start the next batch.
                    self.arm_batch_timer(&mut state);
                }
                drop(state);
                self.touch();
            }
            Err(err) => {
                tracing::warn!(error = %err, "batch commit failed, requeueing");
                let mut state = self.lock();
                state.queue.restore_front(snapshot);
                state.drain = DrainState::Idle;
                self.arm_batch_timer(&mut state);
                drop(state);
                self.inner
                    .toasts
                    .push("Saving failed, will retry", Severity::Error);
            }
        }
    }

    /// Builds and commits one batch. Conflict checks run at drain time for
    /// every surviving update whose baseline is still cached, and each
    /// surviving delta is applied over its drain-time baseline — the cache's
    /// latest merged state, including anything the immediate path wrote in
    /// the meantime. The whole batch commits or fails together. Returns
    /// `(id, committed_updated_at)` for each written update, all stamped with
    /// a single per-batch timestamp.
    async fn commit_batch(
        &self,
        snapshot: &[QueueItem],
        baselines: &HashMap<Uuid, Note>,
    ) -> Result<Vec<(Uuid, i64)>, NoteError> {
        let winners = queue::dedup(snapshot.to_vec());

        let checks = winners.iter().filter_map(|item| match item.op {
            QueueOp::Update(_) => baselines
                .get(&item.id)
                .map(|note| conflict::check(&self.inner.store, item.id, note.updated_at)),
            QueueOp::Delete => None,
        });
        futures::future::try_join_all(checks).await?;

        let stamp = now_millis();
        let mut ops = Vec::new();
        let mut committed = Vec::new();
        for item in winners {
            match item.op {
                QueueOp::Delete => ops.push(StoreOp::Delete(item.id)),
                QueueOp::Update(patch) => {
                    // Baseline gone means the note was deleted locally while
                    // the update sat queued; skip it.
                    let Some(baseline) = baselines.get(&item.id) else {
                        continue;
                    };
                    let mut updated = baseline.clone();
                    patch.apply(&mut updated);
                    updated.updated_at = stamp.max(baseline.updated_at);
                    committed.push((item.id, updated.updated_at));
                    ops.push(StoreOp::Put(updated));
                }
            }
        }

        if !ops.is_empty() {
            self.inner.store.commit(ops).await?;
        }
        Ok(committed)
    }

    fn report(&self, message: &str, err: NoteError) -> NoteError {
        tracing::warn!(error = %err, "{message}");
        self.inner.toasts.push(message, Severity::Error);
        err
    }

    fn touch(&self) {
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
