use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Quiet window after the last enqueue before a batch drain fires.
pub const BATCH_DELAY: Duration = Duration::from_millis(1500);

/// Quiet window collapsing keystroke-level edits to one queued operation.
pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Batch scheduler state machine. `Idle -> Scheduled -> Draining -> Idle` on
/// success; a failed drain goes back to `Scheduled` with the batch requeued.
/// At most one drain is ever in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    #[default]
    Idle,
    Scheduled,
    Draining,
}

/// A single resettable timer. Rescheduling cancels the live timer and arms a
/// new one, which is what makes the enclosing window a debounce: the delay
/// restarts on every trigger.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending fire and arms the timer to run `task` after
    /// `delay`. Must be called from within a Tokio runtime.
    pub fn reschedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
