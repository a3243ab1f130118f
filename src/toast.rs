use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long a toast stays visible before it expires.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
}

/// Caller-facing notification sink. Entries are held most-recent-first and
/// auto-expire after [`TOAST_TTL`]. Cloning yields another handle onto the
/// same list.
#[derive(Clone, Default)]
pub struct ToastHub {
    inner: Arc<ToastInner>,
}

#[derive(Default)]
struct ToastInner {
    toasts: Mutex<Vec<Toast>>,
    next_id: AtomicU64,
}

impl ToastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends a toast and schedules its expiry. Must be called from within
    /// a Tokio runtime.
    pub fn push(&self, message: impl Into<String>, severity: Severity) {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = Toast {
            id,
            message: message.into(),
            severity,
        };
        self.lock().insert(0, toast);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_TTL).await;
            inner
                .toasts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|t| t.id != id);
        });
    }

    /// Snapshot of the visible toasts, most recent first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.inner
            .toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
