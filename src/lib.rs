#![warn(warnings)]
#![deny(clippy::all)]

//! Write-coalescing core for a local-first note app.
//!
//! Notes live in a durable key-value table and are mirrored by an in-memory
//! cache so the UI never waits on storage. Edits hit the cache immediately,
//! get collapsed per note by a debounce window, and are drained in batches
//! through one atomic store transaction, with optimistic-concurrency checks
//! (`updated_at` as the version token) and retry-by-requeue on failure.
//!
//! [`service::NoteService`] is the façade; everything else backs it.

pub mod cache;
pub mod conflict;
pub mod error;
pub mod note;
pub mod queue;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod toast;
