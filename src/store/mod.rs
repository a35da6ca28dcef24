//! Realtime document store abstraction
//!
//! The dashboard's backend is an opaque realtime key/value document store
//! reached through a narrow capability: read the current snapshot of a
//! path, write or remove a subtree, and subscribe to snapshot-changed
//! events. Every event carries a full replacement snapshot — consumers
//! never patch incrementally, and a later snapshot always supersedes the
//! view built from an earlier one.
//!
//! [`MemoryStore`] is the in-process implementation used by the service
//! and by tests.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The path is empty or contains an empty segment.
    #[error("invalid store path '{0}'")]
    InvalidPath(String),

    /// A write or remove was not acknowledged. Prior state is unchanged.
    #[error("write rejected at '{path}': {reason}")]
    WriteRejected { path: String, reason: String },
}

/// Subscribe/read/write capability over the realtime store.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Read the current snapshot at `path` (`Null` when absent).
    async fn snapshot(&self, path: &str) -> Result<Value, StoreError>;

    /// Replace the subtree at `path` with `value`.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Remove the entire subtree at `path`.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Subscribe to snapshot-changed events for `path`. The current
    /// snapshot is delivered immediately, then one full snapshot per
    /// change, in emission order.
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;
}

/// A live subscription handle.
///
/// The handle owns its delivery channel; releasing it stops delivery.
/// Release is idempotent — calling [`Subscription::unsubscribe`] twice is
/// a no-op, and dropping the handle releases it as well.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Value>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Value>, release: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            rx,
            release: Some(release),
        }
    }

    /// Wait for the next snapshot. Returns `None` once unsubscribed and
    /// the channel is drained.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Non-blocking poll for an already-delivered snapshot.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.rx.try_recv().ok()
    }

    /// Stop delivery. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
