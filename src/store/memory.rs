//! In-memory realtime store
//!
//! A JSON document tree behind a lock with per-subscription delivery
//! channels. Writes and removes mutate the tree, then fan the affected
//! path's new snapshot out to every subscriber of that path. Key order is
//! deterministic (sorted), which keeps projections stable across
//! snapshots.

use super::{RealtimeStore, StoreError, Subscription};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

struct Subscriber {
    id: u64,
    path: String,
    tx: mpsc::UnboundedSender<Value>,
}

struct Inner {
    root: RwLock<Value>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    /// Test hook: reject all writes/removes when set.
    fail_writes: AtomicBool,
}

/// In-process realtime document store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    /// Create a store pre-seeded with a document tree.
    pub fn with_root(root: Value) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: RwLock::new(root),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Make every subsequent write/remove fail with `WriteRejected`.
    pub fn reject_writes(&self, reject: bool) {
        self.inner.fail_writes.store(reject, Ordering::SeqCst);
    }

    fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
        let segments: Vec<&str> = path.split('/').collect();
        if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(segments)
    }

    fn value_at(root: &Value, path: &str) -> Value {
        let mut node = root;
        for segment in path.split('/') {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Value::Null,
            }
        }
        node.clone()
    }

    fn check_writable(&self, path: &str) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected {
                path: path.to_string(),
                reason: "store unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// Fan the new snapshot of every subscribed path out to its
    /// subscribers, dropping any whose receiver is gone.
    fn notify(&self) {
        let root = self.inner.root.read();
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|sub| {
            let snapshot = Self::value_at(&root, &sub.path);
            sub.tx.send(snapshot).is_ok()
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn snapshot(&self, path: &str) -> Result<Value, StoreError> {
        Self::segments(path)?;
        Ok(Self::value_at(&self.inner.root.read(), path))
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = Self::segments(path)?;
        self.check_writable(path)?;

        {
            let mut root = self.inner.root.write();
            let mut node = &mut *root;
            for segment in &segments[..segments.len() - 1] {
                if !node.is_object() {
                    *node = Value::Object(Map::new());
                }
                node = node
                    .as_object_mut()
                    .expect("just ensured object")
                    .entry(segment.to_string())
                    .or_insert(Value::Null);
            }
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let leaf = segments[segments.len() - 1];
            node.as_object_mut()
                .expect("just ensured object")
                .insert(leaf.to_string(), value);
        }

        debug!(path, "store write acknowledged");
        self.notify();
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segments = Self::segments(path)?;
        self.check_writable(path)?;

        let removed = {
            let mut root = self.inner.root.write();
            let mut node = Some(&mut *root);
            for segment in &segments[..segments.len() - 1] {
                node = node.and_then(|n| n.get_mut(*segment));
            }
            node.and_then(|n| n.as_object_mut())
                .and_then(|m| m.remove(segments[segments.len() - 1]))
                .is_some()
        };

        if removed {
            debug!(path, "store remove acknowledged");
            self.notify();
        }
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        Self::segments(path)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);

        // Deliver the current snapshot before registering, so the first
        // event a consumer sees is the state at subscribe time.
        let current = Self::value_at(&self.inner.root.read(), path);
        let _ = tx.send(current);

        self.inner.subscribers.lock().push(Subscriber {
            id,
            path: path.to_string(),
            tx,
        });

        let inner = Arc::clone(&self.inner);
        let release = Box::new(move || {
            inner.subscribers.lock().retain(|sub| sub.id != id);
        });

        Ok(Subscription::new(rx, release))
    }
}
