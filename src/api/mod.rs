//! Dashboard HTTP API
//!
//! One router per dashboard page, all driven by the same snapshot →
//! project → filter → paginate → summarize pipeline. Handlers are
//! stateless: each request builds a table view from the latest cached
//! snapshot and the request's query parameters.

pub mod behavior;
pub mod health;
pub mod risk;
pub mod sessions;
pub mod vitals;

pub use behavior::{BehaviorQuery, BehaviorRow};
pub use health::HealthResponse;
pub use risk::RiskView;
pub use sessions::{AddUserRequest, SessionRow, SessionsQuery};
pub use vitals::{VitalsQuery, VitalsRow};

use crate::auth::{AuthError, AuthState};
use crate::paginate::PageControls;
use crate::store::{RealtimeStore, StoreError, Subscription};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The four realtime domains backing the dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Sessions,
    Behavior,
    DeviceVitals,
    Risk,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Sessions,
        Domain::Behavior,
        Domain::DeviceVitals,
        Domain::Risk,
    ];

    /// Logical store path for this domain.
    pub fn path(self) -> &'static str {
        match self {
            Domain::Sessions => "component_1",
            Domain::Behavior => "component_2",
            Domain::DeviceVitals => "component_3",
            Domain::Risk => "component_4",
        }
    }
}

/// API-level errors, shared by the data routers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => err.into_response(),
            ApiError::Store(err) => {
                let (status, message) = match &err {
                    StoreError::WriteRejected { .. } => (
                        StatusCode::BAD_GATEWAY,
                        "The change was not saved. Please try again.",
                    ),
                    StoreError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
                };
                warn!(error = %err, "store operation failed");
                let body = Json(serde_json::json!({
                    "error": status.canonical_reason().unwrap_or("Error"),
                    "message": message,
                }));
                (status, body).into_response()
            }
            ApiError::BadRequest(message) => {
                let body = Json(serde_json::json!({
                    "error": "Bad Request",
                    "message": message,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}

/// Everything the data handlers need.
pub struct AppState {
    pub store: Arc<dyn RealtimeStore>,
    pub auth: Arc<AuthState>,
    pub cache: SnapshotCache,
    pub page_size: usize,
    pub started_at: Instant,
}

/// Latest-snapshot cache, one live subscription per domain.
///
/// A background task per domain owns the subscription handle for the
/// server's lifetime; each incoming snapshot fully replaces the cached
/// value. Shutdown releases every handle exactly once (release itself is
/// idempotent, so an aborted task dropping its handle is also safe).
pub struct SnapshotCache {
    latest: HashMap<Domain, watch::Receiver<Value>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SnapshotCache {
    /// Subscribe to every domain and start the relay tasks. The initial
    /// snapshot of each domain is awaited so the cache is warm before the
    /// server accepts requests.
    pub async fn start(store: Arc<dyn RealtimeStore>) -> Result<Self, StoreError> {
        let mut latest = HashMap::new();
        let mut tasks = Vec::new();

        for domain in Domain::ALL {
            let mut subscription = store.subscribe(domain.path()).await?;
            let initial = subscription.recv().await.unwrap_or(Value::Null);
            let (tx, rx) = watch::channel(initial);
            latest.insert(domain, rx);
            tasks.push(tokio::spawn(relay(domain, subscription, tx)));
        }

        Ok(Self { latest, tasks })
    }

    /// The most recent snapshot for a domain (`Null` before any data).
    pub fn latest(&self, domain: Domain) -> Value {
        self.latest
            .get(&domain)
            .map(|rx| rx.borrow().clone())
            .unwrap_or(Value::Null)
    }
}

impl Drop for SnapshotCache {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn relay(domain: Domain, mut subscription: Subscription, tx: watch::Sender<Value>) {
    while let Some(snapshot) = subscription.recv().await {
        debug!(domain = ?domain, "snapshot received");
        if tx.send(snapshot).is_err() {
            break;
        }
    }
    subscription.unsubscribe();
}

/// Common envelope for the table endpoints: the current page of rows, the
/// pagination state, and the chart summary over the full record set.
#[derive(Debug, Serialize)]
pub struct TableResponse<R, S> {
    pub rows: Vec<R>,
    pub page: usize,
    pub total_pages: usize,
    pub controls: PageControls,
    pub summary: S,
    pub warning_triggered: bool,
}
