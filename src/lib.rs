//! TrustLock Security Dashboard
//!
//! Rust backend for a realtime security-monitoring dashboard: browser
//! session tracking, behavioral analysis, device vitals, and threat risk
//! assessment, all projected from live snapshots of a hierarchical
//! key/value store.
//!
//! # Features
//!
//! - **Realtime Store**: subscription-based snapshot delivery with an
//!   in-memory backend ([`store::MemoryStore`])
//! - **Snapshot Projection**: untyped JSON trees to typed table records
//!   ([`projection`])
//! - **Table Views**: search, status filters, and pagination over the
//!   projected records ([`view::TableView`])
//! - **Risk Reports**: assembled threat-analysis reports with a
//!   paginated plain-text export ([`report`])
//! - **Auth**: cookie-based JWT sessions with role-gated admin
//!   operations ([`auth`])
//!
//! # Architecture
//!
//! ```text
//! Browser ──► Axum Router ──► TableView ──► Page/Summary
//!                │               │
//!                │               └── projection (sanitize + classify)
//!                │
//!                └── SnapshotCache ──► RealtimeStore (subscriptions)
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod paginate;
pub mod projection;
pub mod query;
pub mod report;
pub mod sanitize;
pub mod server;
pub mod snapshot;
pub mod status;
pub mod store;
pub mod summarize;
pub mod view;

pub use auth::{AuthState, Role, SessionContext};
pub use config::ServerConfig;
pub use paginate::{paginate, Page, PageControls, DEFAULT_PAGE_SIZE};
pub use projection::{BehavioralRecord, DeviceVitalsRecord, RiskReport, SessionRecord};
pub use query::{Criteria, StatusFilter};
pub use sanitize::{sanitize, Sanitized};
pub use server::TrustLockServer;
pub use status::Status;
pub use store::{MemoryStore, RealtimeStore, StoreError, Subscription};
pub use summarize::{summarize, StatusSummary};
pub use view::{TableRender, TableView};
