//! TrustLock HTTP server
//!
//! Axum-based server tying the dashboard APIs to the realtime store:
//! embedded static shell, CORS, request tracing, cookie-session guards,
//! and graceful shutdown. Protected page routes redirect to `/` when the
//! auth cookie is absent, mirroring the route guard of the browser app.

use crate::api::{
    behavior::list_behavior,
    health::health,
    risk::{risk_export, risk_view},
    sessions::{add_session_user, delete_session_user, list_sessions},
    vitals::list_vitals,
    AppState, SnapshotCache,
};
use crate::auth::{auth_router, page_guard, require_session, AuthState};
use crate::config::ServerConfig;
use crate::store::{RealtimeStore, StoreError};
use axum::{
    body::Body,
    http::{header, Method, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use rust_embed::Embed;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Dashboard pages that require a signed-in session.
pub const PROTECTED_ROUTES: [&str; 4] = ["/sessions", "/behavior", "/vitals", "/risk"];

/// Embedded static files for the dashboard shell
#[derive(Embed)]
#[folder = "src/static/"]
struct StaticAssets;

/// TrustLock server
pub struct TrustLockServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl TrustLockServer {
    /// Wire the server onto a realtime store: build the auth state and
    /// warm the snapshot cache (one live subscription per domain).
    pub async fn new(
        config: ServerConfig,
        store: Arc<dyn RealtimeStore>,
    ) -> Result<Self, StoreError> {
        let auth = Arc::new(AuthState::new(&config.jwt_secret, config.secure_cookies));
        let cache = SnapshotCache::start(store.clone()).await?;

        let state = Arc::new(AppState {
            store,
            auth,
            cache,
            page_size: config.page_size,
            started_at: Instant::now(),
        });

        Ok(Self { config, state })
    }

    /// Shared auth state, for bootstrapping accounts.
    pub fn auth(&self) -> Arc<AuthState> {
        self.state.auth.clone()
    }

    /// Build the router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let cors = if self.config.cors_enabled {
            CorsLayer::new()
                .allow_origin(
                    self.config
                        .cors_origins
                        .iter()
                        .filter_map(|o| o.parse().ok())
                        .collect::<Vec<_>>(),
                )
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true)
        } else {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE])
        };

        let auth_state = self.state.auth.clone();

        // Data APIs require a session; handlers read the role from the
        // attached SessionContext for admin-only operations.
        let data_api = Router::new()
            .route("/sessions", get(list_sessions).post(add_session_user))
            .route("/sessions/{username}", delete(delete_session_user))
            .route("/behavior", get(list_behavior))
            .route("/vitals", get(list_vitals))
            .route("/risk", get(risk_view))
            .route("/risk/export", get(risk_export))
            .route_layer(middleware::from_fn_with_state(
                auth_state.clone(),
                require_session,
            ))
            .with_state(self.state.clone());

        let api = Router::new()
            .route("/health", get(health))
            .with_state(self.state.clone())
            .merge(data_api)
            .nest("/auth", auth_router(auth_state));

        // Protected pages serve the shell but bounce to "/" without the
        // auth cookie.
        let mut pages = Router::new();
        for route in PROTECTED_ROUTES {
            pages = pages.route(route, get(index_handler));
        }
        let pages = pages.route_layer(middleware::from_fn(page_guard));

        let mut router = Router::new()
            .route("/", get(index_handler))
            .merge(pages)
            .nest("/api", api)
            .route("/{*path}", get(static_handler))
            .layer(cors);

        if self.config.log_requests {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server and run until a shutdown signal.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.socket_addr();
        let router = self.build_router();

        info!("Starting TrustLock server on {}", addr);
        if !self.config.is_localhost() {
            warn!("Server bound to {} - ensure HTTPS is terminated in front", addr);
        }
        info!("Dashboard available at {}", self.config.base_url());

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("TrustLock server shut down gracefully");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Serve the dashboard shell.
async fn index_handler() -> impl IntoResponse {
    match StaticAssets::get("index.html") {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => Html(FALLBACK_INDEX).into_response(),
    }
}

/// Serve static files from embedded assets.
async fn static_handler(axum::extract::Path(path): axum::extract::Path<String>) -> impl IntoResponse {
    let path = path.trim_start_matches('/');

    // Security: prevent path traversal
    if path.contains("..") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();

            match Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime)
                .header(header::CACHE_CONTROL, "public, max-age=3600")
                .body(Body::from(content.data.into_owned()))
            {
                Ok(response) => response,
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

/// Fallback page when no static files are embedded
const FALLBACK_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>TrustLock</title></head>
<body>
    <h1>TrustLock</h1>
    <p>The dashboard UI is not yet installed.</p>
    <p><a href="/api/health">Health Check</a></p>
</body>
</html>"#;
