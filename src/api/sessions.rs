//! Login-session page API (`component_1`)
//!
//! - `GET /api/sessions` — table page + chart summary
//! - `POST /api/sessions` — add a monitored user (admin only)
//! - `DELETE /api/sessions/{username}` — remove a monitored user (admin only)

use super::{ApiError, AppState, Domain, TableResponse};
use crate::auth::{AuthError, SessionContext};
use crate::projection::SessionRecord;
use crate::query::StatusFilter;
use crate::sanitize::sanitize;
use crate::status::Status;
use crate::summarize::StatusSummary;
use crate::view::TableView;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Query parameters for the sessions table.
#[derive(Debug, Default, Deserialize)]
pub struct SessionsQuery {
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
    pub page: Option<usize>,
}

/// One rendered table row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub name: String,
    pub status: Status,
    pub login_time: String,
    pub logout_time: String,
}

impl From<SessionRecord> for SessionRow {
    fn from(record: SessionRecord) -> Self {
        Self {
            status: record.status_label(),
            name: record.name,
            login_time: record.login_time,
            logout_time: record.logout_time,
        }
    }
}

/// `GET /api/sessions`
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionsQuery>,
) -> Json<TableResponse<SessionRow, StatusSummary>> {
    let snapshot = state.cache.latest(Domain::Sessions);

    let mut view = TableView::sessions().with_page_size(state.page_size);
    if let Err(err) = view.apply_snapshot(&snapshot) {
        warn!(error = %err, "sessions snapshot malformed; showing empty table");
    }
    if let Some(search) = &query.search {
        view.set_search(search);
    }
    if let Some(filter) = query.status {
        view.set_filter("status", filter);
    }
    if let Some(page) = query.page {
        view.goto_page(page);
    }

    let render = view.render();
    Json(TableResponse {
        rows: render.rows.into_iter().map(SessionRow::from).collect(),
        page: render.page,
        total_pages: render.total_pages,
        controls: render.controls,
        summary: render.summary,
        warning_triggered: render.warning_triggered,
    })
}

/// Body for `POST /api/sessions`.
#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub username: String,
}

/// `POST /api/sessions` — admin only.
///
/// Writes the session-record schema at `component_1/<username>`. The
/// response is sent only after the store acknowledges the write, so the
/// client clears its input field on acknowledged writes alone.
pub async fn add_session_user(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<AddUserRequest>,
) -> Result<StatusCode, ApiError> {
    if !session.role.is_admin() {
        return Err(AuthError::AdminRequired.into());
    }

    let username = sanitize(&body.username).clean;
    if username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }

    let record = json!({
        "status": true,
        "loginTime": Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        "logoutTime": "null",
    });

    state
        .store
        .write(&format!("{}/{username}", Domain::Sessions.path()), record)
        .await?;

    info!(username, added_by = %session.email, "monitored user added");
    Ok(StatusCode::CREATED)
}

/// `DELETE /api/sessions/{username}` — admin only. Removes the entire
/// subtree for the user.
pub async fn delete_session_user(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !session.role.is_admin() {
        return Err(AuthError::AdminRequired.into());
    }

    let username = sanitize(&username).clean;
    if username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }

    state
        .store
        .remove(&format!("{}/{username}", Domain::Sessions.path()))
        .await?;

    info!(username, removed_by = %session.email, "monitored user removed");
    Ok(StatusCode::NO_CONTENT)
}
