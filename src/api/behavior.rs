//! Behavioral-analysis page API (`component_2`)
//!
//! The table filters on two classified fields at once (IP status and
//! request amount); the chart shows one healthy/danger series per field,
//! always over the full record set.

use super::{AppState, Domain, TableResponse};
use crate::projection::BehavioralRecord;
use crate::query::StatusFilter;
use crate::status::Status;
use crate::summarize::{summarize_fields, FieldSummary};
use crate::view::TableView;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Query parameters for the behavioral table.
#[derive(Debug, Default, Deserialize)]
pub struct BehaviorQuery {
    pub search: Option<String>,
    pub ip: Option<StatusFilter>,
    pub request: Option<StatusFilter>,
    pub page: Option<usize>,
}

/// One rendered table row, statuses already classified.
#[derive(Debug, Serialize)]
pub struct BehaviorRow {
    pub name: String,
    pub ip: Status,
    pub request: Status,
}

impl From<BehavioralRecord> for BehaviorRow {
    fn from(record: BehavioralRecord) -> Self {
        Self {
            ip: record.ip(),
            request: record.request(),
            name: record.name,
        }
    }
}

const CHART_FIELDS: &[(&str, fn(&BehavioralRecord) -> bool)] = &[
    ("ip", |r| r.ip_address),
    ("request", |r| r.request),
];

/// `GET /api/behavior`
pub async fn list_behavior(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BehaviorQuery>,
) -> Json<TableResponse<BehaviorRow, Vec<FieldSummary>>> {
    let snapshot = state.cache.latest(Domain::Behavior);

    let mut view = TableView::behavior().with_page_size(state.page_size);
    if let Err(err) = view.apply_snapshot(&snapshot) {
        warn!(error = %err, "behavior snapshot malformed; showing empty table");
    }
    if let Some(search) = &query.search {
        view.set_search(search);
    }
    if let Some(filter) = query.ip {
        view.set_filter("ip", filter);
    }
    if let Some(filter) = query.request {
        view.set_filter("request", filter);
    }
    if let Some(page) = query.page {
        view.goto_page(page);
    }

    let summary = summarize_fields(view.records(), CHART_FIELDS);
    let render = view.render();

    Json(TableResponse {
        rows: render.rows.into_iter().map(BehaviorRow::from).collect(),
        page: render.page,
        total_pages: render.total_pages,
        controls: render.controls,
        summary,
        warning_triggered: render.warning_triggered,
    })
}
