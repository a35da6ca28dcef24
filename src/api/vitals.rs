//! Device-vitals page API (`component_3`)
//!
//! Device ids come from the `Patient_health` subtree; each row carries
//! the optional vitals sub-record resolved through the `<id>_vitals`
//! sibling-key convention.

use super::{AppState, Domain, TableResponse};
use crate::projection::{DeviceVitalsRecord, Vitals};
use crate::query::StatusFilter;
use crate::status::Status;
use crate::summarize::StatusSummary;
use crate::view::TableView;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Query parameters for the vitals table.
#[derive(Debug, Default, Deserialize)]
pub struct VitalsQuery {
    pub search: Option<String>,
    pub health: Option<StatusFilter>,
    pub page: Option<usize>,
}

/// One rendered table row.
#[derive(Debug, Serialize)]
pub struct VitalsRow {
    pub id: String,
    pub health: Status,
    pub vitals: Option<Vitals>,
}

impl From<DeviceVitalsRecord> for VitalsRow {
    fn from(record: DeviceVitalsRecord) -> Self {
        Self {
            health: record.health_label(),
            id: record.id,
            vitals: record.vitals,
        }
    }
}

/// `GET /api/vitals`
pub async fn list_vitals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VitalsQuery>,
) -> Json<TableResponse<VitalsRow, StatusSummary>> {
    let snapshot = state.cache.latest(Domain::DeviceVitals);

    let mut view = TableView::device_vitals().with_page_size(state.page_size);
    if let Err(err) = view.apply_snapshot(&snapshot) {
        warn!(error = %err, "vitals snapshot malformed; showing empty table");
    }
    if let Some(search) = &query.search {
        view.set_search(search);
    }
    if let Some(filter) = query.health {
        view.set_filter("health", filter);
    }
    if let Some(page) = query.page {
        view.goto_page(page);
    }

    let render = view.render();
    Json(TableResponse {
        rows: render.rows.into_iter().map(VitalsRow::from).collect(),
        page: render.page,
        total_pages: render.total_pages,
        controls: render.controls,
        summary: render.summary,
        warning_triggered: render.warning_triggered,
    })
}
