//! Risk-assessment page API (`component_4`)
//!
//! - `GET /api/risk` — the assembled report for display
//! - `GET /api/risk/export` — paginated plain-text export

use super::{AppState, Domain};
use crate::projection::{map_risk_report, RiskEntry, RiskReport};
use crate::report::render_text;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// The risk report as rendered by the dashboard.
#[derive(Debug, Serialize)]
pub struct RiskView {
    pub malicious: bool,
    pub risk_evaluation: String,
    pub summary: String,
    pub entries: Vec<RiskEntry>,
    pub total: usize,
}

impl From<RiskReport> for RiskView {
    fn from(report: RiskReport) -> Self {
        Self {
            malicious: report.malicious,
            risk_evaluation: report.risk_evaluation,
            summary: report.summary,
            total: report.entries.len(),
            entries: report.entries,
        }
    }
}

fn current_report(state: &AppState) -> RiskReport {
    let snapshot = state.cache.latest(Domain::Risk);
    match map_risk_report(&snapshot) {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "risk snapshot malformed; showing empty report");
            RiskReport::default()
        }
    }
}

/// `GET /api/risk`
pub async fn risk_view(State(state): State<Arc<AppState>>) -> Json<RiskView> {
    Json(RiskView::from(current_report(&state)))
}

/// `GET /api/risk/export`
pub async fn risk_export(State(state): State<Arc<AppState>>) -> Response {
    let document = render_text(&current_report(&state));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"threat-analysis-report.txt\"",
            ),
        ],
        document,
    )
        .into_response()
}
