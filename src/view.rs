//! Table view-state reducer
//!
//! Each dashboard page owns one [`TableView`]: the last full projection of
//! its snapshot plus the page-local [`ViewState`] (search, filters,
//! current page, warning flag). Snapshot events replace the working copy
//! wholesale — views are never merged across snapshots — and all other
//! transitions are pure state updates, which keeps the whole pipeline
//! unit-testable without a live store.
//!
//! Reset rules: changing search or a filter resets the page to 1; page
//! navigation never touches search or filter state.

use crate::paginate::{clamp_page, paginate, PageControls, DEFAULT_PAGE_SIZE};
use crate::projection::{
    map_behavior, map_device_vitals, map_sessions, BehavioralRecord, DeviceVitalsRecord,
    SessionRecord,
};
use crate::query::{filter, Criteria, StatusFilter};
use crate::sanitize::sanitize;
use crate::snapshot::SnapshotError;
use crate::status::Status;
use crate::summarize::{summarize, StatusSummary};
use serde_json::Value;
use std::collections::BTreeMap;

/// Page-local view state. Owned exclusively by the page that renders it.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub search_query: String,
    pub filters: BTreeMap<&'static str, StatusFilter>,
    pub current_page: usize,
    pub warning_triggered: bool,
}

impl ViewState {
    fn new() -> Self {
        Self {
            current_page: 1,
            ..Default::default()
        }
    }
}

/// Static description of one table domain: how to project a snapshot and
/// which fields are searchable and filterable.
pub struct TableSpec<T: 'static> {
    pub project: fn(&Value) -> Result<Vec<T>, SnapshotError>,
    pub search_field: fn(&T) -> &str,
    pub status_fields: &'static [(&'static str, fn(&T) -> Status)],
    /// The field charted by the page summary.
    pub summary_flag: fn(&T) -> bool,
}

/// What a page renders for the current state: one table page, the
/// navigation controls, and the chart summary over the full record set.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRender<T> {
    pub rows: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub controls: PageControls,
    pub summary: StatusSummary,
    pub warning_triggered: bool,
}

/// One page's projection + view state.
pub struct TableView<T: 'static> {
    spec: TableSpec<T>,
    records: Vec<T>,
    state: ViewState,
    page_size: usize,
}

impl<T: Clone> TableView<T> {
    pub fn new(spec: TableSpec<T>) -> Self {
        Self {
            spec,
            records: Vec::new(),
            state: ViewState::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Replace the working copy with a new snapshot.
    ///
    /// A malformed snapshot clears the table (the page degrades to an
    /// empty display) and is reported to the caller for logging; it never
    /// tears the page down.
    pub fn apply_snapshot(&mut self, snapshot: &Value) -> Result<(), SnapshotError> {
        match (self.spec.project)(snapshot) {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(err) => {
                self.records = Vec::new();
                Err(err)
            }
        }
    }

    /// Update the search box from a raw keystroke. The stored query is the
    /// sanitized value; the warning flag reflects the raw input.
    pub fn set_search(&mut self, raw: &str) {
        let sanitized = sanitize(raw);
        self.state.search_query = sanitized.clean;
        self.state.warning_triggered = sanitized.flagged;
        self.state.current_page = 1;
    }

    /// Update one field filter.
    pub fn set_filter(&mut self, field: &'static str, value: StatusFilter) {
        self.state.filters.insert(field, value);
        self.state.current_page = 1;
    }

    /// Jump to a page, clamped to the valid range for the current
    /// filtered set.
    pub fn goto_page(&mut self, page: usize) {
        let total = self.filtered_total_pages();
        self.state.current_page = clamp_page(page, total);
    }

    pub fn next_page(&mut self) {
        self.goto_page(self.state.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.goto_page(self.state.current_page.saturating_sub(1));
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// The full unfiltered record set from the last snapshot.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    fn criteria(&self) -> Criteria<T> {
        let mut criteria =
            Criteria::new(self.spec.search_field).with_search(&self.state.search_query);
        for (name, select) in self.spec.status_fields {
            let value = self.state.filters.get(name).copied().unwrap_or_default();
            criteria = criteria.with_filter(value, *select);
        }
        criteria
    }

    fn filtered_total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        let count = self
            .records
            .iter()
            .filter(|r| self.criteria().is_match(r))
            .count();
        count.div_ceil(self.page_size)
    }

    /// Render the current page.
    ///
    /// The table reflects search/filter/page state; the summary always
    /// covers the full unfiltered record set.
    pub fn render(&self) -> TableRender<T> {
        let filtered = filter(&self.records, &self.criteria());
        let page = paginate(&filtered, self.page_size, self.state.current_page);

        TableRender {
            rows: page.items,
            page: self.state.current_page,
            total_pages: page.total_pages,
            controls: PageControls::for_page(self.state.current_page, page.total_pages),
            summary: summarize(&self.records, self.spec.summary_flag),
            warning_triggered: self.state.warning_triggered,
        }
    }
}

// ===== Domain views =====

const SESSION_STATUS_FIELDS: &[(&str, fn(&SessionRecord) -> Status)] =
    &[("status", |r| r.status_label())];

const BEHAVIOR_STATUS_FIELDS: &[(&str, fn(&BehavioralRecord) -> Status)] =
    &[("ip", |r| r.ip()), ("request", |r| r.request())];

const VITALS_STATUS_FIELDS: &[(&str, fn(&DeviceVitalsRecord) -> Status)] =
    &[("health", |r| r.health_label())];

impl TableView<SessionRecord> {
    /// The login-session table (`component_1`).
    pub fn sessions() -> Self {
        TableView::new(TableSpec {
            project: map_sessions,
            search_field: |r| &r.name,
            status_fields: SESSION_STATUS_FIELDS,
            summary_flag: |r| r.status,
        })
    }
}

impl TableView<BehavioralRecord> {
    /// The behavioral-analysis table (`component_2`).
    pub fn behavior() -> Self {
        TableView::new(TableSpec {
            project: map_behavior,
            search_field: |r| &r.name,
            status_fields: BEHAVIOR_STATUS_FIELDS,
            summary_flag: |r| r.ip_address,
        })
    }
}

impl TableView<DeviceVitalsRecord> {
    /// The device-vitals table (`component_3`).
    pub fn device_vitals() -> Self {
        TableView::new(TableSpec {
            project: map_device_vitals,
            search_field: |r| &r.id,
            status_fields: VITALS_STATUS_FIELDS,
            summary_flag: |r| r.health,
        })
    }
}
