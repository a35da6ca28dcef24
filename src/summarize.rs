//! Summary aggregator
//!
//! Reduces a full record set to healthy/danger counts for chart
//! rendering. Charts summarize the complete snapshot, never the filtered
//! or paginated table view, so these run over the unfiltered records.

use serde::Serialize;

/// Healthy/danger counts for one classified field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct StatusSummary {
    pub healthy: usize,
    pub danger: usize,
}

impl StatusSummary {
    pub fn total(self) -> usize {
        self.healthy + self.danger
    }
}

/// Count records by the classification of one boolean field.
pub fn summarize<T>(records: &[T], flag: impl Fn(&T) -> bool) -> StatusSummary {
    records.iter().fold(StatusSummary::default(), |mut acc, r| {
        if flag(r) {
            acc.healthy += 1;
        } else {
            acc.danger += 1;
        }
        acc
    })
}

/// Per-field summary, labeled for multi-series charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub field: &'static str,
    #[serde(flatten)]
    pub counts: StatusSummary,
}

/// Summarize several classified fields of the same record set, one series
/// per field (e.g. IP status and request status on the behavioral chart).
pub fn summarize_fields<T>(
    records: &[T],
    fields: &[(&'static str, fn(&T) -> bool)],
) -> Vec<FieldSummary> {
    fields
        .iter()
        .map(|(name, flag)| FieldSummary {
            field: name,
            counts: summarize(records, flag),
        })
        .collect()
}
