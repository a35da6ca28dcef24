//! Filter/search engine
//!
//! One generic implementation of the per-table narrowing every dashboard
//! page needs: a conjunction of per-field status filters plus a
//! case-insensitive substring search over one text field. Field access is
//! parameterized with selector functions so each domain reuses the same
//! engine instead of re-implementing it.

use crate::status::Status;
use serde::Deserialize;

/// A single status filter value. `All` is the sentinel meaning "no
/// constraint on this field".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// Parse a filter value from the UI. Matching is case-sensitive on
    /// the status label; anything unrecognized falls back to `All`.
    pub fn parse(value: &str) -> Self {
        match value {
            "Healthy" => StatusFilter::Only(Status::Healthy),
            "Danger" => StatusFilter::Only(Status::Danger),
            _ => StatusFilter::All,
        }
    }

    /// Whether a classified field value passes this filter.
    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(StatusFilter::parse(&raw))
    }
}

/// Narrowing criteria for one table: conjunctive field filters plus a
/// substring search over a designated text field.
pub struct Criteria<T> {
    filters: Vec<(StatusFilter, fn(&T) -> Status)>,
    search_text: String,
    search_field: fn(&T) -> &str,
}

impl<T> Criteria<T> {
    /// Criteria that match everything, searching over `search_field`.
    pub fn new(search_field: fn(&T) -> &str) -> Self {
        Self {
            filters: Vec::new(),
            search_text: String::new(),
            search_field,
        }
    }

    /// Add a status filter over a classified field. Filters combine
    /// conjunctively.
    pub fn with_filter(mut self, filter: StatusFilter, select: fn(&T) -> Status) -> Self {
        self.filters.push((filter, select));
        self
    }

    /// Set the search text. Empty text matches every record.
    pub fn with_search(mut self, text: &str) -> Self {
        self.search_text = text.to_lowercase();
        self
    }

    /// Whether one record passes all filters and the search.
    pub fn is_match(&self, record: &T) -> bool {
        let filters_pass = self
            .filters
            .iter()
            .all(|(filter, select)| filter.matches(select(record)));

        let search_pass = self.search_text.is_empty()
            || (self.search_field)(record)
                .to_lowercase()
                .contains(&self.search_text);

        filters_pass && search_pass
    }
}

/// Apply criteria to a record sequence, preserving relative order.
pub fn filter<T: Clone>(records: &[T], criteria: &Criteria<T>) -> Vec<T> {
    records
        .iter()
        .filter(|r| criteria.is_match(r))
        .cloned()
        .collect()
}
