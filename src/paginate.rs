//! Paginator
//!
//! Slices a filtered record sequence into fixed-size pages and derives the
//! navigation-control state. Out-of-range pages yield an empty slice
//! rather than an error; the navigation helpers are how callers keep the
//! current page clamped.

use serde::Serialize;

/// Default rows per table page across the dashboard.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// One page of records plus the page count for the full sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
}

/// Slice `records` into the 1-based page `page` of size `page_size`.
///
/// `total_pages` is `ceil(len / page_size)` and zero for an empty input.
/// A page past the end yields empty items. A zero page size is treated as
/// an empty sequence; callers pass [`DEFAULT_PAGE_SIZE`].
pub fn paginate<T: Clone>(records: &[T], page_size: usize, page: usize) -> Page<T> {
    if page_size == 0 || records.is_empty() {
        return Page {
            items: Vec::new(),
            total_pages: 0,
        };
    }

    let total_pages = records.len().div_ceil(page_size);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(records.len());

    let items = if start >= records.len() {
        Vec::new()
    } else {
        records[start..end].to_vec()
    };

    Page { items, total_pages }
}

/// Navigation-control state for a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageControls {
    /// Controls are hidden entirely when there is at most one page.
    pub show: bool,
    /// "Previous" is disabled on the first page.
    pub can_prev: bool,
    /// "Next" is disabled on the last page.
    pub can_next: bool,
}

impl PageControls {
    pub fn for_page(page: usize, total_pages: usize) -> Self {
        let page = page.max(1);
        Self {
            show: total_pages > 1,
            can_prev: page > 1,
            can_next: total_pages > 1 && page < total_pages,
        }
    }
}

/// Clamp a requested page into the valid range for `total_pages`.
/// An empty sequence still renders as page 1.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.max(1).min(total_pages.max(1))
}
