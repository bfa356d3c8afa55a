//! Pagination types for `get_all_paginated`.

use serde::Serialize;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 15;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
}

impl PageRequest {
    /// Create a new page request. Page and size are at least 1.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// First page with the given size.
    pub fn with_size(page_size: u64) -> Self {
        Self::new(1, page_size)
    }

    /// SQL `OFFSET` value, saturating at `u64::MAX`.
    pub fn offset(&self) -> u64 {
        self.checked_offset().unwrap_or(u64::MAX)
    }

    /// `None` when the page lies beyond what an offset can address.
    pub fn checked_offset(&self) -> Option<u64> {
        self.page.saturating_sub(1).checked_mul(self.page_size)
    }

    /// SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results with length-aware metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginator<T> {
    pub data: Vec<T>,
    /// Total number of matching rows across all pages.
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    /// Never below 1, even when nothing matched.
    pub last_page: u64,
    /// 1-based position of the first item on this page, `None` when the page is empty.
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Paginator<T> {
    pub fn new(data: Vec<T>, total: u64, request: &PageRequest) -> Self {
        // the fields are public, a hand-built request may carry a zero size
        let per_page = request.page_size.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = request.offset().saturating_add(1);
            (Some(from), Some(from.saturating_add(data.len() as u64 - 1)))
        };

        Self {
            data,
            total,
            per_page,
            current_page: request.page,
            last_page,
            from,
            to,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }
}
