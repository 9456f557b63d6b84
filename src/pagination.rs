//! This module defines the common functionality for paging the transaction
//! list.

use serde::{Deserialize, Serialize};

/// The config for pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The pagination query parameters of a list request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// The one-based page number to fetch.
    pub page: Option<u64>,
    /// How many rows to return per page.
    pub per_page: Option<u64>,
}

/// A resolved page request: always one-based and within the configured size
/// limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The one-based page number.
    pub page: u64,
    /// The number of rows per page.
    pub per_page: u64,
}

impl Page {
    /// Resolve the raw query parameters against `config`.
    ///
    /// Out-of-range values are clamped rather than rejected: page zero
    /// becomes page one and oversized page sizes are capped.
    pub fn resolve(query: &PageQuery, config: &PaginationConfig) -> Self {
        let page = query.page.unwrap_or(config.default_page).max(1);
        let per_page = query
            .per_page
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);

        Self { page, per_page }
    }

    /// The number of rows to skip for this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of rows plus the bookkeeping a client needs to render paging
/// controls.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// The rows on this page.
    pub data: Vec<T>,
    /// The one-based page number.
    pub page: u64,
    /// The number of rows per page.
    pub per_page: u64,
    /// The total number of rows across all pages.
    pub total: u64,
    /// The total number of pages.
    pub page_count: u64,
}

impl<T> Paginated<T> {
    /// Wrap `data` as the given `page` of a result set of `total` rows.
    pub fn new(data: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
            page_count: total.div_ceil(page.per_page),
        }
    }
}
