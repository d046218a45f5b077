/**
 * Response Envelope and Pagination
 *
 * Every successful JSON response is wrapped as
 * `{ "success": true, "message": ..., "data": ... }`. Errors use the same
 * shape with `success: false` and are produced by the backend error type.
 *
 * List endpoints take `page` / `limit` query parameters and answer with a
 * `Paginated` body.
 */

use serde::{Deserialize, Serialize};

/// Default page size when `limit` is omitted
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size a client may ask for
pub const MAX_PAGE_SIZE: i64 = 100;

/// Standard success envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    /// Always `true` for this type
    pub success: bool,
    /// Optional human-readable note
    pub message: Option<String>,
    /// Response payload
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload without a message
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Wrap a payload with a message
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// Normalized paging window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub page: i64,
    /// Items per page, clamped to `1..=MAX_PAGE_SIZE`
    pub limit: i64,
}

impl Page {
    /// Build a page from raw query values, applying defaults and bounds
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    /// Row offset for SQL `OFFSET`
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Plain `?page=&limit=` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

/// One page of results plus the total count
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total: i64) -> Self {
        Self {
            items,
            page: page.page,
            limit: page.limit,
            total,
        }
    }
}
