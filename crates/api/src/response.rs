//! Shared response envelope types for API handlers.
//!
//! Every successful response carries `success: true` next to its payload.
//! Use these types instead of ad-hoc `serde_json::json!` bodies so the
//! envelope stays consistent across resources.

use portal_core::query::Page;
use serde::Serialize;

/// `{ success, count, total, totalPages, currentPage, items }` for list endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    /// Number of items on this page.
    pub count: usize,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub items: Vec<T>,
}

impl<T: Serialize> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            count: page.items.len(),
            total: page.total,
            total_pages: page.total_pages,
            current_page: page.current_page,
            items: page.items,
        }
    }
}

/// `{ success, count, items }` for unpaginated collections.
#[derive(Debug, Serialize)]
pub struct CollectionResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub items: Vec<T>,
}

impl<T: Serialize> CollectionResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            success: true,
            count: items.len(),
            items,
        }
    }
}

/// `{ success, item }` for single-record endpoints.
#[derive(Debug, Serialize)]
pub struct ItemResponse<T: Serialize> {
    pub success: bool,
    pub item: T,
}

impl<T: Serialize> ItemResponse<T> {
    pub fn new(item: T) -> Self {
        Self {
            success: true,
            item,
        }
    }
}

/// `{ success, stats }` for the `/stats` endpoints.
#[derive(Debug, Serialize)]
pub struct StatsResponse<T: Serialize> {
    pub success: bool,
    pub stats: T,
}

impl<T: Serialize> StatsResponse<T> {
    pub fn new(stats: T) -> Self {
        Self {
            success: true,
            stats,
        }
    }
}

/// `{ success, message }` for deletes and other payload-less outcomes.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
