//! Store-agnostic list query model: predicates, allow-listed filters, sort
//! orders and pagination.
//!
//! A list request is always `scope AND user filters AND kind default`, where
//! the scope comes from [`crate::policy::scope_filter`]. Column names are
//! `&'static str` taken from the allow-lists below, never from the request.

use std::collections::HashMap;

use serde::Serialize;

use crate::policy::ResourceKind;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Page used when `page` is missing or invalid.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when `limit` is missing or invalid.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `limit`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Coerce a raw query-string value into a positive integer.
///
/// Missing, non-numeric, zero and negative values all fall back to
/// `default`. Never fails.
pub fn coerce_positive(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Read `page` and `limit` from raw query parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let page = coerce_positive(params.get("page").map(String::as_str), DEFAULT_PAGE);
        let per_page = coerce_positive(params.get("limit").map(String::as_str), DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        Self { page, per_page }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// `ceil(total / per_page)`, zero when there is nothing to show.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

/// One page of results plus the counts needed to render pagination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the filtered set before pagination.
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            total_pages: total_pages(total, request.per_page),
            current_page: request.page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
    Time(Timestamp),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Time(v)
    }
}

/// Boolean filter expression over store columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record (identity scope).
    True,
    /// Matches nothing.
    False,
    Eq(&'static str, Value),
    Lt(&'static str, Value),
    Gte(&'static str, Value),
    IsNull(&'static str),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Eq(column, value.into())
    }

    pub fn lt(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Lt(column, value.into())
    }

    pub fn gte(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Gte(column, value.into())
    }

    /// Conjunction with `True` dropped and `False` short-circuiting.
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut kept = Vec::new();
        for part in parts {
            match part {
                Predicate::True => {}
                Predicate::False => return Predicate::False,
                Predicate::And(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Predicate::True,
            1 => kept.remove(0),
            _ => Predicate::And(kept),
        }
    }

    /// Disjunction with `False` dropped and `True` short-circuiting.
    pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut kept = Vec::new();
        for part in parts {
            match part {
                Predicate::False => {}
                Predicate::True => return Predicate::True,
                Predicate::Or(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Predicate::False,
            1 => kept.remove(0),
            _ => Predicate::Or(kept),
        }
    }

    pub fn and_also(self, other: Predicate) -> Self {
        Predicate::and([self, other])
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub descending: bool,
}

impl SortKey {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Default order for every kind without its own: newest first.
pub const NEWEST_FIRST: &[SortKey] = &[SortKey::desc("created_at"), SortKey::desc("id")];

/// Announcement feed order: featured first, then manual order, then newest.
pub const ANNOUNCEMENT_FEED_ORDER: &[SortKey] = &[
    SortKey::desc("is_featured"),
    SortKey::asc("display_order"),
    SortKey::desc("publish_date"),
    SortKey::desc("id"),
];

/// List order for a resource kind.
pub fn sort_order(kind: ResourceKind) -> &'static [SortKey] {
    match kind {
        ResourceKind::Announcement => ANNOUNCEMENT_FEED_ORDER,
        ResourceKind::User
        | ResourceKind::Task
        | ResourceKind::Assignment
        | ResourceKind::Project
        | ResourceKind::Document => NEWEST_FIRST,
    }
}

// ---------------------------------------------------------------------------
// User filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    Bool,
}

/// One allow-listed equality filter: query parameter name to column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
}

const fn text(param: &'static str, column: &'static str) -> FilterSpec {
    FilterSpec {
        param,
        column,
        kind: FilterKind::Text,
    }
}

const USER_FILTERS: &[FilterSpec] = &[
    text("role", "role"),
    text("department", "department"),
    FilterSpec {
        param: "isActive",
        column: "is_active",
        kind: FilterKind::Bool,
    },
];

const WORK_ITEM_FILTERS: &[FilterSpec] = &[
    text("status", "status"),
    text("priority", "priority"),
    text("department", "department"),
];

const PROJECT_FILTERS: &[FilterSpec] = &[
    text("status", "status"),
    text("priority", "priority"),
    text("department", "department"),
];

const DOCUMENT_FILTERS: &[FilterSpec] = &[
    text("category", "category"),
    text("department", "department"),
    text("status", "status"),
];

const ANNOUNCEMENT_FILTERS: &[FilterSpec] = &[
    text("category", "category"),
    text("priority", "priority"),
    text("status", "status"),
];

/// The equality filters a list endpoint accepts for `kind`.
pub fn allowed_filters(kind: ResourceKind) -> &'static [FilterSpec] {
    match kind {
        ResourceKind::User => USER_FILTERS,
        ResourceKind::Task | ResourceKind::Assignment => WORK_ITEM_FILTERS,
        ResourceKind::Project => PROJECT_FILTERS,
        ResourceKind::Document => DOCUMENT_FILTERS,
        ResourceKind::Announcement => ANNOUNCEMENT_FILTERS,
    }
}

/// Build the user-filter conjunction from raw query parameters.
///
/// Unknown keys, empty values and unparsable booleans are ignored.
pub fn user_filters(kind: ResourceKind, params: &HashMap<String, String>) -> Predicate {
    let parts = allowed_filters(kind).iter().filter_map(|allowed| {
        let raw = params.get(allowed.param)?.trim();
        if raw.is_empty() {
            return None;
        }
        match allowed.kind {
            FilterKind::Text => Some(Predicate::eq(allowed.column, raw)),
            FilterKind::Bool => raw
                .parse::<bool>()
                .ok()
                .map(|b| Predicate::eq(allowed.column, b)),
        }
    });
    Predicate::and(parts)
}

/// Whether the caller passed a non-empty value for `param`.
pub fn has_param(params: &HashMap<String, String>, param: &str) -> bool {
    params.get(param).is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_page_zero_and_garbage_fall_back_to_first_page() {
        assert_eq!(PageRequest::from_params(&params(&[("page", "0")])).page, 1);
        assert_eq!(PageRequest::from_params(&params(&[("page", "abc")])).page, 1);
        assert_eq!(PageRequest::from_params(&params(&[("page", "-3")])).page, 1);
    }

    #[test]
    fn test_limit_zero_falls_back_to_default() {
        let req = PageRequest::from_params(&params(&[("limit", "0")]));
        assert_eq!(req.per_page, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_limit_is_capped() {
        let req = PageRequest::from_params(&params(&[("limit", "5000")]));
        assert_eq!(req.per_page, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_for_third_page() {
        let req = PageRequest::from_params(&params(&[("page", "3"), ("limit", "20")]));
        assert_eq!(req.offset(), 40);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(1, 10), 1);
    }

    #[test]
    fn test_page_reports_counts() {
        let req = PageRequest { page: 2, per_page: 3 };
        let page = Page::new(vec![4, 5, 6], 7, &req);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![8, 10, 12]);
        assert_eq!(doubled.total, 7);
    }

    #[test]
    fn test_and_drops_identity_and_flattens() {
        let p = Predicate::and([
            Predicate::True,
            Predicate::eq("status", "pending"),
            Predicate::and([Predicate::eq("priority", "high"), Predicate::True]),
        ]);
        assert_eq!(
            p,
            Predicate::And(vec![
                Predicate::eq("status", "pending"),
                Predicate::eq("priority", "high"),
            ])
        );
    }

    #[test]
    fn test_and_with_false_is_false() {
        let p = Predicate::and([Predicate::eq("a", 1), Predicate::False]);
        assert_eq!(p, Predicate::False);
    }

    #[test]
    fn test_or_with_true_is_true() {
        let p = Predicate::or([Predicate::eq("a", 1), Predicate::True]);
        assert_eq!(p, Predicate::True);
        assert_eq!(Predicate::or([]), Predicate::False);
    }

    #[test]
    fn test_unknown_filter_keys_ignored() {
        let p = user_filters(
            ResourceKind::Task,
            &params(&[("status", "pending"), ("assignedTo", "7"), ("drop", "table")]),
        );
        assert_eq!(p, Predicate::eq("status", "pending"));
    }

    #[test]
    fn test_empty_filter_values_ignored() {
        let p = user_filters(ResourceKind::Project, &params(&[("status", "  ")]));
        assert_eq!(p, Predicate::True);
    }

    #[test]
    fn test_bool_filter_parsing() {
        let p = user_filters(ResourceKind::User, &params(&[("isActive", "false")]));
        assert_eq!(p, Predicate::eq("is_active", false));

        let p = user_filters(ResourceKind::User, &params(&[("isActive", "maybe")]));
        assert_eq!(p, Predicate::True);
    }

    #[test]
    fn test_announcements_sort_featured_first() {
        let order = sort_order(ResourceKind::Announcement);
        assert_eq!(order[0], SortKey::desc("is_featured"));
        assert_eq!(order[1], SortKey::asc("display_order"));
        assert_eq!(order[2], SortKey::desc("publish_date"));
        assert_eq!(sort_order(ResourceKind::Document)[0], SortKey::desc("created_at"));
    }
}
