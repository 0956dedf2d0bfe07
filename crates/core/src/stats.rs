//! Aggregate shapes returned by the `/stats` endpoints.
//!
//! Groupings are sparse: a key only appears when at least one record in
//! scope produced it.

use serde::Serialize;

/// One bucket of a group-by count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

impl GroupCount {
    pub fn new(key: impl Into<String>, count: i64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Count stored under `key`, 0 when the group is absent.
pub fn count_for(groups: &[GroupCount], key: &str) -> i64 {
    groups
        .iter()
        .find(|g| g.key == key)
        .map_or(0, |g| g.count)
}

/// Round an average to the nearest integer, 0 for an empty set.
pub fn round_average(avg: Option<f64>) -> i64 {
    avg.filter(|v| v.is_finite()).map_or(0, |v| v.round() as i64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub by_role: Vec<GroupCount>,
    pub by_department: Vec<GroupCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub review: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub overdue: i64,
    pub by_status: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
}

impl WorkItemStats {
    /// Derive the per-status totals from the status grouping.
    pub fn from_groups(
        total: i64,
        overdue: i64,
        by_status: Vec<GroupCount>,
        by_priority: Vec<GroupCount>,
    ) -> Self {
        Self {
            total,
            pending: count_for(&by_status, "pending"),
            in_progress: count_for(&by_status, "in_progress"),
            review: count_for(&by_status, "review"),
            completed: count_for(&by_status, "completed"),
            cancelled: count_for(&by_status, "cancelled"),
            overdue,
            by_status,
            by_priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: i64,
    pub planning: i64,
    pub active: i64,
    pub on_hold: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub by_department: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
    pub avg_progress: i64,
}

impl ProjectStats {
    pub fn from_groups(
        by_status: &[GroupCount],
        by_department: Vec<GroupCount>,
        by_priority: Vec<GroupCount>,
        avg_progress: Option<f64>,
    ) -> Self {
        Self {
            total: by_status.iter().map(|g| g.count).sum(),
            planning: count_for(by_status, "planning"),
            active: count_for(by_status, "active"),
            on_hold: count_for(by_status, "on_hold"),
            completed: count_for(by_status, "completed"),
            cancelled: count_for(by_status, "cancelled"),
            by_department,
            by_priority,
            avg_progress: round_average(avg_progress),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub total: i64,
    pub by_category: Vec<GroupCount>,
    pub by_department: Vec<GroupCount>,
    pub total_downloads: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementStats {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
    pub archived: i64,
    pub by_category: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
    pub total_views: i64,
}

impl AnnouncementStats {
    pub fn from_groups(
        by_status: &[GroupCount],
        by_category: Vec<GroupCount>,
        by_priority: Vec<GroupCount>,
        total_views: i64,
    ) -> Self {
        Self {
            total: by_status.iter().map(|g| g.count).sum(),
            published: count_for(by_status, "published"),
            draft: count_for(by_status, "draft"),
            archived: count_for(by_status, "archived"),
            by_category,
            by_priority,
            total_views,
        }
    }
}
