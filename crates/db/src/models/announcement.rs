//! Announcement entity model and DTOs.

use portal_core::announcement::{
    self, AnnouncementCategory, AnnouncementPriority, AnnouncementStatus,
};
use portal_core::policy::Resource;
use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `announcements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: DbId,
    pub title: String,
    pub content: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub publish_date: Timestamp,
    pub expiry_date: Option<Timestamp>,
    pub created_by: DbId,
    pub views: i64,
    pub is_featured: bool,
    #[serde(rename = "order")]
    pub display_order: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Announcement {
    pub fn status(&self) -> AnnouncementStatus {
        AnnouncementStatus::from_name(&self.status).unwrap_or_default()
    }

    pub fn is_visible(&self, now: Timestamp) -> bool {
        announcement::is_visible(self.status(), self.expiry_date, now)
    }

    pub fn resource(&self, now: Timestamp) -> Resource {
        Resource::Announcement {
            created_by: self.created_by,
            visible: self.is_visible(now),
        }
    }
}

/// DTO for creating an announcement. Defaults are resolved by the caller.
#[derive(Debug, Clone)]
pub struct CreateAnnouncement {
    pub title: String,
    pub content: String,
    pub category: AnnouncementCategory,
    pub priority: AnnouncementPriority,
    pub status: AnnouncementStatus,
    pub publish_date: Timestamp,
    pub expiry_date: Option<Timestamp>,
    pub created_by: DbId,
    pub is_featured: bool,
    pub display_order: i64,
}

/// DTO for updating an announcement. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateAnnouncement {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<AnnouncementCategory>,
    pub priority: Option<AnnouncementPriority>,
    pub status: Option<AnnouncementStatus>,
    pub publish_date: Option<Timestamp>,
    /// `Some(None)` clears the expiry date.
    pub expiry_date: Option<Option<Timestamp>>,
    pub is_featured: Option<bool>,
    pub display_order: Option<i64>,
}
