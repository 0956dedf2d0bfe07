//! Announcement enums and the "currently visible" rule.

use crate::error::CoreError;
use crate::query::Predicate;
use crate::types::Timestamp;

/// Maximum number of items on the featured strip.
pub const FEATURED_LIMIT: i64 = 5;

define_name_enum! {
    AnnouncementCategory("category") {
        Notice = "notice",
        Circular = "circular",
        Order = "order",
        Recruitment = "recruitment",
        Result = "result",
        News = "news",
        Event = "event",
    }
}

impl Default for AnnouncementCategory {
    fn default() -> Self {
        AnnouncementCategory::Notice
    }
}

define_name_enum! {
    AnnouncementPriority("priority") {
        Normal = "normal",
        Important = "important",
        Urgent = "urgent",
    }
}

impl Default for AnnouncementPriority {
    fn default() -> Self {
        AnnouncementPriority::Normal
    }
}

define_name_enum! {
    AnnouncementStatus("status") {
        Draft = "draft",
        Published = "published",
        Archived = "archived",
    }
}

impl Default for AnnouncementStatus {
    fn default() -> Self {
        AnnouncementStatus::Published
    }
}

/// Published and not yet expired at `now`.
pub fn is_visible(
    status: AnnouncementStatus,
    expiry_date: Option<Timestamp>,
    now: Timestamp,
) -> bool {
    status == AnnouncementStatus::Published && expiry_date.map_or(true, |expiry| expiry >= now)
}

/// Store-side equivalent of [`is_visible`].
pub fn visible_predicate(now: Timestamp) -> Predicate {
    Predicate::and([
        Predicate::eq("status", AnnouncementStatus::Published.name()),
        Predicate::or([
            Predicate::IsNull("expiry_date"),
            Predicate::gte("expiry_date", now),
        ]),
    ])
}

pub fn validate_dates(publish_date: Timestamp, expiry_date: Option<Timestamp>) -> Result<(), CoreError> {
    match expiry_date {
        Some(expiry) if expiry < publish_date => Err(CoreError::Validation(
            "Expiry date cannot precede publish date".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn test_visibility() {
        let now = Utc::now();
        assert!(is_visible(AnnouncementStatus::Published, None, now));
        assert!(is_visible(AnnouncementStatus::Published, Some(now), now));
        assert!(!is_visible(
            AnnouncementStatus::Published,
            Some(now - Duration::minutes(1)),
            now
        ));
        assert!(!is_visible(AnnouncementStatus::Draft, None, now));
        assert!(!is_visible(AnnouncementStatus::Archived, None, now));
    }

    #[test]
    fn test_expiry_must_follow_publish() {
        let now = Utc::now();
        assert!(validate_dates(now, None).is_ok());
        assert!(validate_dates(now, Some(now + Duration::days(2))).is_ok());
        assert!(validate_dates(now, Some(now - Duration::days(2))).is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(AnnouncementCategory::default(), AnnouncementCategory::Notice);
        assert_eq!(AnnouncementPriority::default(), AnnouncementPriority::Normal);
        assert_eq!(AnnouncementStatus::default(), AnnouncementStatus::Published);
    }
}
