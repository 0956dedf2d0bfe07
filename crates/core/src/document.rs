//! Document enums and metadata helpers.

use crate::error::CoreError;

/// Maximum title length (characters).
pub const MAX_TITLE_LEN: usize = 200;

define_name_enum! {
    DocumentCategory("category") {
        Form = "form",
        Report = "report",
        Circular = "circular",
        Order = "order",
        Guideline = "guideline",
        Manual = "manual",
        Other = "other",
    }
}

impl Default for DocumentCategory {
    fn default() -> Self {
        DocumentCategory::Other
    }
}

define_name_enum! {
    DocumentStatus("status") {
        Active = "active",
        Archived = "archived",
        Deleted = "deleted",
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        DocumentStatus::Active
    }
}

/// Split a comma-separated tag string, trimming and dropping blanks and
/// repeats while keeping first-seen order.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Title for a new document: the supplied one, else the uploaded file name.
pub fn resolve_title(title: Option<&str>, original_name: &str) -> Result<String, CoreError> {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(original_name)
        .to_string();
    validate_title(&title)?;
    Ok(title)
}

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
