//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (mostly `Option` fields) for patches
//!
//! Enumerated columns are stored as text; the typed accessors parse them
//! through the `portal_core` enums. Table CHECK constraints keep the stored
//! names inside each enum's set.

pub mod announcement;
pub mod document;
pub mod project;
pub mod user;
pub mod work_item;
