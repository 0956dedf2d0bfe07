//! Request handlers, one module per resource.

pub mod announcement;
pub mod auth;
pub mod document;
pub mod project;
pub mod user;
pub mod work_item;

use portal_core::error::CoreError;
use portal_core::policy::ResourceKind;
use portal_core::types::DbId;

use crate::error::AppError;

/// 404 for a record of `kind` that does not exist.
pub fn not_found(kind: ResourceKind, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: kind.entity_name(),
        id,
    })
}
