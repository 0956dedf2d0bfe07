//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&SqlitePool` as the first argument. List and stats methods
//! take the caller's scope as a [`portal_core::query::Predicate`].

pub mod announcement_repo;
pub mod comment_repo;
pub mod document_repo;
pub mod project_repo;
pub mod user_repo;
pub mod work_item_repo;

pub use announcement_repo::AnnouncementRepo;
pub use comment_repo::CommentRepo;
pub use document_repo::DocumentRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
pub use work_item_repo::WorkItemRepo;
