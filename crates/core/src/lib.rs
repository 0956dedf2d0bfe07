//! Pure domain layer of the commission portal.
//!
//! Nothing in this crate performs I/O: the access-control policy, the query
//! predicate and pagination model, and every derived-field rule (progress,
//! overdue, completion date, announcement visibility) live here so the db and
//! api crates share one definition of each.

#[macro_use]
mod macros;

pub mod actor;
pub mod announcement;
pub mod document;
pub mod error;
pub mod policy;
pub mod project;
pub mod query;
pub mod roles;
pub mod stats;
pub mod types;
pub mod upload;
pub mod user;
pub mod work_item;
