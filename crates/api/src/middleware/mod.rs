//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the caller from a JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous callers are allowed.
//! - [`rbac::RequirePrivileged`] -- Requires `superadmin` or `admin`.
//! - [`rbac::ensure`] -- Runs the access policy for a concrete action.

pub mod auth;
pub mod rbac;
