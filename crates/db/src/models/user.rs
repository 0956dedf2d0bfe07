//! User entity model and DTOs.

use portal_core::actor::Actor;
use portal_core::policy::Resource;
use portal_core::roles::Role;
use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub full_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub last_login: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_name(&self.role).unwrap_or_default()
    }

    /// Request identity for this account.
    pub fn to_actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role(),
            department: self.department.clone(),
        }
    }

    pub fn resource(&self) -> Resource {
        Resource::User { role: self.role() }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub full_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub last_login: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            department: user.department,
            designation: user.designation,
            employee_id: user.employee_id,
            phone: user.phone,
            address: user.address,
            bio: user.bio,
            profile_image: user.profile_image,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Minimal user card for roster and lookup lists.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<String>,
}

/// DTO for creating a new user. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub is_active: bool,
}

/// DTO for updating an existing user. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
}
