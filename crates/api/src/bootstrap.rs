//! First-start provisioning of the superadmin account.

use portal_core::roles::Role;
use portal_core::user::{normalize_email, validate_password};
use portal_db::models::user::CreateUser;
use portal_db::repositories::UserRepo;
use portal_db::DbPool;

use crate::auth::password::hash_password;
use crate::config::BootstrapAdmin;
use crate::error::{AppError, AppResult};

/// Create the configured superadmin if the store has none yet.
///
/// Returns `true` when an account was created.
pub async fn ensure_superadmin(pool: &DbPool, admin: &BootstrapAdmin) -> AppResult<bool> {
    if UserRepo::count_by_role(pool, Role::SuperAdmin).await? > 0 {
        tracing::debug!("Superadmin already present, skipping bootstrap");
        return Ok(false);
    }

    validate_password(&admin.password)?;
    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: "superadmin".to_string(),
            email: normalize_email(&admin.email),
            password_hash,
            role: Role::SuperAdmin,
            full_name: "Super Administrator".to_string(),
            department: Some("Administration".to_string()),
            designation: None,
            employee_id: None,
            phone: None,
            address: None,
            bio: None,
            is_active: true,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, email = %user.email, "Bootstrap superadmin created");
    Ok(true)
}
