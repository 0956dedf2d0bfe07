//! Handlers for the `/auth` resource (registration, login, own account).

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::error::CoreError;
use portal_core::roles::Role;
use portal_core::upload;
use portal_core::user::{clean_optional, normalize_email, validate_password};
use portal_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use portal_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::storage::PROFILES_DIR;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "is required"))]
    pub full_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub phone: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Request body for `PUT /auth/password`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for `PUT /auth/profile`. Only the caller's own contact
/// details are editable here; role, department and status are admin-managed.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub full_name: Option<String>,
    pub designation: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 500, message = "cannot exceed 500 characters"))]
    pub bio: Option<String>,
}

/// Successful authentication: a fresh token plus the account.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserResponse,
}

/// `{ success, user }` for the caller's own account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub user: UserResponse,
}

impl AccountResponse {
    fn new(user: User) -> Self {
        Self {
            success: true,
            user: user.into(),
        }
    }
}

/// Response for `PUT /auth/password`.
#[derive(Debug, Serialize)]
pub struct PasswordChangedResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Public sign-up. New accounts always get the `user` role.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    validate_password(&input.password)?;
    let email = normalize_email(&input.email);
    let username = input.username.trim().to_string();

    if UserRepo::identity_taken(&state.pool, Some(&email), Some(&username), None, None).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "User already exists with this email or username".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            password_hash,
            role: Role::User,
            full_name: input.full_name.trim().to_string(),
            department: clean_optional(input.department.as_deref()),
            designation: clean_optional(input.designation.as_deref()),
            employee_id: None,
            phone: clean_optional(input.phone.as_deref()),
            address: None,
            bio: None,
            is_active: true,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid credentials".into()));

    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Your account has been deactivated".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let now = Utc::now();
    UserRepo::record_login(&state.pool, user.id, now).await?;
    let user = User {
        last_login: Some(now),
        ..user
    };

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser) -> Json<AccountResponse> {
    Json(AccountResponse::new(auth.user))
}

/// PUT /api/v1/auth/password
///
/// Change the caller's password and hand back a fresh token.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<ChangePasswordRequest>,
) -> AppResult<Json<PasswordChangedResponse>> {
    let matches = verify_password(&input.current_password, &auth.user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !matches {
        return Err(AppError::Core(CoreError::Validation(
            "Current password is incorrect".into(),
        )));
    }
    validate_password(&input.new_password)?;

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, auth.user.id, &password_hash).await?;

    tracing::info!(user_id = auth.user.id, "Password changed");

    let token = issue_token(&state, &auth.user)?;
    Ok(Json(PasswordChangedResponse {
        success: true,
        message: "Password updated successfully".into(),
        token,
    }))
}

/// PUT /api/v1/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<AccountResponse>> {
    let update = UpdateUser {
        full_name: input.full_name.map(|n| n.trim().to_string()),
        designation: input.designation,
        phone: input.phone,
        address: input.address,
        bio: input.bio,
        ..UpdateUser::default()
    };

    let user = UserRepo::update(&state.pool, auth.user.id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user.id,
        }))?;

    Ok(Json(AccountResponse::new(user)))
}

/// PUT /api/v1/auth/profile-image
///
/// Multipart upload with a single `profileImage` field (image/*, max 5 MiB).
/// The previous image file is removed once the new one is recorded.
pub async fn upload_profile_image(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<AccountResponse>> {
    let mut image: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("profileImage") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("profile").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        image = Some((original_name, content_type, data.to_vec()));
    }

    let (original_name, content_type, data) = image
        .ok_or_else(|| AppError::BadRequest("Missing required 'profileImage' field".into()))?;
    upload::validate_profile_image(content_type.as_deref(), data.len())?;

    let unique = Uuid::new_v4().simple().to_string();
    let stored_name = upload::stored_file_name("profile", &unique, &original_name);
    let stored_path = state
        .files
        .save(PROFILES_DIR, &stored_name, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store profile image: {e}")))?;

    let updated = UserRepo::update_profile_image(&state.pool, auth.user.id, &stored_path).await;
    let user = match updated {
        Ok(Some(user)) => user,
        Ok(None) => {
            state.files.remove(&stored_path).await;
            return Err(AppError::Core(CoreError::NotFound {
                entity: "User",
                id: auth.user.id,
            }));
        }
        Err(e) => {
            state.files.remove(&stored_path).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = auth.user.profile_image.as_deref() {
        state.files.remove(previous).await;
    }

    Ok(Json(AccountResponse::new(user)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn issue_token(state: &AppState, user: &User) -> AppResult<String> {
    generate_token(user.id, user.role(), &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
}
