//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portal_core::actor::Actor;
use portal_core::error::CoreError;
use portal_db::models::user::User;
use portal_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller resolved from a JWT Bearer token.
///
/// The account is reloaded from the store on every request, so role changes
/// and deactivation take effect immediately:
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.actor.id, role = %auth.actor.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Request-scoped identity passed to the policy.
    pub actor: Actor,
    /// The freshly loaded account row.
    pub user: User,
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Authentication required"))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            unauthorized("Invalid Authorization format. Expected: Bearer <token>")
        })?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let user = UserRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| unauthorized("User no longer exists"))?;

        if !user.is_active {
            return Err(unauthorized("Account is deactivated"));
        }

        Ok(AuthUser {
            actor: user.to_actor(),
            user,
        })
    }
}

/// Optional authentication for routes that are also open to the public.
///
/// A missing header, a bad or expired token, and a deactivated account all
/// resolve to the anonymous caller; store failures still propagate.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref().map(|auth| &auth.actor)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(auth) => Ok(MaybeAuthUser(Some(auth))),
            Err(AppError::Core(CoreError::Unauthorized(_))) => Ok(MaybeAuthUser(None)),
            Err(e) => Err(e),
        }
    }
}
