//! Route definitions for the `/auth` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use portal_core::upload::MAX_PROFILE_IMAGE_BYTES;

use super::MULTIPART_OVERHEAD_BYTES;
use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register       -> register (public)
/// POST /login          -> login (public)
/// GET  /me             -> me
/// PUT  /password       -> change_password
/// PUT  /profile        -> update_profile
/// PUT  /profile-image  -> upload_profile_image (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/password", put(auth::change_password))
        .route("/profile", put(auth::update_profile))
        .route(
            "/profile-image",
            put(auth::upload_profile_image).layer(DefaultBodyLimit::max(
                MAX_PROFILE_IMAGE_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
}
