//! Route definitions for the `/users` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/users` (admin only).
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create
/// GET    /stats                   -> stats
/// GET    /department/{department} -> by_department
/// GET    /{id}                    -> get
/// PUT    /{id}                    -> update
/// DELETE /{id}                    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(user::list).post(user::create))
        .route("/stats", get(user::stats))
        .route("/department/{department}", get(user::by_department))
        .route(
            "/{id}",
            get(user::get).put(user::update).delete(user::delete),
        )
}
