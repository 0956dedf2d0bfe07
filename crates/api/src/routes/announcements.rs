//! Route definitions for the `/announcements` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::announcement;
use crate::state::AppState;

/// Routes mounted at `/announcements`.
///
/// ```text
/// GET    /           -> list (public)
/// POST   /           -> create
/// GET    /featured   -> featured (public)
/// GET    /stats      -> stats
/// GET    /{id}       -> get (public, counts a view)
/// PUT    /{id}       -> update
/// DELETE /{id}       -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(announcement::list).post(announcement::create))
        .route("/featured", get(announcement::featured))
        .route("/stats", get(announcement::stats))
        .route(
            "/{id}",
            get(announcement::get)
                .put(announcement::update)
                .delete(announcement::delete),
        )
}
