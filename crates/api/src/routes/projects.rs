//! Route definitions for the `/projects` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects` (admin only).
///
/// ```text
/// GET    /             -> list
/// POST   /             -> create
/// GET    /stats        -> stats
/// GET    /{id}         -> get (with roster and linked tasks)
/// PUT    /{id}         -> update
/// DELETE /{id}         -> delete
/// PUT    /{id}/assign  -> assign_employees
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/stats", get(project::stats))
        .route(
            "/{id}",
            get(project::get)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/assign", put(project::assign_employees))
}
