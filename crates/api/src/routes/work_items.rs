//! Route definitions for `/tasks` and `/assignments`.
//!
//! Both resources share one set of handlers; the [`WorkItemKind`] is
//! injected as a request extension by each router.

use axum::routing::{get, post};
use axum::{Extension, Router};
use portal_core::work_item::WorkItemKind;

use crate::handlers::work_item;
use crate::state::AppState;

fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(work_item::list).post(work_item::create))
        .route("/stats", get(work_item::stats))
        .route(
            "/{id}",
            get(work_item::get)
                .put(work_item::update)
                .delete(work_item::delete),
        )
}

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /       -> list
/// POST   /       -> create
/// GET    /stats  -> stats
/// GET    /{id}   -> get
/// PUT    /{id}   -> update
/// DELETE /{id}   -> delete
/// ```
pub fn tasks_router() -> Router<AppState> {
    common_routes().layer(Extension(WorkItemKind::Task))
}

/// Routes mounted at `/assignments`. Same as tasks, plus:
///
/// ```text
/// POST /{id}/comments -> add_comment
/// ```
pub fn assignments_router() -> Router<AppState> {
    common_routes()
        .route("/{id}/comments", post(work_item::add_comment))
        .layer(Extension(WorkItemKind::Assignment))
}
