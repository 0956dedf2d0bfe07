//! Route definitions for the `/documents` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use portal_core::upload::MAX_DOCUMENT_BYTES;

use super::MULTIPART_OVERHEAD_BYTES;
use crate::handlers::document;
use crate::state::AppState;

/// Routes mounted at `/documents`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create (multipart, admin only)
/// GET    /stats          -> stats
/// GET    /{id}           -> get
/// PUT    /{id}           -> update
/// DELETE /{id}           -> delete
/// GET    /{id}/download  -> download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(document::list)
                .post(document::create)
                .layer(DefaultBodyLimit::max(
                    MAX_DOCUMENT_BYTES + MULTIPART_OVERHEAD_BYTES,
                )),
        )
        .route("/stats", get(document::stats))
        .route(
            "/{id}",
            get(document::get)
                .put(document::update)
                .delete(document::delete),
        )
        .route("/{id}/download", get(document::download))
}
