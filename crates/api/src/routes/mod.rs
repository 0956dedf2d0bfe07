pub mod announcements;
pub mod auth;
pub mod documents;
pub mod health;
pub mod projects;
pub mod users;
pub mod work_items;

use axum::Router;

use crate::state::AppState;

/// Allowance for multipart boundaries and text fields on top of a file limit.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                       register (public)
/// /auth/login                          login (public)
/// /auth/me                             current account
/// /auth/password                       change password
/// /auth/profile                        update own profile
/// /auth/profile-image                  upload profile image
///
/// /users                               list, create (admin)
/// /users/stats                         aggregates
/// /users/department/{department}       active staff of a department
/// /users/{id}                          get, update, delete
///
/// /tasks                               list, create
/// /tasks/stats                         aggregates
/// /tasks/{id}                          get, update, delete
///
/// /assignments                         list, create
/// /assignments/stats                   aggregates
/// /assignments/{id}                    get, update, delete
/// /assignments/{id}/comments           append comment
///
/// /projects                            list, create (admin)
/// /projects/stats                      aggregates
/// /projects/{id}                       get, update, delete
/// /projects/{id}/assign                replace roster
///
/// /documents                           list, upload
/// /documents/stats                     aggregates
/// /documents/{id}                      get, update, delete
/// /documents/{id}/download             stream file
///
/// /announcements                       list (public), create
/// /announcements/featured              featured strip (public)
/// /announcements/stats                 aggregates
/// /announcements/{id}                  get (public), update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/tasks", work_items::tasks_router())
        .nest("/assignments", work_items::assignments_router())
        .nest("/projects", projects::router())
        .nest("/documents", documents::router())
        .nest("/announcements", announcements::router())
}
