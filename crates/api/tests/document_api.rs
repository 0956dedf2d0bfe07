//! HTTP-level tests for `/documents`: multipart upload, visibility scoping
//! and the download counter.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{body_bytes, body_json, delete_auth, get_auth, seed_user, send_multipart, Part};
use portal_core::roles::Role;
use portal_core::types::DbId;
use portal_db::models::user::User;
use portal_db::repositories::DocumentRepo;
use sqlx::SqlitePool;

const CONTENTS: &[u8] = b"Minutes of the commission meeting";

async fn upload(app: &common::TestApp, admin: &User, title: &str, is_public: &str) -> DbId {
    let token = app.token_for(admin);
    let response = send_multipart(
        app.router(),
        Method::POST,
        "/api/v1/documents",
        &[
            Part::Text("title", title),
            Part::Text("category", "report"),
            Part::Text("tags", "minutes, 2026 ,,minutes"),
            Part::Text("isPublic", is_public),
            Part::File {
                name: "file",
                file_name: "minutes.txt",
                content_type: "text/plain",
                data: CONTENTS,
            },
        ],
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["item"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_records_metadata_and_stores_file(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let id = upload(&app, &admin, "Weekly minutes", "true").await;

    let document = DocumentRepo::find_by_id(&app.pool, id).await.unwrap().unwrap();
    assert_eq!(document.title, "Weekly minutes");
    assert_eq!(document.original_name, "minutes.txt");
    assert_eq!(document.file_size, CONTENTS.len() as i64);
    assert!(document.is_public);
    assert_eq!(document.tags.0, vec!["minutes".to_string(), "2026".to_string()]);
    assert_ne!(document.file_name, "minutes.txt");
    assert!(app.files.resolve(&document.file_path).exists());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_disallowed_extension(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let token = app.token_for(&admin);

    let response = send_multipart(
        app.router(),
        Method::POST,
        "/api/v1/documents",
        &[Part::File {
            name: "file",
            file_name: "payload.exe",
            content_type: "application/octet-stream",
            data: b"MZ",
        }],
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn public_users_cannot_upload(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let citizen = seed_user(&app.pool, "citizen", Role::User).await;
    let token = app.token_for(&citizen);

    let response = send_multipart(
        app.router(),
        Method::POST,
        "/api/v1/documents",
        &[Part::File {
            name: "file",
            file_name: "notes.txt",
            content_type: "text/plain",
            data: b"notes",
        }],
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn private_documents_are_hidden_from_other_users(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let citizen = seed_user(&app.pool, "citizen", Role::User).await;
    upload(&app, &admin, "Public circular", "true").await;
    let private = upload(&app, &admin, "Internal memo", "false").await;

    let token = app.token_for(&citizen);
    let list = body_json(get_auth(app.router(), "/api/v1/documents", Some(&token)).await).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["title"], "Public circular");

    let detail = get_auth(app.router(), &format!("/api/v1/documents/{private}"), Some(&token)).await;
    assert_eq!(detail.status(), StatusCode::FORBIDDEN);

    let download = get_auth(
        app.router(),
        &format!("/api/v1/documents/{private}/download"),
        Some(&token),
    )
    .await;
    assert_eq!(download.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn documents_require_authentication(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app.router(), "/api/v1/documents", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_streams_file_and_counts_once(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let citizen = seed_user(&app.pool, "citizen", Role::User).await;
    let id = upload(&app, &admin, "Public circular", "true").await;
    let token = app.token_for(&citizen);

    let response = get_auth(
        app.router(),
        &format!("/api/v1/documents/{id}/download"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("minutes.txt"));
    assert_eq!(body_bytes(response).await, CONTENTS);

    let document = DocumentRepo::find_by_id(&app.pool, id).await.unwrap().unwrap();
    assert_eq!(document.download_count, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_file_is_404_without_counting(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let id = upload(&app, &admin, "Vanishing file", "true").await;
    let token = app.token_for(&admin);

    let document = DocumentRepo::find_by_id(&app.pool, id).await.unwrap().unwrap();
    std::fs::remove_file(app.files.resolve(&document.file_path)).unwrap();

    let response = get_auth(
        app.router(),
        &format!("/api/v1/documents/{id}/download"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let document = DocumentRepo::find_by_id(&app.pool, id).await.unwrap().unwrap();
    assert_eq!(document.download_count, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn archived_documents_leave_the_default_listing(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let id = upload(&app, &admin, "Old order", "true").await;
    let token = app.token_for(&admin);

    let archived = common::put_json_auth(
        app.router(),
        &format!("/api/v1/documents/{id}"),
        serde_json::json!({ "status": "archived" }),
        Some(&token),
    )
    .await;
    assert_eq!(archived.status(), StatusCode::OK);

    let default = body_json(get_auth(app.router(), "/api/v1/documents", Some(&token)).await).await;
    assert_eq!(default["total"], 0);

    let explicit = body_json(
        get_auth(app.router(), "/api/v1/documents?status=archived", Some(&token)).await,
    )
    .await;
    assert_eq!(explicit["total"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_removes_record_and_file(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let id = upload(&app, &admin, "Disposable", "false").await;
    let token = app.token_for(&admin);
    let document = DocumentRepo::find_by_id(&app.pool, id).await.unwrap().unwrap();

    let response = delete_auth(app.router(), &format!("/api/v1/documents/{id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(DocumentRepo::find_by_id(&app.pool, id).await.unwrap().is_none());
    assert!(!app.files.resolve(&document.file_path).exists());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn archived_documents_are_unreadable_by_id_for_non_privileged(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let citizen = seed_user(&app.pool, "citizen", Role::User).await;
    let id = upload(&app, &admin, "Superseded circular", "true").await;
    let admin_token = app.token_for(&admin);

    let archived = common::put_json_auth(
        app.router(),
        &format!("/api/v1/documents/{id}"),
        serde_json::json!({ "status": "archived" }),
        Some(&admin_token),
    )
    .await;
    assert_eq!(archived.status(), StatusCode::OK);

    let token = app.token_for(&citizen);
    let detail = get_auth(app.router(), &format!("/api/v1/documents/{id}"), Some(&token)).await;
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);

    let download = get_auth(
        app.router(),
        &format!("/api/v1/documents/{id}/download"),
        Some(&token),
    )
    .await;
    assert_eq!(download.status(), StatusCode::NOT_FOUND);

    let privileged = get_auth(app.router(), &format!("/api/v1/documents/{id}"), Some(&admin_token)).await;
    assert_eq!(privileged.status(), StatusCode::OK);

    let document = DocumentRepo::find_by_id(&app.pool, id).await.unwrap().unwrap();
    assert_eq!(document.download_count, 0);
}
