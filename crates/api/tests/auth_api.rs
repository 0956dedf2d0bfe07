//! HTTP-level tests for registration, login and the caller's own account.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, get_auth, post_json, put_json_auth, seed_user_with_password, send_multipart, Part,
    TEST_PASSWORD,
};
use portal_core::roles::Role;
use portal_db::models::user::UpdateUser;
use portal_db::repositories::UserRepo;
use sqlx::SqlitePool;

fn registration(username: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "email": email,
        "password": "secret123",
        "fullName": "New Citizen",
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_creates_public_user_with_token(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/auth/register",
        registration("citizen", "Citizen@Example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["user"]["role"], "user");
    assert_eq!(json["user"]["email"], "citizen@example.com");
    assert!(json["user"].get("passwordHash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_email_is_rejected_without_creating_a_record(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let first = post_json(
        app.router(),
        "/api/v1/auth/register",
        registration("first", "same@example.com"),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        app.router(),
        "/api/v1/auth/register",
        registration("second", "SAME@example.com"),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let json = body_json(second).await;
    assert_eq!(json["success"], false);

    assert_eq!(UserRepo::count_by_role(&app.pool, Role::User).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn short_password_is_rejected(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let mut body = registration("shorty", "shorty@example.com");
    body["password"] = "12345".into();

    let response = post_json(app.router(), "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_with_valid_and_invalid_credentials(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let user = seed_user_with_password(&app.pool, "officer", Role::Employee).await;

    let ok = post_json(
        app.router(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": user.email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    let json = body_json(ok).await;
    assert_eq!(json["user"]["id"], user.id);
    assert!(json["user"]["lastLogin"].is_string());

    let wrong = post_json(
        app.router(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": user.email, "password": "not-the-password" }),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = post_json(
        app.router(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_requires_a_valid_token(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let user = seed_user_with_password(&app.pool, "reader", Role::User).await;

    let anonymous = get_auth(app.router(), "/api/v1/auth/me", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let garbage = get_auth(app.router(), "/api/v1/auth/me", Some("not.a.jwt")).await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let token = app.token_for(&user);
    let response = get_auth(app.router(), "/api/v1/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["username"], "reader");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivated_account_is_rejected_with_a_live_token(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let user = seed_user_with_password(&app.pool, "leaver", Role::Employee).await;
    let token = app.token_for(&user);

    UserRepo::update(
        &app.pool,
        user.id,
        &UpdateUser {
            is_active: Some(false),
            ..UpdateUser::default()
        },
    )
    .await
    .unwrap();

    let response = get_auth(app.router(), "/api/v1/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let login = post_json(
        app.router(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": user.email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn change_password_checks_current_password(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let user = seed_user_with_password(&app.pool, "rotator", Role::Employee).await;
    let token = app.token_for(&user);

    let wrong = put_json_auth(
        app.router(),
        "/api/v1/auth/password",
        serde_json::json!({ "currentPassword": "nope", "newPassword": "fresh-secret" }),
        Some(&token),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);

    let ok = put_json_auth(
        app.router(),
        "/api/v1/auth/password",
        serde_json::json!({ "currentPassword": TEST_PASSWORD, "newPassword": "fresh-secret" }),
        Some(&token),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    let json = body_json(ok).await;
    assert!(json["token"].is_string());

    let login = post_json(
        app.router(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": user.email, "password": "fresh-secret" }),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn profile_update_ignores_admin_managed_fields(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let user = seed_user_with_password(&app.pool, "profiler", Role::Employee).await;
    let token = app.token_for(&user);

    let response = put_json_auth(
        app.router(),
        "/api/v1/auth/profile",
        serde_json::json!({ "bio": "Field officer", "phone": "555-0100", "role": "admin" }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["user"]["bio"], "Field officer");
    assert_eq!(json["user"]["phone"], "555-0100");
    assert_eq!(json["user"]["role"], "employee");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn profile_image_must_be_an_image(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let user = seed_user_with_password(&app.pool, "portrait", Role::User).await;
    let token = app.token_for(&user);

    let rejected = send_multipart(
        app.router(),
        Method::PUT,
        "/api/v1/auth/profile-image",
        &[Part::File {
            name: "profileImage",
            file_name: "notes.txt",
            content_type: "text/plain",
            data: b"hello",
        }],
        Some(&token),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let accepted = send_multipart(
        app.router(),
        Method::PUT,
        "/api/v1/auth/profile-image",
        &[Part::File {
            name: "profileImage",
            file_name: "me.png",
            content_type: "image/png",
            data: b"\x89PNG fake",
        }],
        Some(&token),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);

    let stored = UserRepo::find_by_id(&app.pool, user.id)
        .await
        .unwrap()
        .unwrap()
        .profile_image
        .expect("profile image recorded");
    assert!(app.files.resolve(&stored).exists());
}
