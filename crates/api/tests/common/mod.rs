#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use portal_api::auth::jwt::{generate_token, JwtConfig};
use portal_api::config::ServerConfig;
use portal_api::router::build_app_router;
use portal_api::state::AppState;
use portal_api::storage::FileStore;
use portal_core::roles::Role;
use portal_db::models::user::{CreateUser, User};
use portal_db::repositories::UserRepo;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const MULTIPART_BOUNDARY: &str = "portal-test-boundary";

/// Build a test `ServerConfig` with safe defaults and the given upload root.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir,
        database_url: "sqlite::memory:".to_string(),
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiry_hours: 1,
        },
        bootstrap_admin: None,
    }
}

/// A router plus the handles tests need to seed data and inspect uploads.
///
/// The temporary upload directory lives as long as the `TestApp`.
pub struct TestApp {
    pub pool: SqlitePool,
    pub config: ServerConfig,
    pub files: Arc<FileStore>,
    router: Router,
    _uploads: TempDir,
}

impl TestApp {
    /// A fresh handle to the router (each `oneshot` consumes one).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Mint a valid access token for `user`.
    pub fn token_for(&self, user: &User) -> String {
        generate_token(user.id, user.role(), &self.config.jwt).expect("token generation")
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: SqlitePool) -> TestApp {
    let uploads = TempDir::new().expect("temp upload dir");
    let config = test_config(uploads.path().to_path_buf());
    let files = Arc::new(FileStore::new(uploads.path()));

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        files: Arc::clone(&files),
    };
    let router = build_app_router(state, &config);

    TestApp {
        pool,
        config,
        files,
        router,
        _uploads: uploads,
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub const TEST_PASSWORD: &str = "secret123";

/// Insert a user directly. Only `with_password` users can log in.
pub async fn seed_user(pool: &SqlitePool, username: &str, role: Role) -> User {
    seed_user_in(pool, username, role, "Planning").await
}

pub async fn seed_user_in(pool: &SqlitePool, username: &str, role: Role, department: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@commission.test"),
            password_hash: "not-a-real-hash".to_string(),
            role,
            full_name: format!("{username} full"),
            department: Some(department.to_string()),
            designation: None,
            employee_id: None,
            phone: None,
            address: None,
            bio: None,
            is_active: true,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Insert a user whose password is [`TEST_PASSWORD`].
pub async fn seed_user_with_password(pool: &SqlitePool, username: &str, role: Role) -> User {
    let user = seed_user(pool, username, role).await;
    let hash = portal_api::auth::password::hash_password(TEST_PASSWORD).expect("hashing");
    UserRepo::update_password(pool, user.id, &hash)
        .await
        .expect("password update");
    UserRepo::find_by_id(pool, user.id)
        .await
        .expect("reload")
        .expect("user exists")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    get_auth(app, uri, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let request = builder(Method::GET, uri, token)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_json_auth(app, uri, body, None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    json_request(app, Method::POST, uri, body, token).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, body, token).await
}

pub async fn delete_auth(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let request = builder(Method::DELETE, uri, token)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    let request = builder(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// A multipart part: text field or file field.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn send_multipart(
    app: Router,
    method: Method,
    uri: &str,
    parts: &[Part<'_>],
    token: Option<&str>,
) -> Response<Body> {
    let request = builder(method, uri, token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
