//! HTTP-level tests for `/projects`: progress recompute, roster and delete
//! guard.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth, seed_user};
use portal_core::roles::Role;
use portal_core::types::DbId;
use portal_db::models::user::User;
use sqlx::SqlitePool;

async fn create_project(app: &common::TestApp, admin: &User) -> DbId {
    let token = app.token_for(admin);
    let body = serde_json::json!({
        "projectName": "Flood relief mapping",
        "description": "Map relief camps across districts",
        "department": "Relief",
        "deadline": (Utc::now() + Duration::days(60)).to_rfc3339(),
        "priority": "urgent",
    });
    let response = post_json_auth(app.router(), "/api/v1/projects", body, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["item"]["status"], "planning");
    assert_eq!(json["item"]["progress"], 0);
    json["item"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn progress_is_recomputed_from_counts(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let id = create_project(&app, &admin).await;
    let token = app.token_for(&admin);
    let uri = format!("/api/v1/projects/{id}");

    let partial = body_json(
        put_json_auth(
            app.router(),
            &uri,
            serde_json::json!({ "totalTasks": 10, "completedTasks": 4, "status": "active" }),
            Some(&token),
        )
        .await,
    )
    .await;
    assert_eq!(partial["item"]["progress"], 40);
    assert_eq!(partial["item"]["status"], "active");

    let finished = body_json(
        put_json_auth(
            app.router(),
            &uri,
            serde_json::json!({ "totalTasks": 5, "completedTasks": 5, "status": "on_hold" }),
            Some(&token),
        )
        .await,
    )
    .await;
    assert_eq!(finished["item"]["progress"], 100);
    assert_eq!(finished["item"]["status"], "completed");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn inconsistent_counts_are_rejected(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let id = create_project(&app, &admin).await;
    let token = app.token_for(&admin);

    let response = put_json_auth(
        app.router(),
        &format!("/api/v1/projects/{id}"),
        serde_json::json!({ "totalTasks": 3, "completedTasks": 4 }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deadline_cannot_precede_start(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let token = app.token_for(&admin);

    let body = serde_json::json!({
        "projectName": "Backwards",
        "description": "Ends before it starts",
        "department": "Relief",
        "startDate": Utc::now().to_rfc3339(),
        "deadline": (Utc::now() - Duration::days(1)).to_rfc3339(),
    });
    let response = post_json_auth(app.router(), "/api/v1/projects", body, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_is_blocked_while_tasks_link_to_project(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let employee = seed_user(&app.pool, "field", Role::Employee).await;
    let id = create_project(&app, &admin).await;
    let token = app.token_for(&admin);

    let task = serde_json::json!({
        "title": "Camp census",
        "description": "Count residents per camp",
        "assignedTo": employee.id,
        "dueDate": (Utc::now() + Duration::days(7)).to_rfc3339(),
        "project": id,
    });
    let created = post_json_auth(app.router(), "/api/v1/tasks", task, Some(&token)).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let task_id = body_json(created).await["item"]["id"].as_i64().unwrap();

    let blocked = delete_auth(app.router(), &format!("/api/v1/projects/{id}"), Some(&token)).await;
    assert_eq!(blocked.status(), StatusCode::BAD_REQUEST);

    let detail = body_json(get_auth(app.router(), &format!("/api/v1/projects/{id}"), Some(&token)).await).await;
    assert_eq!(detail["item"]["tasks"].as_array().unwrap().len(), 1);

    let removed = delete_auth(app.router(), &format!("/api/v1/tasks/{task_id}"), Some(&token)).await;
    assert_eq!(removed.status(), StatusCode::OK);

    let deleted = delete_auth(app.router(), &format!("/api/v1/projects/{id}"), Some(&token)).await;
    assert_eq!(deleted.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn roster_accepts_only_staff(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let employee = seed_user(&app.pool, "field", Role::Employee).await;
    let citizen = seed_user(&app.pool, "citizen", Role::User).await;
    let id = create_project(&app, &admin).await;
    let token = app.token_for(&admin);
    let uri = format!("/api/v1/projects/{id}/assign");

    let rejected = put_json_auth(
        app.router(),
        &uri,
        serde_json::json!({ "employeeIds": [employee.id, citizen.id] }),
        Some(&token),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let missing = put_json_auth(
        app.router(),
        &uri,
        serde_json::json!({ "employeeIds": [9999] }),
        Some(&token),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let accepted = put_json_auth(
        app.router(),
        &uri,
        serde_json::json!({ "employeeIds": [employee.id, admin.id, employee.id] }),
        Some(&token),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let json = body_json(accepted).await;
    assert_eq!(json["item"]["assignedEmployees"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn employees_have_no_project_access(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let employee = seed_user(&app.pool, "field", Role::Employee).await;
    let id = create_project(&app, &admin).await;
    let token = app.token_for(&employee);

    let list = get_auth(app.router(), "/api/v1/projects", Some(&token)).await;
    assert_eq!(list.status(), StatusCode::FORBIDDEN);

    let detail = get_auth(app.router(), &format!("/api/v1/projects/{id}"), Some(&token)).await;
    assert_eq!(detail.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn stats_average_progress(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let token = app.token_for(&admin);

    let empty = body_json(get_auth(app.router(), "/api/v1/projects/stats", Some(&token)).await).await;
    assert_eq!(empty["stats"]["total"], 0);
    assert_eq!(empty["stats"]["avgProgress"], 0);

    let first = create_project(&app, &admin).await;
    create_project(&app, &admin).await;
    put_json_auth(
        app.router(),
        &format!("/api/v1/projects/{first}"),
        serde_json::json!({ "totalTasks": 4, "completedTasks": 3 }),
        Some(&token),
    )
    .await;

    let stats = body_json(get_auth(app.router(), "/api/v1/projects/stats", Some(&token)).await).await;
    assert_eq!(stats["stats"]["total"], 2);
    assert_eq!(stats["stats"]["planning"], 2);
    // (75 + 0) / 2 = 37.5 -> 38
    assert_eq!(stats["stats"]["avgProgress"], 38);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn huge_task_counts_compute_progress(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let id = create_project(&app, &admin).await;
    let token = app.token_for(&admin);

    let response = put_json_auth(
        app.router(),
        &format!("/api/v1/projects/{id}"),
        serde_json::json!({
            "totalTasks": 100_000_000_000_000_000_i64,
            "completedTasks": 50_000_000_000_000_000_i64,
        }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["item"]["progress"], 50);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn roster_response_reflects_the_write(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let admin = seed_user(&app.pool, "chief", Role::Admin).await;
    let employee = seed_user(&app.pool, "field", Role::Employee).await;
    let id = create_project(&app, &admin).await;
    let token = app.token_for(&admin);

    let before = body_json(get_auth(app.router(), &format!("/api/v1/projects/{id}"), Some(&token)).await).await;

    let assigned = body_json(
        put_json_auth(
            app.router(),
            &format!("/api/v1/projects/{id}/assign"),
            serde_json::json!({ "employeeIds": [employee.id] }),
            Some(&token),
        )
        .await,
    )
    .await;

    let after = body_json(get_auth(app.router(), &format!("/api/v1/projects/{id}"), Some(&token)).await).await;
    assert_eq!(assigned["item"]["updatedAt"], after["item"]["updatedAt"]);
    assert_ne!(assigned["item"]["updatedAt"], before["item"]["updatedAt"]);
}
