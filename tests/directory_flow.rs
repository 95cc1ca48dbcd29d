use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use pro_directory::config::AdminConfig;
use pro_directory::directory::memory::standard_categories;
use pro_directory::directory::{directory_router, ApiState, MemoryStore};

const TEST_HASH_COST: u32 = 4;

fn router() -> Router {
    let store = Arc::new(MemoryStore::with_categories(standard_categories()));
    let admin = AdminConfig {
        email: "admin@kids-platform.jp".to_string(),
        password: "demo123".to_string(),
    };
    directory_router(ApiState::with_hash_cost(store, admin, TEST_HASH_COST))
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

async fn get(router: &Router, path: &str) -> Response {
    send(router, Request::get(path).body(Body::empty()).expect("request")).await
}

async fn post_json(router: &Router, path: &str, payload: Value) -> Response {
    send(
        router,
        Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request"),
    )
    .await
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn registration_payload(email: &str, name: &str) -> Value {
    json!({
        "email": email,
        "password": "password123",
        "display_name": name,
        "activity_area": "関東地方",
        "target_age_min": "4",
        "target_age_max": "12",
        "service_format": "offline",
        "bio": "音楽大学卒業後、10年間ピアノ講師として活動しています。",
        "skills": "ピアノ\nソルフェージュ",
        "categories": ["music"]
    })
}

#[tokio::test]
async fn registration_to_publication_flow() {
    let router = router();

    // Sign-up lands in the moderation queue, invisible to the public.
    let response = post_json(
        &router,
        "/api/professionals/register",
        registration_payload("misaki@example.com", "田中美咲"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    let id = receipt.get("id").and_then(Value::as_i64).expect("id");

    let public = body_json(get(&router, "/api/professionals").await).await;
    assert_eq!(public.as_array().expect("array").len(), 0);

    let applications = body_json(get(&router, "/api/admin/applications").await).await;
    let rows = applications.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("status").and_then(Value::as_str),
        Some("pending")
    );

    // Approval publishes the profile.
    let response = post_json(
        &router,
        &format!("/api/admin/professionals/{id}/approve"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let public = body_json(get(&router, "/api/professionals").await).await;
    let rows = public.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("display_name").and_then(Value::as_str),
        Some("田中美咲")
    );

    // Profile fetches succeed and accumulate views.
    let first = body_json(get(&router, &format!("/api/professionals/{id}")).await).await;
    assert_eq!(first.get("view_count").and_then(Value::as_i64), Some(0));
    let second = body_json(get(&router, &format!("/api/professionals/{id}")).await).await;
    assert_eq!(second.get("view_count").and_then(Value::as_i64), Some(1));

    // Rejection takes it back down.
    let response = post_json(
        &router,
        &format!("/api/admin/professionals/{id}/reject"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let public = body_json(get(&router, "/api/professionals").await).await;
    assert_eq!(public.as_array().expect("array").len(), 0);

    let response = get(&router, &format!("/api/professionals/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn directory_filters_over_http() {
    let router = router();

    for (email, name) in [
        ("misaki@example.com", "田中美咲"),
        ("kaori@example.com", "鈴木かおり"),
    ] {
        let response = post_json(
            &router,
            "/api/professionals/register",
            registration_payload(email, name),
        )
        .await;
        let receipt = body_json(response).await;
        let id = receipt.get("id").and_then(Value::as_i64).expect("id");
        post_json(
            &router,
            &format!("/api/admin/professionals/{id}/approve"),
            json!({}),
        )
        .await;
    }

    let all = body_json(get(&router, "/api/professionals").await).await;
    assert_eq!(all.as_array().expect("array").len(), 2);

    let by_keyword = body_json(
        get(&router, "/api/professionals?keyword=%E3%81%8B%E3%81%8A%E3%82%8A").await,
    )
    .await;
    let rows = by_keyword.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("display_name").and_then(Value::as_str),
        Some("鈴木かおり")
    );

    let by_category = body_json(get(&router, "/api/professionals?category=education").await).await;
    assert_eq!(by_category.as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn admin_session_flow() {
    let router = router();

    let denied = post_json(
        &router,
        "/api/admin/login",
        json!({ "email": "admin@kids-platform.jp", "password": "wrong" }),
    )
    .await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let granted = post_json(
        &router,
        "/api/admin/login",
        json!({ "email": "admin@kids-platform.jp", "password": "demo123" }),
    )
    .await;
    assert_eq!(granted.status(), StatusCode::OK);
    let payload = body_json(granted).await;
    assert_eq!(
        payload.pointer("/user/name").and_then(Value::as_str),
        Some("システム管理者")
    );
}
