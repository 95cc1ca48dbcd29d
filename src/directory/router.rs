use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::config::AdminConfig;

use super::domain::{DirectoryFilter, ProfessionalId, RegistrationForm};
use super::moderation::Moderation;
use super::query::DirectoryQuery;
use super::registration::RegistrationEngine;
use super::storage::{DirectoryStore, StoreError};
use super::DirectoryError;

const MSG_DATABASE_ERROR: &str = "データベースエラーが発生しました";
const MSG_REGISTRATION_ERROR: &str = "登録処理中にエラーが発生しました";
const MSG_DUPLICATE_EMAIL: &str = "このメールアドレスは既に登録されています";
const MSG_MISSING_FIELDS: &str = "必須項目が入力されていません";
const MSG_INVALID_AGE_RANGE: &str = "対象年齢の下限が上限を超えています";
const MSG_PROFESSIONAL_NOT_FOUND: &str = "プロフェッショナルが見つかりません";
const MSG_APPROVED: &str = "承認が完了しました";
const MSG_REJECTED: &str = "却下が完了しました";
const MSG_LOGIN_MISSING: &str = "メールアドレスとパスワードを入力してください";
const MSG_LOGIN_FAILED: &str = "メールアドレスまたはパスワードが正しくありません";
const MSG_LOGIN_OK: &str = "ログイン成功";

/// Shared handler state: the three engines plus the injected admin
/// credential pair.
#[derive(Clone)]
pub struct ApiState {
    pub registration: Arc<RegistrationEngine>,
    pub query: Arc<DirectoryQuery>,
    pub moderation: Arc<Moderation>,
    pub admin: AdminConfig,
}

impl ApiState {
    pub fn new(store: Arc<dyn DirectoryStore>, admin: AdminConfig) -> Self {
        Self {
            registration: Arc::new(RegistrationEngine::new(store.clone())),
            query: Arc::new(DirectoryQuery::new(store.clone())),
            moderation: Arc::new(Moderation::new(store)),
            admin,
        }
    }

    /// Same wiring with a custom bcrypt cost; tests use the minimum cost.
    pub fn with_hash_cost(store: Arc<dyn DirectoryStore>, admin: AdminConfig, cost: u32) -> Self {
        Self {
            registration: Arc::new(RegistrationEngine::with_hash_cost(store.clone(), cost)),
            query: Arc::new(DirectoryQuery::new(store.clone())),
            moderation: Arc::new(Moderation::new(store)),
            admin,
        }
    }
}

/// API facade translating HTTP requests into engine calls and typed errors
/// into localized JSON bodies.
pub fn directory_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/professionals", get(list_professionals_handler))
        .route("/api/professionals/register", post(register_handler))
        .route("/api/professionals/:id", get(get_professional_handler))
        .route("/api/categories", get(categories_handler))
        .route("/api/admin/login", post(admin_login_handler))
        .route("/api/admin/applications", get(admin_applications_handler))
        .route(
            "/api/admin/professionals/:id/approve",
            post(approve_handler),
        )
        .route("/api/admin/professionals/:id/reject", post(reject_handler))
        .with_state(state)
}

fn server_error(message: &'static str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

async fn list_professionals_handler(
    State(state): State<ApiState>,
    Query(filter): Query<DirectoryFilter>,
) -> Response {
    match state.query.list_public(filter).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(_) => server_error(MSG_DATABASE_ERROR),
    }
}

async fn get_professional_handler(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Response {
    match state.query.get_public(ProfessionalId(id)).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(DirectoryError::Store(StoreError::NotFound)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": MSG_PROFESSIONAL_NOT_FOUND })),
        )
            .into_response(),
        Err(_) => server_error(MSG_DATABASE_ERROR),
    }
}

async fn register_handler(
    State(state): State<ApiState>,
    Json(form): Json<RegistrationForm>,
) -> Response {
    match state.registration.register(form).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "id": receipt.id,
                "message": receipt.message,
            })),
        )
            .into_response(),
        Err(DirectoryError::MissingFields(fields)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MSG_MISSING_FIELDS, "fields": fields })),
        )
            .into_response(),
        Err(DirectoryError::InvertedAgeRange { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MSG_INVALID_AGE_RANGE })),
        )
            .into_response(),
        Err(DirectoryError::Store(StoreError::DuplicateEmail)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MSG_DUPLICATE_EMAIL })),
        )
            .into_response(),
        Err(_) => server_error(MSG_REGISTRATION_ERROR),
    }
}

async fn categories_handler(State(state): State<ApiState>) -> Response {
    match state.query.list_categories().await {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(_) => server_error(MSG_DATABASE_ERROR),
    }
}

#[derive(Debug, Deserialize)]
struct AdminLoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

async fn admin_login_handler(
    State(state): State<ApiState>,
    Json(request): Json<AdminLoginRequest>,
) -> Response {
    let email = request.email.as_deref().unwrap_or("").trim();
    let password = request.password.as_deref().unwrap_or("");

    if email.is_empty() || password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MSG_LOGIN_MISSING })),
        )
            .into_response();
    }

    if state.admin.matches(email, password) {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": MSG_LOGIN_OK,
                "user": { "email": email, "name": "システム管理者", "role": "admin" },
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": MSG_LOGIN_FAILED })),
        )
            .into_response()
    }
}

async fn admin_applications_handler(State(state): State<ApiState>) -> Response {
    match state.query.list_all_for_admin().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(_) => server_error(MSG_DATABASE_ERROR),
    }
}

async fn approve_handler(State(state): State<ApiState>, Path(id): Path<i64>) -> Response {
    match state.moderation.approve(ProfessionalId(id)).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": MSG_APPROVED })),
        )
            .into_response(),
        Err(DirectoryError::Store(StoreError::NotFound)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": MSG_PROFESSIONAL_NOT_FOUND })),
        )
            .into_response(),
        Err(_) => server_error(MSG_DATABASE_ERROR),
    }
}

async fn reject_handler(State(state): State<ApiState>, Path(id): Path<i64>) -> Response {
    match state.moderation.reject(ProfessionalId(id)).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": MSG_REJECTED })),
        )
            .into_response(),
        Err(DirectoryError::Store(StoreError::NotFound)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": MSG_PROFESSIONAL_NOT_FOUND })),
        )
            .into_response(),
        Err(_) => server_error(MSG_DATABASE_ERROR),
    }
}
