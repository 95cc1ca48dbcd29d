use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::AdminConfig;
use crate::directory::domain::{ProfessionalId, RegistrationForm};
use crate::directory::memory::{standard_categories, MemoryStore};
use crate::directory::moderation::Moderation;
use crate::directory::query::DirectoryQuery;
use crate::directory::registration::RegistrationEngine;
use crate::directory::router::{directory_router, ApiState};

/// Minimum bcrypt cost keeps the registration tests fast.
pub(super) const TEST_HASH_COST: u32 = 4;

pub(super) fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_categories(standard_categories()))
}

pub(super) fn admin() -> AdminConfig {
    AdminConfig {
        email: "admin@kids-platform.jp".to_string(),
        password: "demo123".to_string(),
    }
}

pub(super) fn engine(store: Arc<MemoryStore>) -> RegistrationEngine {
    RegistrationEngine::with_hash_cost(store, TEST_HASH_COST)
}

pub(super) fn query(store: Arc<MemoryStore>) -> DirectoryQuery {
    DirectoryQuery::new(store)
}

pub(super) fn moderation(store: Arc<MemoryStore>) -> Moderation {
    Moderation::new(store)
}

pub(super) fn api_router(store: Arc<MemoryStore>) -> axum::Router {
    directory_router(ApiState::with_hash_cost(store, admin(), TEST_HASH_COST))
}

/// Complete, valid registration form for a piano teacher in Kanto.
pub(super) fn piano_teacher_form() -> RegistrationForm {
    RegistrationForm {
        email: Some("misaki@example.com".to_string()),
        password: Some("password123".to_string()),
        display_name: Some("田中美咲".to_string()),
        activity_area: Some("関東地方".to_string()),
        target_age_min: Some("4".to_string()),
        target_age_max: Some("12".to_string()),
        service_format: Some("offline".to_string()),
        bio: Some("音楽大学卒業後、10年間ピアノ講師として活動しています。".to_string()),
        skills: Some("ピアノ\nソルフェージュ".to_string()),
        hourly_rate_min: Some("3000".to_string()),
        hourly_rate_max: Some("5000".to_string()),
        categories: vec!["music".to_string()],
        ..RegistrationForm::default()
    }
}

/// Second valid form with distinct email, area, and category.
pub(super) fn tutor_form() -> RegistrationForm {
    RegistrationForm {
        email: Some("kenta@example.com".to_string()),
        password: Some("password123".to_string()),
        display_name: Some("佐藤健太".to_string()),
        activity_area: Some("東京都".to_string()),
        service_format: Some("online".to_string()),
        bio: Some("中学受験指導を専門とする学習塾講師です。".to_string()),
        categories: vec!["education".to_string()],
        ..RegistrationForm::default()
    }
}

pub(super) async fn register(store: &Arc<MemoryStore>, form: RegistrationForm) -> ProfessionalId {
    engine(store.clone())
        .register(form)
        .await
        .expect("registration accepted")
        .id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
