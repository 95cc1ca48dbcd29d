use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use pro_directory::config::AppConfig;
use pro_directory::directory::memory::standard_categories;
use pro_directory::directory::{
    ApiState, DirectoryError, DirectoryQuery, DirectoryStore, MemoryStore, Moderation,
    ProfessionalId, RegistrationEngine, RegistrationForm, SqliteStore,
};
use pro_directory::error::AppError;
use pro_directory::telemetry;
use serde_json::json;
use tracing::info;

#[derive(Clone)]
struct OpsState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Professional Directory",
    about = "Run the kids-platform professional directory service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Load demo professionals into the configured store
    Seed,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Seed => run_seed().await,
    }
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn DirectoryStore>, AppError> {
    if config.database.is_memory() {
        info!("using in-memory store");
        return Ok(Arc::new(MemoryStore::with_categories(standard_categories())));
    }

    info!(url = %config.database.url, "connecting SQLite store");
    let store = SqliteStore::connect(&config.database.url)
        .await
        .map_err(DirectoryError::from)?;
    Ok(Arc::new(store))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = build_store(&config).await?;
    let api_state = ApiState::new(store, config.admin.clone());

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let ops_state = OpsState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(ops_state)
        .merge(pro_directory::directory::directory_router(api_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "professional directory ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Register the demo roster through the ordinary intake path, then approve
/// the first three so the public directory has content immediately.
async fn run_seed() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let store = build_store(&config).await?;
    let registration = RegistrationEngine::new(store.clone());
    let moderation = Moderation::new(store.clone());
    let query = DirectoryQuery::new(store);

    let mut approved: Vec<ProfessionalId> = Vec::new();
    for (index, form) in demo_roster().into_iter().enumerate() {
        let receipt = registration.register(form).await?;
        if index < 3 {
            approved.push(receipt.id);
        }
    }

    for id in approved {
        moderation.approve(id).await?;
    }

    let listed = query.list_public(Default::default()).await?;
    println!("seeded {} published professionals", listed.len());

    Ok(())
}

fn demo_roster() -> Vec<RegistrationForm> {
    vec![
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
        },
        RegistrationForm {
            email: Some("kenta@example.com".to_string()),
            password: Some("password123".to_string()),
            display_name: Some("佐藤健太".to_string()),
            activity_area: Some("関東地方".to_string()),
            target_age_min: Some("10".to_string()),
            target_age_max: Some("15".to_string()),
            service_format: Some("both".to_string()),
            bio: Some("中学受験指導を専門とする学習塾講師です。".to_string()),
            skills: Some("算数\n理科".to_string()),
            hourly_rate_min: Some("4000".to_string()),
            hourly_rate_max: Some("6000".to_string()),
            categories: vec!["education".to_string()],
            ..RegistrationForm::default()
        },
        RegistrationForm {
            email: Some("rina@example.com".to_string()),
            password: Some("password123".to_string()),
            display_name: Some("山田リナ".to_string()),
            activity_area: Some("全国".to_string()),
            service_format: Some("online".to_string()),
            bio: Some("子供向けプログラミング教材の開発と企業研修を行っています。".to_string()),
            skills: Some("Scratch\nPython".to_string()),
            categories: vec!["business".to_string(), "programming".to_string()],
            ..RegistrationForm::default()
        },
        RegistrationForm {
            email: Some("miyuki@example.com".to_string()),
            password: Some("password123".to_string()),
            display_name: Some("高橋みゆき".to_string()),
            activity_area: Some("東京都".to_string()),
            service_format: Some("offline".to_string()),
            bio: Some("バイオリン教室を主宰しています。発表会の伴奏も承ります。".to_string()),
            skills: Some("バイオリン".to_string()),
            categories: vec!["music".to_string()],
            ..RegistrationForm::default()
        },
    ]
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
