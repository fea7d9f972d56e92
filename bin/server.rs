// Brawl Chronicle - Preview Server
// Serves the rendered site plus a small JSON API over history and view days

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use brawl_chronicle::{
    build_view, parse_snapshot, resolve, CatalogCache, ChronicleConfig, DisplayDay, History,
    HistoryStore,
};

/// Loaded once at startup; read-only afterwards
struct AppState {
    history: History,
    days: Vec<DisplayDay>,
}

type SharedState = Arc<AppState>;

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/history - Persisted history as stored
async fn get_history(State(state): State<SharedState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.history.clone()))
}

/// GET /api/days - All view days, newest first
async fn get_days(State(state): State<SharedState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.days.clone()))
}

/// GET /api/days/:date - One view day
async fn get_day(State(state): State<SharedState>, Path(date): Path<String>) -> impl IntoResponse {
    let parsed = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<DisplayDay>::err(format!("invalid date: {}", date))),
            )
                .into_response()
        }
    };

    match state.days.iter().find(|day| day.date == parsed) {
        Some(day) => (StatusCode::OK, Json(ApiResponse::ok(day.clone()))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<DisplayDay>::err(format!("no record for {}", date))),
        )
            .into_response(),
    }
}

// ============================================================================
// Startup
// ============================================================================

fn load_state(config: &ChronicleConfig) -> Result<AppState> {
    let history = HistoryStore::new(config.history_path())
        .load_strict()
        .context("Failed to load history")?;
    println!("✓ History loaded: {} days", history.len());

    let cache = CatalogCache::new(config.cache_path(), config.cache_max_age);
    let entries = parse_snapshot(&cache.read()?).context("Failed to load cached catalog")?;
    let catalog = resolve(&entries, &config.preference());
    println!("✓ Catalog loaded: {} logical cards", catalog.len());

    let days = build_view(&history, &catalog);
    Ok(AppState { history, days })
}

fn router(state: SharedState, docs_dir: &std::path::Path) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/history", get(get_history))
        .route("/days", get(get_days))
        .route("/days/:date", get(get_day))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(docs_dir))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🌐 Brawl Chronicle - Preview Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = ChronicleConfig::default();
    let state = Arc::new(load_state(&config)?);
    let app = router(state, &config.docs_dir);

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API:  http://localhost:3000/api/days");
    println!("   Site: http://localhost:3000 (from {})", config.docs_dir.display());
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server stopped")?;
    Ok(())
}
