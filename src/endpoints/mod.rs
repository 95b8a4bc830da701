pub mod certificates;
pub mod charging;
pub mod stream;
pub mod transfer;

use axum::Router;

use crate::config::CONFIG;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/system/version", axum::routing::get(get_version))
        .nest("/api", api_routes(state))
}

/// API routes under /api/*
fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/charging", charging::charging_routes(state.clone()))
        .nest("/certificates", certificates::certificates_routes(state.clone()))
        .merge(transfer::transfer_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": CONFIG.version,
        "commit_hash": CONFIG.commit_hash,
        "build_time": CONFIG.build_time,
        "rust_version": "1.83",
        "backend": "rust"
    }))
}
