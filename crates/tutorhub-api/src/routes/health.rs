//! Health check endpoints

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::state::AppState;

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Health check handler
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("tutorhub_health_checks_total").increment(1);

    let (status, database) = match state.db.has_accounts().await {
        Ok(_) => ("healthy", "ok"),
        Err(e) => {
            warn!("Health check database probe failed: {}", e);
            ("degraded", "unavailable")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

/// GET / - welcome banner
async fn index() -> Json<Value> {
    Json(json!({ "data": "Welcome to TutorHub" }))
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/healthz", get(health))
}
