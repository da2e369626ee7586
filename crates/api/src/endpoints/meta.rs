//! Service metadata and liveness.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::middleware::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: "crimewatch",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routes served outside `/api`.
pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
