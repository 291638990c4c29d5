//! System handlers

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};

use super::AppState;
use crate::http::types::HealthResponse;

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}
