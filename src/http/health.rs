use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use super::AppState;
use crate::cache::CacheStats;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since startup
    pub uptime: f64,
    pub environment: String,
    pub version: &'static str,
    pub cache: CacheStats,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.environment.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        cache: state.service.cache_stats().await,
    })
}
