//! Health check endpoints and Prometheus metrics
//!
//! These routes are merged into the main API router and need no session.

use crate::metrics::collector::MetricsCollector;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use tracing::{debug, error};

/// Monitoring routes: `/health`, `/ready`, `/alive`, `/metrics`, `/stats`
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/alive", get(alive_handler))
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");

    let status = HealthCheck::liveness_check(&state)
        .await
        .unwrap_or(HealthStatus::Unhealthy);
    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": state.config().service.name,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(&state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<AppState>) -> impl IntoResponse {
    match HealthCheck::liveness_check(&state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match encode_metrics(&state.metrics()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

/// Detailed service statistics (for debugging/human consumption)
async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    match HealthCheck::check(&state).await {
        Ok(health) => {
            let code = match health.status {
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::OK,
            };
            (
                code,
                Json(json!({
                    "service": {
                        "name": health.service,
                        "version": health.version,
                        "status": health.status,
                        "uptime": health.stats.uptime_info
                    },
                    "store": {
                        "backend": health.stats.storage_backend,
                        "users": health.stats.users,
                        "courses": health.stats.courses,
                        "ratings": health.stats.ratings
                    },
                    "rating": state.engine().calculator_config(),
                    "components": health.checks,
                    "timestamp": health.timestamp
                })),
            )
        }
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}

/// Render every registered metric in the Prometheus text format
pub fn encode_metrics(collector: &MetricsCollector) -> Result<String> {
    let metric_families = collector.registry().gather();
    let encoder = TextEncoder::new();

    encoder
        .encode_to_string(&metric_families)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
}
