//! Health checks
//!
//! Liveness only looks at the running flag; readiness and the full check
//! also check the store and report whether catalog search is configured.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Numeric form used by the health gauge
    pub fn as_gauge(self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }

    fn combine(self, other: HealthStatus) -> HealthStatus {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Optional error message if not healthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub storage_backend: String,
    pub users: usize,
    pub courses: usize,
    pub ratings: usize,
    pub uptime_info: String,
}

impl HealthCheck {
    /// Perform a full health check of the service
    pub async fn check(app_state: &AppState) -> Result<Self> {
        let checks = vec![
            Self::check_service_running(app_state).await,
            Self::check_store(app_state),
            Self::check_catalog(app_state),
        ];

        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |acc, check| acc.combine(check.status));

        let stats = Self::gather_service_stats(app_state);
        app_state.metrics().update_health_status(status.as_gauge());

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: &AppState) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify the store answers
    pub async fn readiness_check(app_state: &AppState) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_store(app_state).status)
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = Instant::now();
        let running = app_state.is_running().await;

        ComponentCheck {
            name: "service".to_string(),
            status: if running {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            message: (!running).then(|| "Service is not running".to_string()),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_store(app_state: &AppState) -> ComponentCheck {
        let start = Instant::now();
        let store = app_state.store();

        let (status, message) = match store.stats() {
            Ok(stats) => {
                debug!(
                    "Store check ok: {} users, {} courses",
                    stats.users, stats.items
                );
                (HealthStatus::Healthy, None)
            }
            Err(e) => {
                error!("Store health check failed: {:#}", e);
                (HealthStatus::Unhealthy, Some(format!("{e:#}")))
            }
        };

        ComponentCheck {
            name: format!("store:{}", store.backend_name()),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Search without an API key still answers, just with a soft error
    fn check_catalog(app_state: &AppState) -> ComponentCheck {
        let configured = app_state.catalog().is_configured();

        ComponentCheck {
            name: "catalog".to_string(),
            status: if configured {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            message: (!configured).then(|| "Golf Course API key not configured".to_string()),
            duration_ms: 0,
        }
    }

    fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let store = app_state.store();
        let counts = store.stats().unwrap_or_default();
        let uptime = app_state.uptime().as_secs();

        ServiceStats {
            storage_backend: store.backend_name().to_string(),
            users: counts.users,
            courses: counts.items,
            ratings: counts.ratings,
            uptime_info: format!(
                "{}h {}m {}s",
                uptime / 3600,
                (uptime % 3600) / 60,
                uptime % 60
            ),
        }
    }
}
