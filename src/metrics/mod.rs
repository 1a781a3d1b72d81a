//! Metrics and monitoring for the course-ranker service
//!
//! Prometheus collection plus the health and metrics HTTP endpoints.

pub mod collector;
pub mod health;

pub use collector::{AuthMetrics, MetricsCollector, MetricsTimer, RankingMetrics, ServiceMetrics};
pub use health::{encode_metrics, health_routes};
