//! Service wiring: shared application state, lifecycle and health checks

pub mod app;
pub mod health;

pub use app::{AppState, Service, ServiceError};
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
