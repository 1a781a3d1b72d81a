//! Configuration management for the course-ranker service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, AuthSettings, CatalogSettings, ServiceSettings, StorageBackend,
    StorageSettings,
};
pub use rating::RatingConfig;
