//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! course-ranker service, including environment variable and TOML file
//! loading and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Session secret used when none is configured
pub const DEV_SESSION_SECRET: &str = "dev-secret-key-change-in-production";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub storage: StorageSettings,
    pub rating: RatingConfig,
    pub catalog: CatalogSettings,
    pub auth: AuthSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port for the HTTP API
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Which store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// SQLite database file, created along with its parent directory
    pub database_path: PathBuf,
}

/// External course catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Base URL of the golf course API
    pub base_url: String,
    /// API key; searches fail softly when unset
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of results returned per search
    pub max_results: usize,
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC key for session tokens
    pub session_secret: String,
    /// Session lifetime in seconds
    pub session_ttl_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "course-ranker".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 5000,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_path: PathBuf::from("instance/courses.db"),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.golfcourseapi.com".to_string(),
            api_key: None,
            timeout_seconds: 10,
            max_results: 10,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_ttl_seconds: 2_592_000, // 30 days
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections and keys use defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse TOML configuration")
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HOST") {
            self.service.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.service.http_port = parse_env("PORT", &port)?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds =
                parse_env("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // Storage settings
        if let Ok(path) = env::var("DATABASE_PATH") {
            self.storage.database_path = PathBuf::from(path);
            self.storage.backend = StorageBackend::Sqlite;
        }

        // Rating settings
        if let Ok(k) = env::var("K_FACTOR") {
            self.rating.k_factor = parse_env("K_FACTOR", &k)?;
        }
        if let Ok(initial) = env::var("INITIAL_RATING") {
            self.rating.initial_rating = parse_env("INITIAL_RATING", &initial)?;
        }

        // Catalog settings
        if let Ok(url) = env::var("GOLF_COURSE_API_URL") {
            self.catalog.base_url = url;
        }
        if let Ok(key) = env::var("GOLF_COURSE_API_KEY") {
            self.catalog.api_key = Some(key).filter(|key| !key.is_empty());
        }
        if let Ok(timeout) = env::var("CATALOG_TIMEOUT_SECONDS") {
            self.catalog.timeout_seconds = parse_env("CATALOG_TIMEOUT_SECONDS", &timeout)?;
        }

        // Auth settings
        if let Ok(secret) = env::var("SECRET_KEY") {
            self.auth.session_secret = secret;
        }
        if let Ok(ttl) = env::var("SESSION_TTL_SECONDS") {
            self.auth.session_ttl_seconds = parse_env("SESSION_TTL_SECONDS", &ttl)?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get session lifetime as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.session_ttl_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.database_path.as_os_str().is_empty()
    {
        return Err(anyhow!("Database path cannot be empty"));
    }

    config.rating.validate()?;

    if config.catalog.base_url.is_empty() {
        return Err(anyhow!("Catalog base URL cannot be empty"));
    }
    if config.catalog.timeout_seconds == 0 {
        return Err(anyhow!("Catalog timeout must be greater than 0"));
    }
    if config.catalog.max_results == 0 {
        return Err(anyhow!("Catalog max results must be greater than 0"));
    }

    if config.auth.session_secret.is_empty() {
        return Err(anyhow!("Session secret cannot be empty"));
    }
    if config.auth.session_ttl_seconds == 0 {
        return Err(anyhow!("Session lifetime must be greater than 0"));
    }
    if config.auth.session_secret == DEV_SESSION_SECRET {
        warn!("Using the development session secret; set SECRET_KEY in production");
    }

    Ok(())
}
