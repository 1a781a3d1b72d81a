//! Application state and service lifecycle
//!
//! `AppState` holds the components every request handler needs and is cheap
//! to clone. `Service` owns the HTTP server and background tasks around it.

use crate::api::server::{HttpServer, HttpServerConfig};
use crate::auth::{IdentityProvider, SessionSigner};
use crate::catalog::{CatalogSearch, GolfCourseApiClient};
use crate::config::{validate_config, AppConfig, StorageBackend};
use crate::metrics::MetricsCollector;
use crate::ranking::RankingEngine;
use crate::rating::{EloRatingCalculator, PairingSelector, UniformPairingSelector};
use crate::store::{CourseStore, InMemoryStore, SqliteStore};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Server { message: String },
}

/// Components shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    store: Arc<dyn CourseStore>,
    engine: RankingEngine,
    identity: Arc<IdentityProvider>,
    catalog: Arc<dyn CatalogSearch>,
    metrics: Arc<MetricsCollector>,
    started_at: Instant,
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Build every component from configuration
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} service", config.service.name);

        validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: format!("{e:#}"),
        })?;

        let store = Self::initialize_store(&config)?;
        let catalog: Arc<dyn CatalogSearch> = Arc::new(
            GolfCourseApiClient::new(&config.catalog).map_err(|e| {
                ServiceError::Initialization {
                    message: format!("Failed to create catalog client: {e:#}"),
                }
            })?,
        );

        Self::with_components(
            config,
            store,
            catalog,
            Arc::new(UniformPairingSelector::new()),
        )
    }

    /// Assemble state around an existing store, catalog and pairing selector
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn CourseStore>,
        catalog: Arc<dyn CatalogSearch>,
        selector: Arc<dyn PairingSelector>,
    ) -> Result<Self, ServiceError> {
        let calculator =
            EloRatingCalculator::new(&config.rating).map_err(|e| ServiceError::Configuration {
                message: format!("{e:#}"),
            })?;

        let metrics = MetricsCollector::new().map_err(|e| ServiceError::Initialization {
            message: format!("Failed to create metrics collector: {e}"),
        })?;

        let engine = RankingEngine::new(store.clone(), Arc::new(calculator), selector);
        let signer = SessionSigner::new(&config.auth.session_secret, config.session_ttl());
        let identity = IdentityProvider::new(store.clone(), signer);

        info!(
            "Components ready: store={}, catalog configured={}, rating={}",
            store.backend_name(),
            catalog.is_configured(),
            engine.calculator_config()
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            engine,
            identity: Arc::new(identity),
            catalog,
            metrics: Arc::new(metrics),
            started_at: Instant::now(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    fn initialize_store(config: &AppConfig) -> Result<Arc<dyn CourseStore>, ServiceError> {
        match config.storage.backend {
            StorageBackend::Memory => {
                warn!("Using in-memory store; data is lost on shutdown");
                Ok(Arc::new(InMemoryStore::new()))
            }
            StorageBackend::Sqlite => {
                let store = SqliteStore::open(&config.storage.database_path).map_err(|e| {
                    ServiceError::Storage {
                        message: format!(
                            "Failed to open {}: {e:#}",
                            config.storage.database_path.display()
                        ),
                    }
                })?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn CourseStore> {
        self.store.clone()
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    pub fn identity(&self) -> Arc<IdentityProvider> {
        self.identity.clone()
    }

    pub fn catalog(&self) -> Arc<dyn CatalogSearch> {
        self.catalog.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Time since the state was built
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Flip the running flag; health probes report unhealthy while false
    pub async fn set_running(&self, running: bool) {
        *self.is_running.write().await = running;
    }
}

/// The running service: HTTP server plus background maintenance
pub struct Service {
    state: AppState,
    server: Arc<HttpServer>,
    server_task: Option<JoinHandle<()>>,
    background_tasks: Vec<JoinHandle<()>>,
}

impl Service {
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let state = AppState::new(config).await?;
        Ok(Self::from_state(state))
    }

    pub fn from_state(state: AppState) -> Self {
        let server_config = HttpServerConfig {
            host: state.config().service.host.clone(),
            port: state.config().service.http_port,
        };
        let server = Arc::new(HttpServer::new(server_config, state.clone()));

        Self {
            state,
            server,
            server_task: None,
            background_tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind the HTTP server and start background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting {} service", self.state.config().service.name);

        let listener = self
            .server
            .bind()
            .await
            .map_err(|e| ServiceError::Server {
                message: format!("{e:#}"),
            })?;

        self.state.set_running(true).await;

        let server = self.server.clone();
        self.server_task = Some(tokio::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!("HTTP server failed: {:#}", e);
            }
        }));

        self.start_background_tasks();

        info!("✅ Service started successfully");
        Ok(())
    }

    /// Stop accepting requests and wind down background tasks
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown");

        self.state.set_running(false).await;
        self.server.stop();

        if let Some(task) = self.server_task.take() {
            task.await.map_err(|e| ServiceError::Server {
                message: format!("HTTP server task panicked: {e}"),
            })?;
            info!("✅ HTTP server stopped");
        }

        self.stop_background_tasks();

        info!("✅ Graceful shutdown completed");
        Ok(())
    }

    fn start_background_tasks(&mut self) {
        info!("Starting store metrics task (30s interval)...");
        let state = self.state.clone();

        let stats_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));

            while state.is_running().await {
                interval.tick().await;

                match state.store().stats() {
                    Ok(stats) => {
                        debug!(
                            "Updating store metrics - users: {}, courses: {}, ratings: {}",
                            stats.users, stats.items, stats.ratings
                        );
                        state.metrics().update_store_stats(&stats, state.uptime());
                        state.metrics().update_health_status(2);
                    }
                    Err(e) => {
                        warn!("Failed to read store stats: {:#}", e);
                        state.metrics().update_health_status(0);
                    }
                }
            }

            info!("Store metrics task stopped");
        });

        self.background_tasks.push(stats_task);
    }

    fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        for task in self.background_tasks.drain(..) {
            task.abort();
        }
        debug!("Aborted {} background tasks", task_count);
    }
}
