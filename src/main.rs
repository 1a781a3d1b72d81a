//! Main entry point for the Course Ranker service
//!
//! Loads configuration, initializes logging and runs the HTTP service until
//! a shutdown signal arrives.

use anyhow::Result;
use clap::Parser;
use course_ranker::config::{validate_config, AppConfig, StorageBackend};
use course_ranker::service::{AppState, HealthCheck, HealthStatus, Service};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Course Ranker - personal golf course rankings from pairwise votes
#[derive(Parser)]
#[command(
    name = "course-ranker",
    version,
    about = "Rank your golf courses by voting on pairs",
    long_about = "Course Ranker keeps a private list of golf courses per user, offers two at a \
                 time for comparison and maintains an Elo rating per course from the votes."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(short = 'p', long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Database path override
    #[arg(long, value_name = "FILE", help = "Override SQLite database path")]
    database_path: Option<PathBuf>,

    /// Use the in-memory store
    #[arg(long, help = "Keep all data in memory (lost on shutdown)")]
    in_memory: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = AppState::new(config).await?;
    app_state.set_running(true).await;

    match HealthCheck::check(&app_state).await {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Store: {}", health.stats.storage_backend);
            println!("  Users: {}", health.stats.users);
            println!("  Courses: {}", health.stats.courses);
            println!("  Ratings: {}", health.stats.ratings);
            for check in &health.checks {
                if let Some(message) = &check.message {
                    println!("  {}: {}", check.name, message);
                }
            }

            if health.status == HealthStatus::Unhealthy {
                std::process::exit(1);
            }
            std::process::exit(0);
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("⛳ Course Ranker");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Listening on: {}:{}",
        config.service.host, config.service.http_port
    );
    match config.storage.backend {
        StorageBackend::Sqlite => info!(
            "   Store: sqlite ({})",
            config.storage.database_path.display()
        ),
        StorageBackend::Memory => info!("   Store: in-memory"),
    }
    info!(
        "   Elo: initial {} / K {}",
        config.rating.initial_rating, config.rating.k_factor
    );
    info!(
        "   Course search: {}",
        if config.catalog.api_key.is_some() {
            "enabled"
        } else {
            "disabled (no API key)"
        }
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(database_path) = &args.database_path {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.database_path = database_path.clone();
    }

    if args.in_memory {
        config.storage.backend = StorageBackend::Memory;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(config_path) = &args.config {
        info!("Loaded configuration from: {}", config_path.display());
    }

    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.dry_run {
        if let Err(e) = validate_config(&config) {
            error!("Configuration invalid: {:#}", e);
            std::process::exit(1);
        }
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let mut service = match Service::new(config.clone()).await {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = service.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    info!("✅ Course Ranker is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");

    match tokio::time::timeout(config.shutdown_timeout(), service.shutdown()).await {
        Ok(Ok(())) => {
            info!("✅ Graceful shutdown completed successfully");
        }
        Ok(Err(e)) => {
            error!("Shutdown failed: {}", e);
        }
        Err(_) => {
            warn!("⚠️  Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("🛑 Course Ranker stopped");
    Ok(())
}
