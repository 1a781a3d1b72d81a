//! Metrics collection using Prometheus
//!
//! Counters and histograms for the course-ranker HTTP service. Every metric
//! is registered on the collector's own registry so tests can build as many
//! collectors as they like.

use crate::store::StoreStats;
use crate::types::ItemSource;
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the ranking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Ranking activity
    ranking_metrics: RankingMetrics,

    /// Login, registration and session checks
    auth_metrics: AuthMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Stored row counts by table
    pub stored_rows: IntGaugeVec,

    /// Request handling time by route and status class
    pub request_duration_seconds: HistogramVec,
}

/// Ranking activity metrics
#[derive(Clone)]
pub struct RankingMetrics {
    /// Pairing requests by outcome
    pub pairings_total: IntCounterVec,

    /// Votes by outcome
    pub votes_total: IntCounterVec,

    /// Courses added by source
    pub items_added_total: IntCounterVec,

    /// Catalog searches by outcome
    pub catalog_searches_total: IntCounterVec,
}

/// Authentication metrics
#[derive(Clone)]
pub struct AuthMetrics {
    /// Auth events by kind and outcome
    pub auth_events_total: IntCounterVec,
}

fn outcome_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let ranking_metrics = RankingMetrics::new(&registry)?;
        let auth_metrics = AuthMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            ranking_metrics,
            auth_metrics,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn ranking(&self) -> &RankingMetrics {
        &self.ranking_metrics
    }

    pub fn auth(&self) -> &AuthMetrics {
        &self.auth_metrics
    }

    /// Record a pairing request
    pub fn record_pairing(&self, success: bool) {
        self.ranking_metrics
            .pairings_total
            .with_label_values(&[outcome_label(success)])
            .inc();
    }

    /// Record a vote; `outcome` is "success" or the rejecting error kind
    pub fn record_vote(&self, outcome: &str) {
        self.ranking_metrics
            .votes_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record newly created courses
    pub fn record_items_added(&self, source: ItemSource, count: usize) {
        if count == 0 {
            return;
        }
        self.ranking_metrics
            .items_added_total
            .with_label_values(&[&source.to_string()])
            .inc_by(count as u64);
    }

    /// Record a catalog search
    pub fn record_catalog_search(&self, success: bool) {
        self.ranking_metrics
            .catalog_searches_total
            .with_label_values(&[outcome_label(success)])
            .inc();
    }

    /// Record a register/login/logout attempt
    pub fn record_auth_event(&self, event: &str, success: bool) {
        self.auth_metrics
            .auth_events_total
            .with_label_values(&[event, outcome_label(success)])
            .inc();
    }

    /// Record how long a request took
    pub fn record_request(&self, route: &str, status: u16, duration: Duration) {
        let class = match status {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            500..=599 => "5xx",
            _ => "other",
        };
        self.service_metrics
            .request_duration_seconds
            .with_label_values(&[route, class])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update uptime and stored row gauges
    pub fn update_store_stats(&self, stats: &StoreStats, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);

        let rows = &self.service_metrics.stored_rows;
        rows.with_label_values(&["users"]).set(stats.users as i64);
        rows.with_label_values(&["items"]).set(stats.items as i64);
        rows.with_label_values(&["ratings"]).set(stats.ratings as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and record the request it measured
    pub fn observe_request(
        self,
        collector: &MetricsCollector,
        route: &str,
        status: u16,
    ) -> Duration {
        let elapsed = self.elapsed();
        collector.record_request(route, status, elapsed);
        elapsed
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("course_ranker_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "course_ranker_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let stored_rows = IntGaugeVec::new(
            Opts::new("course_ranker_stored_rows", "Stored rows by table"),
            &["table"],
        )?;
        registry.register(Box::new(stored_rows.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "course_ranker_request_duration_seconds",
                "HTTP request handling time",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
            &["route", "status"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            stored_rows,
            request_duration_seconds,
        })
    }
}

impl RankingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let pairings_total = IntCounterVec::new(
            Opts::new("course_ranker_pairings_total", "Pairing requests served"),
            &["outcome"],
        )?;
        registry.register(Box::new(pairings_total.clone()))?;

        let votes_total = IntCounterVec::new(
            Opts::new("course_ranker_votes_total", "Votes received"),
            &["outcome"],
        )?;
        registry.register(Box::new(votes_total.clone()))?;

        let items_added_total = IntCounterVec::new(
            Opts::new("course_ranker_items_added_total", "Courses added"),
            &["source"],
        )?;
        registry.register(Box::new(items_added_total.clone()))?;

        let catalog_searches_total = IntCounterVec::new(
            Opts::new(
                "course_ranker_catalog_searches_total",
                "Course catalog searches",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(catalog_searches_total.clone()))?;

        Ok(Self {
            pairings_total,
            votes_total,
            items_added_total,
            catalog_searches_total,
        })
    }
}

impl AuthMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let auth_events_total = IntCounterVec::new(
            Opts::new("course_ranker_auth_events_total", "Authentication events"),
            &["event", "outcome"],
        )?;
        registry.register(Box::new(auth_events_total.clone()))?;

        Ok(Self { auth_events_total })
    }
}
