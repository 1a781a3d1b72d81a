//! HTTP API
//!
//! JSON endpoints used by the ranking UI, plus the monitoring routes.
//! Everything except registration, login and monitoring requires a session.

pub mod error;
pub mod handlers;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use server::{HttpServer, HttpServerConfig};
pub use session::{session_token, Authenticated, SESSION_COOKIE};

use crate::metrics::health_routes;
use crate::service::AppState;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tracing::debug;

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route("/pair", get(handlers::pair))
        .route("/vote", post(handlers::vote))
        .route("/rankings", get(handlers::rankings))
        .route("/search_courses", get(handlers::search_courses))
        .route("/add_course", post(handlers::add_course))
        .route("/upload_csv", post(handlers::upload_csv))
        .merge(health_routes())
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}

/// Time every matched request and record it by route
async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().clone();
    let metrics = state.metrics();
    let timer = metrics.start_timer();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = timer.observe_request(&metrics, &route, status.as_u16());
    debug!(
        "{} {} -> {} in {:.2}ms",
        method,
        route,
        status,
        elapsed.as_secs_f64() * 1000.0
    );

    response
}
