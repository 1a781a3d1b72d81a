//! Request handlers for the ranking API
//!
//! Handlers stay thin and hand the caller's context to the engine or the
//! identity provider.

use crate::api::error::{ApiError, ApiJson};
use crate::api::session::{clear_session_cookie, session_cookie, Authenticated};
use crate::auth::Session;
use crate::catalog::{search_softly, SearchOutcome};
use crate::error::{RankingError, Result};
use crate::ranking::validate_upload_name;
use crate::service::AppState;
use crate::types::{ItemSource, RankingEntry};
use axum::extract::{Multipart, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: &'static str,
    pub username: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PairResponse {
    pub course1: String,
    pub course2: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub winner: String,
    pub loser: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCourseRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// Run store- or CPU-heavy work off the async executor
async fn run_blocking<T, F>(f: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("Blocking task failed: {e}"))?;
    Ok(result?)
}

fn session_response(state: &AppState, session: Session) -> Response {
    let cookie = session_cookie(&session.token, state.identity().session_ttl_seconds());
    let body = SessionResponse {
        status: "success",
        username: session.username,
        token: session.token,
        expires_at: session.expires_at,
    };
    ([(SET_COOKIE, cookie)], Json(body)).into_response()
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> std::result::Result<Response, ApiError> {
    let identity = state.identity();
    let result =
        run_blocking(move || identity.register(&credentials.username, &credentials.password))
            .await;
    state
        .metrics()
        .record_auth_event("register", result.is_ok());

    Ok(session_response(&state, result?))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> std::result::Result<Response, ApiError> {
    let identity = state.identity();
    let result =
        run_blocking(move || identity.login(&credentials.username, &credentials.password)).await;
    state.metrics().record_auth_event("login", result.is_ok());

    Ok(session_response(&state, result?))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: Authenticated,
) -> std::result::Result<Response, ApiError> {
    let result = state.identity().logout(&auth.token);
    state.metrics().record_auth_event("logout", result.is_ok());
    result?;

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        Json(json!({"status": "success"})),
    )
        .into_response())
}

pub async fn pair(
    State(state): State<AppState>,
    auth: Authenticated,
) -> std::result::Result<Json<PairResponse>, ApiError> {
    let result = state.engine().next_pair(&auth.ctx);
    state.metrics().record_pairing(result.is_ok());
    let pair = result?;

    Ok(Json(PairResponse {
        course1: pair.first.name,
        course2: pair.second.name,
    }))
}

pub async fn vote(
    State(state): State<AppState>,
    auth: Authenticated,
    request: std::result::Result<ApiJson<VoteRequest>, ApiError>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    let result = request.and_then(|ApiJson(request)| {
        state
            .engine()
            .record_vote(&auth.ctx, &request.winner, &request.loser)
            .map_err(ApiError::from)
    });

    match result {
        Ok(_) => {
            state.metrics().record_vote("success");
            Ok(Json(json!({"status": "success"})))
        }
        Err(err) => {
            state.metrics().record_vote(err.label());
            Err(err)
        }
    }
}

pub async fn rankings(
    State(state): State<AppState>,
    auth: Authenticated,
) -> std::result::Result<Json<Vec<RankingEntry>>, ApiError> {
    Ok(Json(state.engine().rankings(&auth.ctx)?))
}

pub async fn search_courses(
    State(state): State<AppState>,
    _auth: Authenticated,
    Query(params): Query<SearchParams>,
) -> Json<SearchOutcome> {
    let catalog = state.catalog();
    let outcome = search_softly(catalog.as_ref(), &params.query).await;
    state.metrics().record_catalog_search(!outcome.is_error());

    debug!(
        "Search '{}' returned {} results",
        params.query,
        outcome.results.len()
    );
    Json(outcome)
}

pub async fn add_course(
    State(state): State<AppState>,
    auth: Authenticated,
    ApiJson(request): ApiJson<AddCourseRequest>,
) -> std::result::Result<Response, ApiError> {
    match state.engine().add_item(&auth.ctx, &request.name) {
        Ok(item) => {
            state.metrics().record_items_added(ItemSource::Manual, 1);
            Ok(Json(json!({"status": "added", "course": item.name})).into_response())
        }
        Err(err) => {
            if let Some(RankingError::AlreadyExists { name }) = RankingError::find(&err) {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    Json(json!({"status": "already_exists", "course": name})),
                )
                    .into_response());
            }
            Err(err.into())
        }
    }
}

pub async fn upload_csv(
    State(state): State<AppState>,
    auth: Authenticated,
    mut multipart: Multipart,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        RankingError::InvalidUpload {
            reason: format!("Malformed upload: {e}"),
        }
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| RankingError::InvalidUpload {
            reason: format!("Malformed upload: {e}"),
        })?;
        upload = Some((file_name, bytes));
        break;
    }

    validate_upload_name(upload.as_ref().map(|(name, _)| name.as_str()))?;
    let Some((file_name, bytes)) = upload else {
        return Err(RankingError::InvalidUpload {
            reason: "No file provided".to_string(),
        }
        .into());
    };

    info!(
        "User {} uploading '{}' ({} bytes)",
        auth.ctx.user_id,
        file_name,
        bytes.len()
    );

    let engine = state.engine().clone();
    let ctx = auth.ctx;
    let summary = run_blocking(move || engine.import_csv(&ctx, Cursor::new(bytes))).await?;
    state
        .metrics()
        .record_items_added(ItemSource::Csv, summary.added);

    Ok(Json(json!({
        "status": "success",
        "added": summary.added,
        "skipped_existing": summary.skipped_existing,
        "skipped_blank": summary.skipped_blank
    })))
}
