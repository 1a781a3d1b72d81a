//! Mapping domain errors onto HTTP responses

use crate::error::RankingError;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// JSON body of every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

/// Error returned from handlers; wraps any `anyhow` error
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl ApiError {
    pub fn kind(&self) -> Option<&RankingError> {
        RankingError::find(&self.0)
    }

    /// Status code and client-facing message
    pub fn status_and_message(&self) -> (StatusCode, String) {
        let Some(kind) = self.kind() else {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        };

        match kind {
            RankingError::InsufficientItems { .. } => (
                StatusCode::BAD_REQUEST,
                "Need at least 2 courses to compare".to_string(),
            ),
            RankingError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            RankingError::UsernameTaken { .. } => (
                StatusCode::BAD_REQUEST,
                "Username already exists".to_string(),
            ),
            RankingError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string())
            }
            RankingError::InvalidRequest { reason } | RankingError::InvalidUpload { reason } => {
                (StatusCode::BAD_REQUEST, reason.clone())
            }
            RankingError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, kind.to_string()),
            RankingError::CrossUserReference { .. } => {
                (StatusCode::FORBIDDEN, "Course not available".to_string())
            }
            RankingError::AlreadyExists { .. }
            | RankingError::SelfComparison { .. }
            | RankingError::InvalidItemName { .. }
            | RankingError::MissingCredentials => (StatusCode::BAD_REQUEST, kind.to_string()),
            RankingError::UpstreamSearchFailure { reason } => {
                (StatusCode::BAD_GATEWAY, reason.clone())
            }
            RankingError::Storage { .. } | RankingError::ConfigurationError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }

    /// Short label for metrics
    pub fn label(&self) -> &'static str {
        match self.kind() {
            Some(RankingError::InsufficientItems { .. }) => "insufficient_items",
            Some(RankingError::ItemNotFound { .. }) => "item_not_found",
            Some(RankingError::AlreadyExists { .. }) => "already_exists",
            Some(RankingError::CrossUserReference { .. }) => "cross_user_reference",
            Some(RankingError::SelfComparison { .. }) => "self_comparison",
            Some(RankingError::InvalidItemName { .. }) => "invalid_name",
            Some(RankingError::Unauthenticated) => "unauthenticated",
            Some(RankingError::InvalidCredentials) => "invalid_credentials",
            Some(RankingError::MissingCredentials) => "missing_credentials",
            Some(RankingError::UsernameTaken { .. }) => "username_taken",
            Some(RankingError::InvalidRequest { .. }) => "invalid_request",
            Some(RankingError::InvalidUpload { .. }) => "invalid_upload",
            Some(RankingError::UpstreamSearchFailure { .. }) => "upstream_failure",
            Some(RankingError::Storage { .. }) | Some(RankingError::ConfigurationError { .. }) => {
                "internal"
            }
            None => "internal",
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        }

        (
            status,
            Json(ErrorBody {
                status: "error",
                message,
            }),
        )
            .into_response()
    }
}

/// JSON body extractor whose rejections use the shared error body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(RankingError::InvalidRequest {
                    reason: rejection.body_text(),
                }
                .into())
            }
        }
    }
}
