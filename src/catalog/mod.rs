//! External course catalog search
//!
//! The catalog is best-effort: failures are logged and turned into an empty
//! result with a user-facing message instead of an error.

pub mod golf_api;

pub use golf_api::{parse_search_response, GolfCourseApiClient};

use crate::error::{RankingError, Result};
use crate::types::CatalogEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Trait for free-text course lookups
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Search for courses matching `query`
    async fn search(&self, query: &str) -> Result<Vec<CatalogEntry>>;

    /// Whether searches can succeed at all; reported by health checks
    fn is_configured(&self) -> bool {
        true
    }
}

/// Search results plus an optional soft error for the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<CatalogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Run a search, recovering every failure into a soft error
pub async fn search_softly(catalog: &dyn CatalogSearch, query: &str) -> SearchOutcome {
    let query = query.trim();
    if query.is_empty() {
        return SearchOutcome::failed("Search query is required");
    }

    match catalog.search(query).await {
        Ok(results) => SearchOutcome {
            results,
            error: None,
        },
        Err(err) => {
            warn!("Course search for '{}' failed: {:#}", query, err);
            match RankingError::find(&err) {
                Some(RankingError::UpstreamSearchFailure { reason }) => {
                    SearchOutcome::failed(reason.clone())
                }
                _ => SearchOutcome::failed("Failed to search golf courses"),
            }
        }
    }
}
