//! GolfCourseAPI client
//!
//! `GET {base_url}/v1/search?search_query=<q>` with `Authorization: Key <key>`.
//! Response shape: `{"courses": [{"course_name", "club_name", "location": {..}}]}`.

use crate::catalog::CatalogSearch;
use crate::config::CatalogSettings;
use crate::error::{RankingError, Result};
use crate::types::CatalogEntry;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const NO_LOCATION: &str = "Location not available";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    courses: Vec<ApiCourse>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiCourse {
    course_name: Option<String>,
    club_name: Option<String>,
    name: Option<String>,
    location: Option<ApiLocation>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiLocation {
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ApiCourse {
    fn display_name(&self) -> Option<&str> {
        non_empty(&self.course_name)
            .or_else(|| non_empty(&self.club_name))
            .or_else(|| non_empty(&self.name))
    }

    fn address(&self) -> String {
        let parts: Vec<&str> = self
            .location
            .iter()
            .flat_map(|loc| [&loc.city, &loc.state, &loc.country])
            .filter_map(non_empty)
            .collect();

        if parts.is_empty() {
            NO_LOCATION.to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Turn a raw search response into catalog entries
///
/// Only the first `max_results` courses are considered; nameless ones are
/// dropped after that cut.
pub fn parse_search_response(body: &serde_json::Value, max_results: usize) -> Vec<CatalogEntry> {
    let response: SearchResponse = serde_json::from_value(body.clone()).unwrap_or_default();

    response
        .courses
        .iter()
        .take(max_results)
        .filter_map(|course| {
            course.display_name().map(|name| CatalogEntry {
                name: name.to_string(),
                address: course.address(),
            })
        })
        .collect()
}

/// HTTP client for the golf course catalog
#[derive(Debug, Clone)]
pub struct GolfCourseApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
}

impl GolfCourseApiClient {
    /// Create a client with the configured timeout
    pub fn new(settings: &CatalogSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|err| RankingError::ConfigurationError {
                message: format!("Failed to build catalog HTTP client: {err}"),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            max_results: settings.max_results,
        })
    }
}

fn upstream_failure(reason: impl Into<String>) -> anyhow::Error {
    RankingError::UpstreamSearchFailure {
        reason: reason.into(),
    }
    .into()
}

#[async_trait]
impl CatalogSearch for GolfCourseApiClient {
    async fn search(&self, query: &str) -> Result<Vec<CatalogEntry>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| upstream_failure("Golf Course API key not configured"))?;

        let url = format!("{}/v1/search", self.base_url);
        debug!("Searching course catalog for '{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[("search_query", query)])
            .header("Authorization", format!("Key {api_key}"))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|err| {
                warn!("Golf Course API request failed: {}", err);
                upstream_failure("Failed to search golf courses")
            })?;

        let response = response.error_for_status().map_err(|err| {
            warn!("Golf Course API returned an error: {}", err);
            upstream_failure("Failed to search golf courses")
        })?;

        let body: serde_json::Value = response.json().await.map_err(|err| {
            warn!("Golf Course API returned an unreadable body: {}", err);
            upstream_failure("Failed to search golf courses")
        })?;

        Ok(parse_search_response(&body, self.max_results))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
