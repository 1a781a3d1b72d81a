//! Test fixtures and stub collaborators for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use course_ranker::catalog::CatalogSearch;
use course_ranker::config::AppConfig;
use course_ranker::error::{RankingError, Result};
use course_ranker::rating::{EloRatingCalculator, PairingSelector};
use course_ranker::types::{CatalogEntry, Item, ItemPair, RequestContext};
use course_ranker::{create_router, AppState, CourseStore, RankingEngine, SqliteStore};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Catalog returning canned results, or failing when built with `failing`
#[derive(Debug, Default)]
pub struct StubCatalog {
    results: Vec<CatalogEntry>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubCatalog {
    pub fn with_results(results: Vec<CatalogEntry>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSearch for StubCatalog {
    async fn search(&self, query: &str) -> Result<Vec<CatalogEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RankingError::UpstreamSearchFailure {
                reason: "Failed to search golf courses".to_string(),
            }
            .into());
        }

        Ok(self
            .results
            .iter()
            .filter(|entry| entry.name.contains(query))
            .cloned()
            .collect())
    }
}

/// Always offers the two oldest courses, so HTTP flows are predictable
#[derive(Debug, Default)]
pub struct OldestPairSelector;

impl PairingSelector for OldestPairSelector {
    fn select_pair(&self, items: &[Item]) -> Result<ItemPair> {
        match items {
            [first, second, ..] => Ok(ItemPair {
                first: first.clone(),
                second: second.clone(),
            }),
            _ => Err(RankingError::InsufficientItems { found: items.len() }.into()),
        }
    }
}

pub fn sample_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            name: "Pebble Beach Golf Links".to_string(),
            address: "Pebble Beach, CA, United States".to_string(),
        },
        CatalogEntry {
            name: "St Andrews Old Course".to_string(),
            address: "St Andrews, Scotland".to_string(),
        },
    ]
}

/// Engine over a fresh in-memory SQLite database with the default Elo setup
pub fn create_test_engine() -> (RankingEngine, Arc<dyn CourseStore>) {
    let store: Arc<dyn CourseStore> =
        Arc::new(SqliteStore::open_in_memory().expect("in-memory sqlite"));
    let engine = RankingEngine::new(
        store.clone(),
        Arc::new(EloRatingCalculator::default()),
        Arc::new(OldestPairSelector),
    );
    (engine, store)
}

/// Register a user directly in the store and return its context
pub fn create_user(store: &Arc<dyn CourseStore>, username: &str) -> RequestContext {
    let user = store
        .create_user(username, "not-a-real-hash")
        .expect("create user");
    RequestContext::new(user.id)
}

/// Complete application over in-memory SQLite and the given catalog
pub fn create_test_app(catalog: Arc<dyn CatalogSearch>) -> (Router, AppState) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory sqlite"));
    let state = AppState::with_components(
        AppConfig::default(),
        store,
        catalog,
        Arc::new(OldestPairSelector),
    )
    .expect("app state");
    (create_router(state.clone()), state)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart request carrying one `file` field
pub fn upload_request(token: &str, file_name: &str, contents: &str) -> Request<Body> {
    let boundary = "course-ranker-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n"
    );

    Request::builder()
        .method("POST")
        .uri("/upload_csv")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router call")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register through the API and return the session token
pub async fn register(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/register",
            None,
            serde_json::json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert!(response.status().is_success(), "register {username}");

    body_json(response).await["token"]
        .as_str()
        .expect("token in register response")
        .to_string()
}
