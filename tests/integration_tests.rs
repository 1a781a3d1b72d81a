//! Integration tests for the course-ranker service
//!
//! These tests drive the ranking engine over a real SQLite store and the
//! full HTTP router, including:
//! - Elo updates and rating conservation
//! - CSV and single-course ingestion
//! - Per-user isolation
//! - Session handling and the soft-failing course search

mod fixtures;

use axum::http::StatusCode;
use course_ranker::error::RankingError;
use course_ranker::types::{RankingEntry, RequestContext};
use serde_json::json;
use std::sync::Arc;

use fixtures::{
    body_json, create_test_app, create_test_engine, create_user, get_request, json_request,
    register, sample_catalog, send, upload_request, StubCatalog,
};

fn kind(err: anyhow::Error) -> RankingError {
    RankingError::find(&err).cloned().expect("ranking error")
}

fn ratings_of(store: &Arc<dyn course_ranker::CourseStore>, ctx: &RequestContext) -> Vec<f64> {
    store
        .rated_items_for_user(ctx.user_id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.rating.rating)
        .collect()
}

#[test]
fn test_first_vote_between_new_courses() {
    let (engine, store) = create_test_engine();
    let ctx = create_user(&store, "alice");

    engine.add_item(&ctx, "Pebble Beach").unwrap();
    engine.add_item(&ctx, "Augusta").unwrap();

    let outcome = engine.record_vote(&ctx, "Pebble Beach", "Augusta").unwrap();
    assert_eq!(outcome.winner.new_rating, 1216.0);
    assert_eq!(outcome.loser.new_rating, 1184.0);

    assert_eq!(
        engine.rankings(&ctx).unwrap(),
        vec![
            RankingEntry {
                name: "Pebble Beach".to_string(),
                rating: 1216,
            },
            RankingEntry {
                name: "Augusta".to_string(),
                rating: 1184,
            },
        ]
    );
}

#[test]
fn test_csv_import_skips_blanks_and_duplicates() {
    let (engine, store) = create_test_engine();
    let ctx = create_user(&store, "alice");

    let csv = "Pebble Beach\n\n  \nPebble Beach\nAugusta\n";
    let summary = engine.import_csv(&ctx, csv.as_bytes()).unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(summary.skipped_existing, 1);
    assert_eq!(store.list_for_user(ctx.user_id).unwrap().len(), 2);
    assert_eq!(store.stats().unwrap().ratings, 2);
}

#[test]
fn test_duplicate_add_creates_no_second_rating() {
    let (engine, store) = create_test_engine();
    let ctx = create_user(&store, "alice");

    engine.add_item(&ctx, "Augusta").unwrap();
    let err = engine.add_item(&ctx, "  Augusta ").unwrap_err();

    assert_eq!(
        kind(err),
        RankingError::AlreadyExists {
            name: "Augusta".to_string()
        }
    );
    assert_eq!(store.stats().unwrap().ratings, 1);
}

#[test]
fn test_vote_for_unknown_course_changes_nothing() {
    let (engine, store) = create_test_engine();
    let ctx = create_user(&store, "alice");
    engine.add_item(&ctx, "Pebble Beach").unwrap();
    engine.add_item(&ctx, "Augusta").unwrap();
    engine.record_vote(&ctx, "Augusta", "Pebble Beach").unwrap();
    let before = ratings_of(&store, &ctx);

    let err = engine
        .record_vote(&ctx, "Pebble Beach", "Nowhere Links")
        .unwrap_err();

    assert_eq!(
        kind(err),
        RankingError::ItemNotFound {
            name: "Nowhere Links".to_string()
        }
    );
    assert_eq!(ratings_of(&store, &ctx), before);
}

#[test]
fn test_users_never_see_each_other() {
    let (engine, store) = create_test_engine();
    let alice = create_user(&store, "alice");
    let bob = create_user(&store, "bob");

    engine.add_item(&alice, "Pebble Beach").unwrap();
    engine.add_item(&alice, "Augusta").unwrap();

    // Same name is a separate course for another user
    engine.add_item(&bob, "Augusta").unwrap();

    assert_eq!(
        kind(engine.next_pair(&bob).unwrap_err()),
        RankingError::InsufficientItems { found: 1 }
    );
    assert!(matches!(
        kind(engine.record_vote(&bob, "Pebble Beach", "Augusta").unwrap_err()),
        RankingError::ItemNotFound { .. }
    ));

    engine.record_vote(&alice, "Augusta", "Pebble Beach").unwrap();
    assert_eq!(engine.rankings(&bob).unwrap()[0].rating, 1200);
    assert_eq!(engine.rankings(&alice).unwrap()[0].rating, 1216);
}

#[test]
fn test_rankings_are_stable_without_votes() {
    let (engine, store) = create_test_engine();
    let ctx = create_user(&store, "alice");
    for name in ["Cypress Point", "Pine Valley", "Shinnecock Hills", "Merion"] {
        engine.add_item(&ctx, name).unwrap();
    }
    engine.record_vote(&ctx, "Merion", "Pine Valley").unwrap();

    let first = engine.rankings(&ctx).unwrap();
    let second = engine.rankings(&ctx).unwrap();
    assert_eq!(first, second);

    // Ties keep insertion order
    let names: Vec<&str> = first.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Merion", "Cypress Point", "Shinnecock Hills", "Pine Valley"]
    );
}

#[test]
fn test_votes_from_many_threads() {
    let (engine, store) = create_test_engine();
    let ctx = create_user(&store, "alice");

    // Each thread owns one pair, so every pair must still sum to 2400
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = engine.clone();
            let first = format!("Course {i}a");
            let second = format!("Course {i}b");
            engine.add_item(&ctx, &first).unwrap();
            engine.add_item(&ctx, &second).unwrap();

            std::thread::spawn(move || {
                for round in 0..25 {
                    let (winner, loser) = if round % 3 == 0 {
                        (&second, &first)
                    } else {
                        (&first, &second)
                    };
                    engine.record_vote(&ctx, winner, loser).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ratings = ratings_of(&store, &ctx);
    assert_eq!(ratings.len(), 8);
    for pair in ratings.chunks(2) {
        assert!((pair[0] + pair[1] - 2400.0).abs() < 1e-6, "pair {pair:?}");
    }
}

#[tokio::test]
async fn test_full_http_ranking_flow() {
    let (app, state) = create_test_app(Arc::new(StubCatalog::with_results(sample_catalog())));
    let token = register(&app, "alice", "hunter2").await;

    // Add two courses, one of them twice
    for name in ["Pebble Beach", "Augusta"] {
        let response = send(
            &app,
            json_request("POST", "/add_course", Some(&token), json!({"name": name})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"status": "added", "course": name})
        );
    }
    let response = send(
        &app,
        json_request("POST", "/add_course", Some(&token), json!({"name": "Augusta"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"status": "already_exists", "course": "Augusta"})
    );

    // Pair, vote, rank
    let response = send(&app, get_request("/pair", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"course1": "Pebble Beach", "course2": "Augusta"})
    );

    let response = send(
        &app,
        json_request(
            "POST",
            "/vote",
            Some(&token),
            json!({"winner": "Augusta", "loser": "Pebble Beach"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "success"}));

    let response = send(&app, get_request("/rankings", Some(&token))).await;
    assert_eq!(
        body_json(response).await,
        json!([
            {"name": "Augusta", "rating": 1216},
            {"name": "Pebble Beach", "rating": 1184}
        ])
    );

    // Bulk upload
    let response = send(
        &app,
        upload_request(&token, "courses.csv", "Merion\nPebble Beach\n\nPine Valley"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["added"], 2);

    let metrics = state.metrics();
    let votes = &metrics.ranking().votes_total;
    assert_eq!(votes.with_label_values(&["success"]).get(), 1);
}

#[tokio::test]
async fn test_vote_errors_over_http() {
    let (app, state) = create_test_app(Arc::new(StubCatalog::default()));
    let token = register(&app, "alice", "pw").await;
    send(
        &app,
        json_request("POST", "/add_course", Some(&token), json!({"name": "Augusta"})),
    )
    .await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/vote",
            Some(&token),
            json!({"winner": "Augusta", "loser": "Nowhere"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        json_request(
            "POST",
            "/vote",
            Some(&token),
            json!({"winner": "Augusta", "loser": "Augusta"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let metrics = state.metrics();
    let votes = &metrics.ranking().votes_total;
    assert_eq!(votes.with_label_values(&["item_not_found"]).get(), 1);
    assert_eq!(votes.with_label_values(&["self_comparison"]).get(), 1);
}

#[tokio::test]
async fn test_upload_validation() {
    let (app, _state) = create_test_app(Arc::new(StubCatalog::default()));
    let token = register(&app, "alice", "pw").await;

    let response = send(&app, upload_request(&token, "courses.txt", "Merion")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "File must be a CSV");

    let response = send(&app, upload_request(&token, "", "Merion")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file selected");
}

#[tokio::test]
async fn test_search_results_and_soft_failures() {
    let catalog = Arc::new(StubCatalog::with_results(sample_catalog()));
    let (app, _state) = create_test_app(catalog.clone());
    let token = register(&app, "alice", "pw").await;

    let response = send(
        &app,
        get_request("/search_courses?query=Pebble", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert!(body.get("error").is_none());
    assert_eq!(catalog.calls(), 1);

    let (app, state) = create_test_app(Arc::new(StubCatalog::failing()));
    let token = register(&app, "bob", "pw").await;
    let response = send(
        &app,
        get_request("/search_courses?query=Pebble", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"results": [], "error": "Failed to search golf courses"})
    );
    assert_eq!(
        state
            .metrics()
            .ranking()
            .catalog_searches_total
            .with_label_values(&["failure"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_login_logout_cycle() {
    let (app, _state) = create_test_app(Arc::new(StubCatalog::default()));
    register(&app, "alice", "correct horse").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/login",
            None,
            json!({"username": "alice", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "Invalid username or password"
    );

    let response = send(
        &app,
        json_request(
            "POST",
            "/register",
            None,
            json!({"username": "alice", "password": "other"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Username already exists");

    let response = send(
        &app,
        json_request(
            "POST",
            "/login",
            None,
            json!({"username": "alice", "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(&app, get_request("/logout", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get_request("/rankings", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
