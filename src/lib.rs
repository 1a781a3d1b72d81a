//! Course Ranker - personal golf course rankings from pairwise votes
//!
//! Each user keeps a private list of courses. The service repeatedly offers
//! two of them, records which one the user prefers, and keeps an Elo rating
//! per course from which the ranking is derived.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ranking;
pub mod rating;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankingError, Result};
pub use types::*;

// Re-export key components
pub use api::create_router;
pub use ranking::RankingEngine;
pub use service::{AppState, Service};
pub use store::{CourseStore, InMemoryStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
