//! Common types used throughout the ranking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::elo::EloRating;

/// Stable identifier handed out by the identity provider
pub type UserId = i64;

/// Store-assigned identifier for a course
pub type ItemId = i64;

/// Store-assigned identifier for a rating row
pub type RatingId = i64;

/// Rating every new course starts with
pub const DEFAULT_RATING: f64 = 1200.0;

/// Default Elo K-factor
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A course on one user's list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The Elo strength estimate for one course under one user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemRating {
    pub id: RatingId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
}

impl From<ItemRating> for EloRating {
    fn from(rating: ItemRating) -> Self {
        Self {
            rating: rating.rating,
        }
    }
}

/// A course together with its current rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedItem {
    pub item: Item,
    pub rating: ItemRating,
}

/// New rating value for a single course, applied by the store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub item_id: ItemId,
    pub rating: f64,
}

/// Two distinct courses offered for comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPair {
    pub first: Item,
    pub second: Item,
}

/// Rating change produced by a single recorded comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub item_id: ItemId,
    pub old_rating: f64,
    pub new_rating: f64,
}

impl RatingChange {
    /// Points gained (positive) or lost (negative)
    pub fn delta(&self) -> f64 {
        self.new_rating - self.old_rating
    }
}

/// Outcome of a vote after both ratings were committed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub winner: RatingChange,
    pub loser: RatingChange,
}

/// One row of a user's ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub rating: i64,
}

/// Where a new course came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    Manual,
    Csv,
}

impl std::fmt::Display for ItemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemSource::Manual => write!(f, "manual"),
            ItemSource::Csv => write!(f, "csv"),
        }
    }
}

/// Summary of a bulk CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped_blank: usize,
    pub skipped_existing: usize,
}

/// A candidate course returned by the external catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub address: String,
}

/// Explicit per-request context carrying the authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestContext {
    pub user_id: UserId,
}

impl RequestContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
