//! Rating calculator trait
//!
//! This module defines the interface the ranking engine uses to turn a
//! recorded pairwise outcome into new ratings.

use crate::types::{ItemRating, VoteOutcome};

/// Trait for calculating rating changes after a comparison
pub trait RatingCalculator: Send + Sync {
    /// Calculate new ratings after `winner` was preferred over `loser`
    ///
    /// # Arguments
    /// * `winner` - Current rating of the preferred course
    /// * `loser` - Current rating of the other course
    ///
    /// # Returns
    /// Old and new rating for both sides; nothing is persisted here
    fn calculate_rating_changes(
        &self,
        winner: &ItemRating,
        loser: &ItemRating,
    ) -> crate::error::Result<VoteOutcome>;

    /// Probability that a course rated `rating` is preferred over one rated `opponent`
    fn expected_score(&self, rating: f64, opponent: f64) -> f64;

    /// Get the initial rating for new courses
    fn initial_rating(&self) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}
