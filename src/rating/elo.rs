//! Elo rating system implementation
//!
//! This module provides the concrete rating calculator used for pairwise
//! course comparisons, built on the Elo functions of the skillratings crate.

use crate::config::RatingConfig;
use crate::error::RankingError;
use crate::rating::calculator::RatingCalculator;
use crate::types::{ItemRating, RatingChange, VoteOutcome};
use skillratings::elo::{elo, expected_score, EloConfig, EloRating};
use skillratings::Outcomes;
use tracing::debug;

/// Elo rating calculator
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    elo_config: EloConfig,
    initial_rating: f64,
}

impl EloRatingCalculator {
    /// Create a new Elo rating calculator
    pub fn new(config: &RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self {
            elo_config: EloConfig {
                k: config.k_factor,
            },
            initial_rating: config.initial_rating,
        })
    }

    /// K-factor in use
    pub fn k_factor(&self) -> f64 {
        self.elo_config.k
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        let config = RatingConfig::default();
        Self {
            elo_config: EloConfig {
                k: config.k_factor,
            },
            initial_rating: config.initial_rating,
        }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn calculate_rating_changes(
        &self,
        winner: &ItemRating,
        loser: &ItemRating,
    ) -> crate::error::Result<VoteOutcome> {
        if winner.user_id != loser.user_id {
            return Err(RankingError::CrossUserReference {
                item_id: loser.item_id,
            }
            .into());
        }
        if winner.item_id == loser.item_id {
            return Err(RankingError::SelfComparison {
                name: winner.item_id.to_string(),
            }
            .into());
        }

        let winner_elo: EloRating = (*winner).into();
        let loser_elo: EloRating = (*loser).into();
        let (new_winner, new_loser) = elo(&winner_elo, &loser_elo, &Outcomes::WIN, &self.elo_config);

        debug!(
            "Elo update: winner {} {:.2} -> {:.2}, loser {} {:.2} -> {:.2}",
            winner.item_id,
            winner.rating,
            new_winner.rating,
            loser.item_id,
            loser.rating,
            new_loser.rating
        );

        Ok(VoteOutcome {
            winner: RatingChange {
                item_id: winner.item_id,
                old_rating: winner.rating,
                new_rating: new_winner.rating,
            },
            loser: RatingChange {
                item_id: loser.item_id,
                old_rating: loser.rating,
                new_rating: new_loser.rating,
            },
        })
    }

    fn expected_score(&self, rating: f64, opponent: f64) -> f64 {
        let (expected, _) = expected_score(
            &EloRating { rating },
            &EloRating { rating: opponent },
        );
        expected
    }

    fn initial_rating(&self) -> f64 {
        self.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "elo",
            "k_factor": self.elo_config.k,
            "initial_rating": self.initial_rating
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn rating(item_id: i64, value: f64) -> ItemRating {
        ItemRating {
            id: item_id,
            user_id: 1,
            item_id,
            rating: value,
        }
    }

    #[test]
    fn test_equal_ratings_exchange_half_k() {
        let calculator = EloRatingCalculator::default();
        let outcome = calculator
            .calculate_rating_changes(&rating(1, 1200.0), &rating(2, 1200.0))
            .unwrap();

        assert!((outcome.winner.new_rating - 1216.0).abs() < EPSILON);
        assert!((outcome.loser.new_rating - 1184.0).abs() < EPSILON);
        assert_eq!(outcome.winner.old_rating, 1200.0);
        assert_eq!(outcome.loser.old_rating, 1200.0);
    }

    #[test]
    fn test_upset_moves_more_points() {
        let calculator = EloRatingCalculator::default();

        let favourite_wins = calculator
            .calculate_rating_changes(&rating(1, 1400.0), &rating(2, 1200.0))
            .unwrap();
        let underdog_wins = calculator
            .calculate_rating_changes(&rating(2, 1200.0), &rating(1, 1400.0))
            .unwrap();

        assert!(underdog_wins.winner.delta() > favourite_wins.winner.delta());
        assert!(favourite_wins.winner.delta() > 0.0);
        assert!(underdog_wins.winner.delta() < 32.0);
    }

    #[test]
    fn test_expected_score() {
        let calculator = EloRatingCalculator::default();
        assert!((calculator.expected_score(1200.0, 1200.0) - 0.5).abs() < EPSILON);

        let favoured = calculator.expected_score(1600.0, 1200.0);
        let expected = 1.0 / (1.0 + 10f64.powf(-400.0 / 400.0));
        assert!((favoured - expected).abs() < EPSILON);
        assert!(
            (favoured + calculator.expected_score(1200.0, 1600.0) - 1.0).abs() < EPSILON
        );
    }

    #[test]
    fn test_custom_k_factor() {
        let calculator = EloRatingCalculator::new(&RatingConfig {
            initial_rating: 1000.0,
            k_factor: 16.0,
        })
        .unwrap();

        assert_eq!(calculator.initial_rating(), 1000.0);
        assert_eq!(calculator.k_factor(), 16.0);

        let outcome = calculator
            .calculate_rating_changes(&rating(1, 1000.0), &rating(2, 1000.0))
            .unwrap();
        assert!((outcome.winner.new_rating - 1008.0).abs() < EPSILON);
    }

    #[test]
    fn test_invalid_k_factor_rejected() {
        let result = EloRatingCalculator::new(&RatingConfig {
            initial_rating: 1200.0,
            k_factor: -1.0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_cross_user_and_self_comparison_rejected() {
        let calculator = EloRatingCalculator::default();

        let mut foreign = rating(2, 1200.0);
        foreign.user_id = 2;
        let err = calculator
            .calculate_rating_changes(&rating(1, 1200.0), &foreign)
            .unwrap_err();
        assert!(matches!(
            RankingError::find(&err),
            Some(RankingError::CrossUserReference { .. })
        ));

        let err = calculator
            .calculate_rating_changes(&rating(1, 1200.0), &rating(1, 1200.0))
            .unwrap_err();
        assert!(matches!(
            RankingError::find(&err),
            Some(RankingError::SelfComparison { .. })
        ));
    }

    #[test]
    fn test_config_json() {
        let calculator = EloRatingCalculator::default();
        let config = calculator.config();
        assert_eq!(config["type"], "elo");
        assert_eq!(config["k_factor"], 32.0);
    }

    proptest! {
        #[test]
        fn prop_point_exchange_is_zero_sum(
            winner in 0.0f64..3000.0,
            loser in 0.0f64..3000.0,
            k in 1.0f64..64.0,
        ) {
            let calculator = EloRatingCalculator::new(&RatingConfig {
                initial_rating: 1200.0,
                k_factor: k,
            })
            .unwrap();
            let outcome = calculator
                .calculate_rating_changes(&rating(1, winner), &rating(2, loser))
                .unwrap();

            prop_assert!((outcome.winner.delta() + outcome.loser.delta()).abs() < 1e-6);
            prop_assert!(outcome.winner.delta() > 0.0);
            prop_assert!(outcome.winner.delta() < k);
        }

        #[test]
        fn prop_equal_ratings_winner_gains(value in 0.0f64..3000.0, k in 0.5f64..64.0) {
            let calculator = EloRatingCalculator::new(&RatingConfig {
                initial_rating: 1200.0,
                k_factor: k,
            })
            .unwrap();
            let outcome = calculator
                .calculate_rating_changes(&rating(1, value), &rating(2, value))
                .unwrap();

            prop_assert!(outcome.winner.new_rating > value);
            prop_assert!((outcome.winner.delta() - k / 2.0).abs() < 1e-9);
        }
    }
}
