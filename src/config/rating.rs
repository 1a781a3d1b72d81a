//! Rating system configuration

use crate::error::RankingError;
use crate::types::{DEFAULT_K_FACTOR, DEFAULT_RATING};
use serde::{Deserialize, Serialize};

/// Elo parameters shared by every user's ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating assigned to newly added courses
    pub initial_rating: f64,
    /// Maximum points exchanged per comparison
    pub k_factor: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_RATING,
            k_factor: DEFAULT_K_FACTOR,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(RankingError::ConfigurationError {
                message: "K-factor must be positive".to_string(),
            }
            .into());
        }

        if !self.initial_rating.is_finite() {
            return Err(RankingError::ConfigurationError {
                message: "Initial rating must be finite".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
