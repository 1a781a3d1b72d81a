//! Rating system for pairwise course comparisons
//!
//! This module provides the Elo calculator, the pairing selector, and the
//! traits the ranking engine uses to reach them.

pub mod calculator;
pub mod elo;
pub mod pairing;

// Re-export commonly used types
pub use calculator::RatingCalculator;
pub use elo::EloRatingCalculator;
pub use pairing::{PairingSelector, UniformPairingSelector};
