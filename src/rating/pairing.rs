//! Pairing selection
//!
//! Picks the two courses a user is asked to compare next. Selection is
//! uniform over all unordered pairs and keeps no memory between calls.

use crate::error::RankingError;
use crate::types::{Item, ItemPair};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

/// Trait for choosing the next comparison
pub trait PairingSelector: Send + Sync {
    /// Choose two distinct courses from `items`
    fn select_pair(&self, items: &[Item]) -> crate::error::Result<ItemPair>;
}

/// Uniform random selection without replacement
#[derive(Debug)]
pub struct UniformPairingSelector {
    rng: Mutex<StdRng>,
}

impl UniformPairingSelector {
    /// Selector seeded from operating system entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Selector with a fixed seed, for reproducible sequences
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for UniformPairingSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PairingSelector for UniformPairingSelector {
    fn select_pair(&self, items: &[Item]) -> crate::error::Result<ItemPair> {
        if items.len() < 2 {
            return Err(RankingError::InsufficientItems { found: items.len() }.into());
        }

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| RankingError::Storage {
                message: "Failed to acquire pairing rng lock".to_string(),
            })?;

        let mut chosen = items.choose_multiple(&mut *rng, 2);
        match (chosen.next(), chosen.next()) {
            (Some(first), Some(second)) => Ok(ItemPair {
                first: first.clone(),
                second: second.clone(),
            }),
            _ => Err(RankingError::InsufficientItems { found: items.len() }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;
    use std::collections::HashMap;

    fn items(count: i64) -> Vec<Item> {
        (1..=count)
            .map(|id| Item {
                id,
                user_id: 1,
                name: format!("Course {id}"),
                created_at: current_timestamp(),
            })
            .collect()
    }

    #[test]
    fn test_fails_with_fewer_than_two_items() {
        let selector = UniformPairingSelector::seeded(7);

        for count in 0..2 {
            let err = selector.select_pair(&items(count)).unwrap_err();
            assert_eq!(
                RankingError::find(&err),
                Some(&RankingError::InsufficientItems {
                    found: count as usize
                })
            );
        }
    }

    #[test]
    fn test_two_items_always_returns_both() {
        let selector = UniformPairingSelector::seeded(1);
        let pool = items(2);

        for _ in 0..20 {
            let pair = selector.select_pair(&pool).unwrap();
            let mut ids = [pair.first.id, pair.second.id];
            ids.sort();
            assert_eq!(ids, [1, 2]);
        }
    }

    #[test]
    fn test_never_returns_same_item_twice() {
        let selector = UniformPairingSelector::new();
        let pool = items(5);

        for _ in 0..500 {
            let pair = selector.select_pair(&pool).unwrap();
            assert_ne!(pair.first.id, pair.second.id);
        }
    }

    #[test]
    fn test_every_unordered_pair_is_reachable() {
        let selector = UniformPairingSelector::seeded(42);
        let pool = items(4);
        let mut seen: HashMap<(i64, i64), usize> = HashMap::new();

        for _ in 0..2_000 {
            let pair = selector.select_pair(&pool).unwrap();
            let key = (
                pair.first.id.min(pair.second.id),
                pair.first.id.max(pair.second.id),
            );
            *seen.entry(key).or_default() += 1;
        }

        // 4 items give 6 unordered pairs, each expected ~333 times
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&count| count > 200 && count < 470));
    }

    #[test]
    fn test_seeded_selectors_agree() {
        let pool = items(10);
        let a = UniformPairingSelector::seeded(99);
        let b = UniformPairingSelector::seeded(99);

        for _ in 0..10 {
            assert_eq!(a.select_pair(&pool).unwrap(), b.select_pair(&pool).unwrap());
        }
    }
}
