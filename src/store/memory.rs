//! In-memory store implementation
//!
//! Backs tests and ephemeral runs. A single `RwLock` guards all state, so
//! every mutating call is atomic with respect to every other.

use crate::error::{RankingError, Result};
use crate::store::{CourseStore, ItemStore, StoreStats, UserStore};
use crate::types::{Item, ItemId, ItemRating, RatedItem, RatingUpdate, User, UserId};
use crate::utils::current_timestamp;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    items: Vec<Item>,
    ratings: Vec<ItemRating>,
    next_user_id: i64,
    next_item_id: i64,
    next_rating_id: i64,
}

impl MemoryState {
    fn rating_index(&self, item_id: ItemId) -> Option<usize> {
        self.ratings.iter().position(|r| r.item_id == item_id)
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| {
            RankingError::Storage {
                message: "Failed to acquire store read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| {
            RankingError::Storage {
                message: "Failed to acquire store write lock".to_string(),
            }
            .into()
        })
    }
}

impl UserStore for InMemoryStore {
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let mut state = self.write()?;

        if state.users.iter().any(|u| u.username == username) {
            return Err(RankingError::UsernameTaken {
                username: username.to_string(),
            }
            .into());
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: current_timestamp(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.read()?;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let state = self.read()?;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }
}

impl ItemStore for InMemoryStore {
    fn find_by_name_for_user(&self, user_id: UserId, name: &str) -> Result<Option<Item>> {
        let state = self.read()?;
        Ok(state
            .items
            .iter()
            .find(|item| item.user_id == user_id && item.name == name)
            .cloned())
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Item>> {
        let state = self.read()?;
        Ok(state
            .items
            .iter()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect())
    }

    fn create(&self, user_id: UserId, name: &str, initial_rating: f64) -> Result<Item> {
        let mut state = self.write()?;

        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(RankingError::Unauthenticated.into());
        }
        if state
            .items
            .iter()
            .any(|item| item.user_id == user_id && item.name == name)
        {
            return Err(RankingError::AlreadyExists {
                name: name.to_string(),
            }
            .into());
        }

        state.next_item_id += 1;
        state.next_rating_id += 1;
        let item = Item {
            id: state.next_item_id,
            user_id,
            name: name.to_string(),
            created_at: current_timestamp(),
        };
        let rating = ItemRating {
            id: state.next_rating_id,
            user_id,
            item_id: item.id,
            rating: initial_rating,
        };
        state.items.push(item.clone());
        state.ratings.push(rating);

        Ok(item)
    }

    fn rating_for_item(&self, user_id: UserId, item_id: ItemId) -> Result<Option<ItemRating>> {
        let state = self.read()?;
        Ok(state
            .ratings
            .iter()
            .find(|r| r.item_id == item_id && r.user_id == user_id)
            .copied())
    }

    fn rated_items_for_user(&self, user_id: UserId) -> Result<Vec<RatedItem>> {
        let state = self.read()?;
        let mut rated = Vec::new();

        for item in state.items.iter().filter(|item| item.user_id == user_id) {
            let rating = state
                .rating_index(item.id)
                .map(|idx| state.ratings[idx])
                .ok_or_else(|| RankingError::Storage {
                    message: format!("Course {} has no rating", item.id),
                })?;
            rated.push(RatedItem {
                item: item.clone(),
                rating,
            });
        }

        Ok(rated)
    }

    fn store_ratings(&self, user_id: UserId, updates: &[RatingUpdate]) -> Result<()> {
        let mut state = self.write()?;

        // Resolve everything before touching anything
        let mut targets = Vec::with_capacity(updates.len());
        for update in updates {
            let idx = state
                .rating_index(update.item_id)
                .ok_or_else(|| RankingError::ItemNotFound {
                    name: update.item_id.to_string(),
                })?;
            if state.ratings[idx].user_id != user_id {
                return Err(RankingError::CrossUserReference {
                    item_id: update.item_id,
                }
                .into());
            }
            targets.push((idx, update.rating));
        }

        for (idx, rating) in targets {
            state.ratings[idx].rating = rating;
        }

        Ok(())
    }
}

impl CourseStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn stats(&self) -> Result<StoreStats> {
        let state = self.read()?;
        Ok(StoreStats {
            users: state.users.len(),
            items: state.items.len(),
            ratings: state.ratings.len(),
        })
    }
}
