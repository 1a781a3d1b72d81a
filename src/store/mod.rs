//! Persistence interfaces and implementations
//!
//! The ranking engine and identity provider only talk to these traits.
//! Every lookup is scoped by user id; nothing here traverses from one user's
//! data to another's.
//!
//! Invariants upheld by every implementation:
//! - creating an item creates its rating in the same atomic step
//! - `store_ratings` applies all updates or none

pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{Item, ItemId, ItemRating, RatedItem, RatingUpdate, User, UserId};
use serde::{Deserialize, Serialize};

/// User persistence used by the identity provider
pub trait UserStore: Send + Sync {
    /// Create a user; fails with `UsernameTaken` on duplicates
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;

    /// Look up a user by exact username
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Look up a user by id
    fn get_user(&self, user_id: UserId) -> Result<Option<User>>;
}

/// Course and rating persistence used by the ranking engine
pub trait ItemStore: Send + Sync {
    /// Find a course by exact name within one user's list
    fn find_by_name_for_user(&self, user_id: UserId, name: &str) -> Result<Option<Item>>;

    /// All of a user's courses in creation order
    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Item>>;

    /// Create a course and its rating; fails with `AlreadyExists` on duplicates
    fn create(&self, user_id: UserId, name: &str, initial_rating: f64) -> Result<Item>;

    /// Current rating of one course
    fn rating_for_item(&self, user_id: UserId, item_id: ItemId) -> Result<Option<ItemRating>>;

    /// All of a user's courses with their ratings, in creation order
    fn rated_items_for_user(&self, user_id: UserId) -> Result<Vec<RatedItem>>;

    /// Write several ratings atomically
    fn store_ratings(&self, user_id: UserId, updates: &[RatingUpdate]) -> Result<()>;
}

/// Row counts reported by health checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub users: usize,
    pub items: usize,
    pub ratings: usize,
}

/// A complete backing store
pub trait CourseStore: UserStore + ItemStore {
    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Row counts; also serves as a connectivity check
    fn stats(&self) -> Result<StoreStats>;
}
