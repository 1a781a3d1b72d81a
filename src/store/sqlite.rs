//! SQLite store implementation
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections with required pragmas.
//! - Keep SQL details behind the store traits.
//!
//! # Invariants
//! - Connections have `foreign_keys=ON` and all migrations applied.
//! - Item creation and rating updates run inside a single transaction.

use crate::error::{RankingError, Result};
use crate::store::migrations::apply_migrations;
use crate::store::{CourseStore, ItemStore, StoreStats, UserStore};
use crate::types::{Item, ItemId, ItemRating, RatedItem, RatingUpdate, User, UserId};
use crate::utils::current_timestamp;
use anyhow::Context;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{error, info};

const ITEM_SELECT_SQL: &str = "SELECT id, user_id, name, created_at FROM items";

/// SQLite-backed store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file and apply migrations
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(mode = "file", path = %path.display(), "Opening database");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path).map_err(|err| {
            error!(mode = "file", error = %err, "Failed to open database");
            err
        })?;
        let store = Self::bootstrap(conn)?;

        info!(
            mode = "file",
            duration_ms = started_at.elapsed().as_millis() as u64,
            "Database ready"
        );
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn)
    }

    fn bootstrap(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            RankingError::Storage {
                message: "Failed to acquire database lock".to_string(),
            }
            .into()
        })
    }
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

impl UserStore for SqliteStore {
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.lock()?;
        let created_at = current_timestamp();

        let inserted = conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3);",
            params![username, password_hash, created_at],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_constraint_violation(&err) => {
                return Err(RankingError::UsernameTaken {
                    username: username.to_string(),
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        }

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1;",
                params![username],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE id = ?1;",
                params![user_id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }
}

impl ItemStore for SqliteStore {
    fn find_by_name_for_user(&self, user_id: UserId, name: &str) -> Result<Option<Item>> {
        let conn = self.lock()?;
        let item = conn
            .query_row(
                &format!("{ITEM_SELECT_SQL} WHERE user_id = ?1 AND name = ?2;"),
                params![user_id, name],
                map_item,
            )
            .optional()?;
        Ok(item)
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Item>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE user_id = ?1 ORDER BY id;"))?;
        let items = stmt
            .query_map(params![user_id], map_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn create(&self, user_id: UserId, name: &str, initial_rating: f64) -> Result<Item> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let user_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            params![user_id],
            |row| row.get(0),
        )?;
        if !user_exists {
            return Err(RankingError::Unauthenticated.into());
        }

        let created_at = current_timestamp();
        let inserted = tx.execute(
            "INSERT INTO items (user_id, name, created_at) VALUES (?1, ?2, ?3);",
            params![user_id, name, created_at],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_constraint_violation(&err) => {
                return Err(RankingError::AlreadyExists {
                    name: name.to_string(),
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        }
        let item_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO ratings (user_id, item_id, rating) VALUES (?1, ?2, ?3);",
            params![user_id, item_id, initial_rating],
        )?;
        tx.commit()?;

        Ok(Item {
            id: item_id,
            user_id,
            name: name.to_string(),
            created_at,
        })
    }

    fn rating_for_item(&self, user_id: UserId, item_id: ItemId) -> Result<Option<ItemRating>> {
        let conn = self.lock()?;
        let rating = conn
            .query_row(
                "SELECT id, user_id, item_id, rating FROM ratings WHERE item_id = ?1 AND user_id = ?2;",
                params![item_id, user_id],
                |row| {
                    Ok(ItemRating {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        item_id: row.get(2)?,
                        rating: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(rating)
    }

    fn rated_items_for_user(&self, user_id: UserId) -> Result<Vec<RatedItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT i.id, i.user_id, i.name, i.created_at, r.id, r.user_id, r.rating
             FROM items i
             JOIN ratings r ON r.item_id = i.id
             WHERE i.user_id = ?1
             ORDER BY i.id;",
        )?;
        let rated = stmt
            .query_map(params![user_id], |row| {
                let item = map_item(row)?;
                let rating = ItemRating {
                    id: row.get(4)?,
                    user_id: row.get(5)?,
                    item_id: item.id,
                    rating: row.get(6)?,
                };
                Ok(RatedItem { item, rating })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rated)
    }

    fn store_ratings(&self, user_id: UserId, updates: &[RatingUpdate]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for update in updates {
            let changed = tx.execute(
                "UPDATE ratings SET rating = ?1 WHERE item_id = ?2 AND user_id = ?3;",
                params![update.rating, update.item_id, user_id],
            )?;
            if changed == 1 {
                continue;
            }

            // Dropping `tx` rolls back anything already written
            let owner: Option<UserId> = tx
                .query_row(
                    "SELECT user_id FROM ratings WHERE item_id = ?1;",
                    params![update.item_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match owner {
                Some(_) => RankingError::CrossUserReference {
                    item_id: update.item_id,
                },
                None => RankingError::ItemNotFound {
                    name: update.item_id.to_string(),
                },
            }
            .into());
        }

        tx.commit()?;
        Ok(())
    }
}

impl CourseStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            users: count("users")?,
            items: count("items")?,
            ratings: count("ratings")?,
        })
    }
}
