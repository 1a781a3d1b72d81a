//! SQLite schema migrations
//!
//! Applied versions are mirrored to `PRAGMA user_version`; pending
//! migrations run inside one transaction.

use crate::error::{RankingError, Result};
use rusqlite::Connection;
use tracing::info;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Latest schema version known by this binary
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Apply all pending migrations on the provided connection
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(RankingError::Storage {
            message: format!(
                "database schema version {current_version} is newer than supported {latest}"
            ),
        }
        .into());
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!("Applied schema migration {}", migration.version);
    }
    tx.commit()?;

    Ok(())
}

/// Schema version recorded in the database
pub fn current_user_version(conn: &Connection) -> Result<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
