//! Password hashing with Argon2id
//!
//! Hashes are stored as PHC strings, so parameters and salt travel with
//! the hash.

use crate::error::{RankingError, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use std::sync::OnceLock;

/// Hash checked when a login names an unknown user, so both paths pay for Argon2
pub(crate) static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| RankingError::Storage {
            message: format!("Failed to hash password: {err}"),
        })?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Run a full verification that can never succeed
///
/// Used on the unknown-user path of a login so its timing matches a
/// wrong password for an existing user.
pub fn verify_dummy_password(password: &str) -> bool {
    let hash =
        DUMMY_HASH.get_or_init(|| hash_password("course-ranker-dummy").unwrap_or_default());
    verify_password(password, hash);
    false
}
