//! Signed session tokens
//!
//! A token is `<user_id>.<expires_unix>.<nonce>.<hmac_hex>`, where the MAC is
//! HMAC-SHA256 over the first three fields. Tokens are self-contained; the
//! nonce lets the identity provider revoke a single session.

use crate::error::{RankingError, Result};
use crate::types::UserId;
use crate::utils::{current_timestamp, decode_hex, encode_hex};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Fields recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub nonce: String,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    /// Session lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` valid for the configured lifetime
    pub fn issue(&self, user_id: UserId) -> Result<(String, SessionClaims)> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|_| {
            RankingError::ConfigurationError {
                message: "Session lifetime out of range".to_string(),
            }
        })?;
        // Whole seconds, matching what the token can carry
        let expires_at = DateTime::from_timestamp((current_timestamp() + ttl).timestamp(), 0)
            .ok_or_else(|| RankingError::ConfigurationError {
                message: "Session expiry out of range".to_string(),
            })?;
        let claims = SessionClaims {
            user_id,
            expires_at,
            nonce: Uuid::new_v4().simple().to_string(),
        };

        let payload = format!(
            "{}.{}.{}",
            claims.user_id,
            claims.expires_at.timestamp(),
            claims.nonce
        );
        let signature = self.sign(payload.as_bytes())?;
        Ok((format!("{payload}.{signature}"), claims))
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        self.verify_at(token, current_timestamp())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims> {
        let (payload, signature) = token
            .rsplit_once('.')
            .ok_or(RankingError::Unauthenticated)?;
        let signature = decode_hex(signature).ok_or(RankingError::Unauthenticated)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| RankingError::Unauthenticated)?;

        let mut parts = payload.splitn(3, '.');
        let (Some(user_id), Some(expires), Some(nonce)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(RankingError::Unauthenticated.into());
        };

        let user_id: UserId = user_id.parse().map_err(|_| RankingError::Unauthenticated)?;
        let expires: i64 = expires.parse().map_err(|_| RankingError::Unauthenticated)?;
        let expires_at = Utc
            .timestamp_opt(expires, 0)
            .single()
            .ok_or(RankingError::Unauthenticated)?;

        if expires_at <= now {
            return Err(RankingError::Unauthenticated.into());
        }

        Ok(SessionClaims {
            user_id,
            expires_at,
            nonce: nonce.to_string(),
        })
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| {
            RankingError::ConfigurationError {
                message: "Invalid session secret".to_string(),
            }
            .into()
        })
    }

    fn sign(&self, payload: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(encode_hex(mac.finalize().into_bytes().as_slice()))
    }
}
