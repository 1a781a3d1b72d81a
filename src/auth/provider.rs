//! Identity provider
//!
//! Registers users, checks credentials and turns session tokens back into
//! a `RequestContext`. The ranking engine never sees anything but the
//! resulting user id.

use crate::auth::password::{hash_password, verify_dummy_password, verify_password};
use crate::auth::session::{SessionClaims, SessionSigner};
use crate::error::{RankingError, Result};
use crate::store::CourseStore;
use crate::types::{RequestContext, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// A freshly issued session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Authenticates users against the store
pub struct IdentityProvider {
    store: Arc<dyn CourseStore>,
    signer: SessionSigner,
    /// Revoked session nonces and when they would have expired anyway
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl IdentityProvider {
    pub fn new(store: Arc<dyn CourseStore>, signer: SessionSigner) -> Self {
        Self {
            store,
            signer,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Session lifetime in seconds, for cookie attributes
    pub fn session_ttl_seconds(&self) -> u64 {
        self.signer.ttl().as_secs()
    }

    /// Create an account and sign it in
    pub fn register(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(RankingError::MissingCredentials.into());
        }

        if self.store.find_user_by_username(username)?.is_some() {
            return Err(RankingError::UsernameTaken {
                username: username.to_string(),
            }
            .into());
        }

        let password_hash = hash_password(password)?;
        let user = self.store.create_user(username, &password_hash)?;
        info!("Registered user {} ('{}')", user.id, user.username);

        self.open_session(user.id, &user.username)
    }

    /// Check credentials and sign in
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(RankingError::MissingCredentials.into());
        }

        let user = match self.store.find_user_by_username(username)? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            Some(_) => {
                warn!("Failed login for '{}'", username);
                return Err(RankingError::InvalidCredentials.into());
            }
            None => {
                verify_dummy_password(password);
                warn!("Failed login for '{}'", username);
                return Err(RankingError::InvalidCredentials.into());
            }
        };

        info!("User {} logged in", user.id);
        self.open_session(user.id, &user.username)
    }

    /// Resolve a session token into the context for one request
    pub fn authenticate(&self, token: &str) -> Result<RequestContext> {
        let claims = self.signer.verify(token)?;

        if self.is_revoked(&claims)? {
            debug!("Rejected revoked session for user {}", claims.user_id);
            return Err(RankingError::Unauthenticated.into());
        }
        if self.store.get_user(claims.user_id)?.is_none() {
            return Err(RankingError::Unauthenticated.into());
        }

        Ok(RequestContext::new(claims.user_id))
    }

    /// Revoke the session behind `token`
    pub fn logout(&self, token: &str) -> Result<()> {
        let claims = self.signer.verify(token)?;
        let mut revoked = self.revoked.write().map_err(|_| RankingError::Storage {
            message: "Failed to acquire session lock".to_string(),
        })?;

        // Entries past their expiry would fail verification anyway
        let now = Utc::now();
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.insert(claims.nonce, claims.expires_at);

        info!("User {} logged out", claims.user_id);
        Ok(())
    }

    fn is_revoked(&self, claims: &SessionClaims) -> Result<bool> {
        let revoked = self.revoked.read().map_err(|_| RankingError::Storage {
            message: "Failed to acquire session lock".to_string(),
        })?;
        Ok(revoked.contains_key(&claims.nonce))
    }

    fn open_session(&self, user_id: UserId, username: &str) -> Result<Session> {
        let (token, claims) = self.signer.issue(user_id)?;
        Ok(Session {
            token,
            user_id,
            username: username.to_string(),
            expires_at: claims.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::time::Duration;

    fn provider() -> IdentityProvider {
        IdentityProvider::new(
            Arc::new(InMemoryStore::new()),
            SessionSigner::new("secret", Duration::from_secs(60)),
        )
    }

    fn kind(err: anyhow::Error) -> RankingError {
        RankingError::find(&err).cloned().expect("ranking error")
    }

    #[test]
    fn test_register_login_authenticate() {
        let provider = provider();
        let registered = provider.register("alice", "pw").unwrap();

        let ctx = provider.authenticate(&registered.token).unwrap();
        assert_eq!(ctx.user_id, registered.user_id);

        let session = provider.login("alice", "pw").unwrap();
        assert_eq!(session.user_id, registered.user_id);
        assert_ne!(session.token, registered.token);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let provider = provider();
        provider.register("alice", "pw").unwrap();

        assert_eq!(
            kind(provider.register("alice", "other").unwrap_err()),
            RankingError::UsernameTaken {
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_bad_credentials_rejected() {
        let provider = provider();
        provider.register("alice", "pw").unwrap();

        assert_eq!(
            kind(provider.login("alice", "wrong").unwrap_err()),
            RankingError::InvalidCredentials
        );
        assert_eq!(
            kind(provider.login("", "pw").unwrap_err()),
            RankingError::MissingCredentials
        );
    }

    #[test]
    fn test_unknown_user_still_runs_argon2() {
        let provider = provider();

        assert_eq!(
            kind(provider.login("nobody", "pw").unwrap_err()),
            RankingError::InvalidCredentials
        );
        let dummy = crate::auth::password::DUMMY_HASH
            .get()
            .expect("dummy hash computed on the unknown-user path");
        assert!(dummy.starts_with("$argon2id$"));
    }

    #[test]
    fn test_logout_revokes_only_that_session() {
        let provider = provider();
        let first = provider.register("alice", "pw").unwrap();
        let second = provider.login("alice", "pw").unwrap();

        provider.logout(&first.token).unwrap();

        assert_eq!(
            kind(provider.authenticate(&first.token).unwrap_err()),
            RankingError::Unauthenticated
        );
        assert!(provider.authenticate(&second.token).is_ok());
    }
}
