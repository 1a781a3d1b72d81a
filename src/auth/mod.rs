//! Identity: password hashing, session tokens and the provider tying them
//! to the user store

pub mod password;
pub mod provider;
pub mod session;

pub use provider::{IdentityProvider, Session};
pub use session::{SessionClaims, SessionSigner};
