//! Error types for the ranking service
//!
//! Domain failures are modelled as a `thiserror` enum and carried through
//! `anyhow::Result`, so callers at the HTTP boundary can downcast them back
//! into status codes.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ranking scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("Need at least 2 courses to compare (found {found})")]
    InsufficientItems { found: usize },

    #[error("Course not found: {name}")]
    ItemNotFound { name: String },

    #[error("Course already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Rating references an item owned by another user: item {item_id}")]
    CrossUserReference { item_id: i64 },

    #[error("A course cannot be compared with itself: {name}")]
    SelfComparison { name: String },

    #[error("Invalid course name: {reason}")]
    InvalidItemName { reason: String },

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Username already exists: {username}")]
    UsernameTaken { username: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    #[error("Course search failed: {reason}")]
    UpstreamSearchFailure { reason: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl RankingError {
    /// Find a `RankingError` anywhere in an `anyhow` chain
    pub fn find(error: &anyhow::Error) -> Option<&RankingError> {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<RankingError>())
    }
}
