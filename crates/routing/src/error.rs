use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Typed routing errors. Cache failures are recoverable on the read path
/// (the resolver falls through to the store); store failures are not.
#[derive(Debug, Error)]
pub enum Error {
    /// Cache operation failed. Reads treat this as a miss; invalidation
    /// propagates it so an admin action cannot report success past a stale
    /// cache entry.
    #[error("routing cache unavailable: {0}")]
    Cache(String),

    /// Store query or mutation failed; resolution must not proceed.
    #[error("link store failed: {0}")]
    Store(String),

    /// Input rejected before reaching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn cache(message: impl std::fmt::Display) -> Self {
        Self::Cache(message.to_string())
    }

    #[must_use]
    pub fn store(message: impl std::fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput(message.to_string())
    }

    #[must_use]
    pub fn not_found(message: impl std::fmt::Display) -> Self {
        Self::NotFound(message.to_string())
    }
}

impl discast_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

discast_common::impl_context!();
