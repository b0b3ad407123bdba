//! Error types for request log buffer operations.
//!
//! The buffer surfaces exactly two failure classes: the external list store
//! being unavailable (or rejecting a batch), and a stored payload that can
//! no longer be decoded. Store failures are passed through verbatim with no
//! retry or backoff; an unknown event category on write is deliberately not
//! an error at all (the write is accepted and discarded).

use thiserror::Error;

/// Result type alias for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;

/// Failures surfaced by [`crate::RequestLogBuffer`] and the store layer.
#[derive(Debug, Error)]
pub enum BufferError {
    /// The keyed-list store was unreachable or a batch failed.
    #[error("list store error: {message}")]
    Store {
        /// Error message from the store client.
        message: String,
    },

    /// A stored payload could not be decoded on read.
    ///
    /// This is a data-integrity failure for the whole read call; partial
    /// results are never returned around a corrupt record.
    #[error("malformed stored record: {0}")]
    MalformedRecord(#[from] serde_json::Error),
}

impl BufferError {
    /// Creates a store error from a message.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into() }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for BufferError {
    fn from(err: redis::RedisError) -> Self {
        Self::Store { message: err.to_string() }
    }
}
