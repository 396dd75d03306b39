//! Error types raised by transport implementations.

use thiserror::Error;

/// Errors surfaced by transport implementations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("batch {position} of game '{game}' already holds different elements")]
    Conflict { game: String, position: u64 },

    #[error("game name '{0}' cannot be used as a store key")]
    InvalidGame(String),

    #[error("transport lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    /// Transient failures; the caller may retry the same batch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
