//! Unified error types surfaced by the runtime.
//!
//! Wraps failures from transports, sequence decoding and scenario loading so
//! clients can bubble them up with consistent context.
use std::path::PathBuf;

use thiserror::Error;

use game_core::{ErrorSeverity, GameError, SequenceError};

pub use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failures of a save or load round trip.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("store returned batch for game '{found}' while loading '{expected}'")]
    WrongGame { expected: String, found: String },

    #[error("store returned batch {position} twice")]
    DuplicateBatch { position: u64 },
}

impl SyncError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Game(#[from] game_core::GameStateError),

    #[error("failed to read scenario {path}")]
    ScenarioIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

impl RuntimeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Sync(SyncError::Transport(err)) | Self::Transport(err) if err.is_retryable() => {
                ErrorSeverity::Recoverable
            }
            Self::Transport(_) => ErrorSeverity::Internal,
            Self::Sync(SyncError::Sequence(err)) | Self::Sequence(err) => err.severity(),
            Self::Game(err) => err.severity(),
            Self::Sync(_) => ErrorSeverity::Internal,
            Self::ScenarioIo { .. } | Self::InvalidScenario(_) => ErrorSeverity::Fatal,
        }
    }
}
