//! Errors raised while encoding, decoding and replaying sequence elements.

use crate::error::{ErrorSeverity, GameError};
use crate::sequence::ElementTag;
use crate::state::{GameStateError, UnitId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// The wire tag is not a known element kind, or no decoder is registered for it.
    #[error("unknown element type '{0}'")]
    UnknownElementType(String),

    #[error("unsupported {what} version {found} (supported: {supported})")]
    UnsupportedVersion {
        what: &'static str,
        found: u32,
        supported: u32,
    },

    /// Element content does not match the shape expected for its tag.
    #[error("malformed '{tag}' content: {reason}")]
    MalformedContent { tag: ElementTag, reason: String },

    /// A unit reference in a batch cannot be resolved in the decode context.
    #[error("unit reference '{0}' cannot be resolved")]
    UnknownReference(String),

    /// An element being encoded refers to a unit the game does not know.
    #[error("element refers to unknown unit {0}")]
    UnknownUnit(UnitId),

    /// The element or batch belongs to another game.
    #[error("element for game '{found}' cannot join log of game '{expected}'")]
    ForeignElement { expected: String, found: String },

    /// Replaying the element would contradict the current game state.
    #[error("'{tag}' element out of sync with game state: {reason}")]
    Desync { tag: ElementTag, reason: String },

    #[error("json error: {0}")]
    Json(String),

    #[error(transparent)]
    Game(#[from] GameStateError),
}

impl From<serde_json::Error> for SequenceError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl GameError for SequenceError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownElementType(_) | Self::UnsupportedVersion { .. } => ErrorSeverity::Fatal,
            Self::MalformedContent { .. }
            | Self::UnknownReference(_)
            | Self::ForeignElement { .. }
            | Self::Json(_) => ErrorSeverity::Validation,
            Self::UnknownUnit(_) | Self::Desync { .. } => ErrorSeverity::Internal,
            Self::Game(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownElementType(_) => "SEQ_UNKNOWN_TYPE",
            Self::UnsupportedVersion { .. } => "SEQ_VERSION",
            Self::MalformedContent { .. } => "SEQ_MALFORMED",
            Self::UnknownReference(_) => "SEQ_UNKNOWN_REFERENCE",
            Self::UnknownUnit(_) => "SEQ_UNKNOWN_UNIT",
            Self::ForeignElement { .. } => "SEQ_FOREIGN_ELEMENT",
            Self::Desync { .. } => "SEQ_DESYNC",
            Self::Json(_) => "SEQ_JSON",
            Self::Game(err) => err.error_code(),
        }
    }
}
