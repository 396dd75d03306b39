//! State management errors.
//!
//! Errors related to unit lookup and board mutations.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{Hex, UnitId};

/// Errors that occur during game state operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameStateError {
    /// No unit with this id exists in the game.
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    /// A unit with this id was already added to the game.
    #[error("unit {0} is already part of the game")]
    DuplicateUnit(UnitId),

    /// Another unit already carries this name; names identify units on the wire.
    #[error("unit name '{name}' is already used by unit {holder}")]
    DuplicateName {
        /// The contested name.
        name: String,
        /// Unit that already carries it.
        holder: UnitId,
    },

    /// The unit has no steps left and is no longer on the map.
    #[error("unit {0} has been eliminated")]
    Eliminated(UnitId),

    /// The destination hex holds a unit of the opposing side.
    #[error("hex {hex} is occupied by enemy unit {occupant}")]
    Occupied {
        /// The contested hex.
        hex: Hex,
        /// Unit currently standing on the hex.
        occupant: UnitId,
    },

    /// Canonical state encoding failed.
    #[error("failed to encode game view: {0}")]
    Encoding(String),
}

impl GameError for GameStateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownUnit(_) | Self::DuplicateUnit(_) | Self::DuplicateName { .. } => {
                ErrorSeverity::Validation
            }
            Self::Eliminated(_) | Self::Occupied { .. } => ErrorSeverity::Validation,
            Self::Encoding(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => "STATE_UNKNOWN_UNIT",
            Self::DuplicateUnit(_) => "STATE_DUPLICATE_UNIT",
            Self::DuplicateName { .. } => "STATE_DUPLICATE_NAME",
            Self::Eliminated(_) => "STATE_ELIMINATED",
            Self::Occupied { .. } => "STATE_OCCUPIED",
            Self::Encoding(_) => "STATE_ENCODING",
        }
    }
}
