//! Sequencing core of the hex wargame client.
//!
//! `game-core` holds everything that runs on the single game thread: the game
//! model, the [`NotificationBus`], the [`UndoManager`], the typed
//! [`SequenceElement`]s with their [`ElementRegistry`], the per-game
//! [`ActionSequenceLog`] and tick-driven [`Replay`]. No I/O happens here; the
//! runtime crate moves committed batches between participants.
//!
//! Services are plain values constructed by the caller and shared with `Rc`.
//! Local play goes through a [`Session`], which opens undo frames, registers
//! objects before mutating them and appends the matching elements.
pub mod combat;
pub mod error;
pub mod notify;
pub mod sequence;
pub mod session;
pub mod state;
pub mod undo;

#[cfg(test)]
mod testing;

pub use combat::{Arbitrator, CombatError, CombatOutcome, CombatSequence, CombatStep};
pub use error::{ErrorSeverity, GameError};
pub use notify::{Listener, Notification, NotificationBus};
pub use sequence::{
    ActionSequenceLog, Animation, Batch, ELEMENT_VERSION, ElementBody, ElementRegistry,
    ElementSpec, ElementTag, LOG_VERSION, LogSpec, Replay, ReplayCursor, ReplayStatus,
    SequenceElement, SequenceError, SpecContext,
};
pub use session::Session;
pub use state::{
    Board, BoardState, Game, GameStateError, GameView, Hex, Side, Tick, Unit, UnitId, UnitState,
    UnitView, Weather,
};
pub use undo::{Capturable, Finalize, Frame, Snapshot, UndoError, UndoManager};
