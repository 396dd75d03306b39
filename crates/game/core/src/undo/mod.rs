//! Transactional undo/redo over object snapshots.
//!
//! Mutable game objects opt into undo by implementing [`Capturable`]. Before an
//! object is mutated, the caller registers it with the [`UndoManager`], which
//! stores the snapshot the object held *before* its first mutation in the
//! current frame. Rolling a frame back restores every object in it as one unit.
//!
//! # Frames
//!
//! - [`UndoManager::open`] marks a boundary (one user-visible action)
//! - Registering the same object twice inside a frame keeps the first snapshot
//! - Any registration after an undo drops the redo history
//!
//! # Restore passes
//!
//! A rollback runs three passes over the whole frame: `prepare_restore` on
//! every object, then `restore` on every object, then the finalizers that
//! `restore` returned, in frame order. Objects that need siblings to be
//! restored before they fix up cross-references return a [`Finalize`] closure.

mod frame;
mod manager;

use std::any::Any;
use std::fmt;

use crate::error::{ErrorSeverity, GameError};

pub use frame::Frame;
pub use manager::UndoManager;

/// Deferred work returned by [`Capturable::restore`], run once every object of
/// the frame has been restored.
pub type Finalize = Box<dyn FnOnce()>;

/// Opaque state produced and consumed by a [`Capturable`] object.
///
/// The manager never looks inside a snapshot.
pub struct Snapshot(Box<dyn Any>);

impl Snapshot {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Borrows the snapshot as the concrete type its owner stored.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Like [`Snapshot::downcast_ref`] but reports a mismatch as an [`UndoError`].
    pub fn expect<T: Any>(&self, owner: &str) -> Result<&T, UndoError> {
        self.downcast_ref::<T>()
            .ok_or_else(|| UndoError::SnapshotMismatch {
                owner: owner.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Snapshot(..)")
    }
}

/// Contract for objects whose state can be captured and rolled back.
///
/// Implementors use interior mutability: the manager holds shared handles and
/// restores through `&self`.
pub trait Capturable {
    /// Short human-readable name, used in notifications and logs.
    fn label(&self) -> String;

    /// Captures the current state.
    fn capture(&self) -> Snapshot;

    /// Called on every object of a frame before any of them is restored.
    fn prepare_restore(&self) {}

    /// Puts the object back into the captured state.
    ///
    /// Returns an optional finalizer that runs after all objects of the frame
    /// have been restored.
    fn restore(&self, snapshot: &Snapshot) -> Result<Option<Finalize>, UndoError>;
}

/// Errors raised while rolling a frame back.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UndoError {
    /// An object received a snapshot it did not produce.
    #[error("snapshot handed to {owner} is not a {expected}")]
    SnapshotMismatch {
        owner: String,
        expected: &'static str,
    },

    /// An object refused to restore for a domain-specific reason.
    #[error("{owner} failed to restore: {reason}")]
    RestoreFailed { owner: String, reason: String },
}

impl GameError for UndoError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SnapshotMismatch { .. } => "UNDO_SNAPSHOT_MISMATCH",
            Self::RestoreFailed { .. } => "UNDO_RESTORE_FAILED",
        }
    }
}
