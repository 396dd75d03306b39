//! Action sequencing: typed elements, their wire form, the per-game log and
//! tick-driven replay.
//!
//! Local play appends [`SequenceElement`]s to an [`ActionSequenceLog`]. A
//! commit freezes the pending elements into a numbered [`Batch`]; once the
//! store accepts it the log is acknowledged and the batch leaves the buffer.
//! Other participants decode batches through an [`ElementRegistry`] and
//! replay them with a [`Replay`], one animation after another.

mod animation;
mod element;
mod error;
mod log;
mod registry;
mod replay;

pub mod elements;
pub mod spec;

pub use animation::Animation;
pub use element::{ElementBody, ElementTag, SequenceElement};
pub use error::SequenceError;
pub use log::{ActionSequenceLog, Batch};
pub use registry::{DecodeFn, ElementEntry, ElementRegistry, LaunchFn};
pub use replay::{ElementPhase, Replay, ReplayCursor, ReplayStatus};
pub use spec::{ELEMENT_VERSION, ElementSpec, LOG_VERSION, LogSpec, SpecContext};
