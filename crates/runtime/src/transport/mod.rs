//! Transport layer moving committed batches between participants.
//!
//! The runtime only needs two calls from a store: push one batch and pull
//! every batch from a position on. Implementations:
//! - [`MemoryTransport`] keeps batches in process memory (tests, hot-seat play)
//! - [`FileTransport`] writes one JSON file per batch under a data directory
//!
//! Both detect two committers writing different batches at one position and
//! reject the second write with [`TransportError::Conflict`]. Re-sending an
//! identical batch, or one that extends the stored batch, is accepted.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{Result, TransportError};
pub use file::FileTransport;
pub use memory::MemoryTransport;
pub use traits::Transport;

use game_core::LogSpec;

/// Decides whether `incoming` may replace what is stored at its position.
///
/// Returns `Ok(true)` when the store changes.
pub(crate) fn accept(existing: Option<&LogSpec>, incoming: &LogSpec) -> Result<bool> {
    match existing {
        None => Ok(true),
        Some(stored) if stored == incoming => Ok(false),
        Some(stored) if stored.is_prefix_of(incoming) => Ok(true),
        Some(_) => Err(TransportError::Conflict {
            game: incoming.game.clone(),
            position: incoming.count,
        }),
    }
}
