//! Transport contract used by the synchronizer and spectators.

use async_trait::async_trait;

use game_core::LogSpec;

use super::Result;

/// Store of committed batches, keyed by game and position.
///
/// A batch travels as a [`LogSpec`] whose `count` is the batch position.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Stores one batch.
    async fn send_batch(&self, batch: &LogSpec) -> Result<()>;

    /// Returns every stored batch of `game` with position `>= count`, in any order.
    async fn fetch_batches_since(&self, game: &str, count: u64) -> Result<Vec<LogSpec>>;
}
