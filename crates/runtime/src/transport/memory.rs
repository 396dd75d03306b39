//! In-memory transport for tests and hot-seat play.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use game_core::LogSpec;

use super::{Result, Transport, TransportError, accept};

type Store = HashMap<String, BTreeMap<u64, LogSpec>>;

/// Batches held in process memory.
///
/// Clones share the same store, so a committer and a spectator can each hold
/// their own handle.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    batches: Arc<RwLock<Store>>,
    offline: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with [`TransportError::Unavailable`] until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of batches stored for `game`.
    pub fn batch_count(&self, game: &str) -> Result<usize> {
        let batches = self
            .batches
            .read()
            .map_err(|_| TransportError::LockPoisoned)?;
        Ok(batches.get(game).map_or(0, BTreeMap::len))
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(TransportError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_batch(&self, batch: &LogSpec) -> Result<()> {
        self.check_online()?;
        let mut batches = self
            .batches
            .write()
            .map_err(|_| TransportError::LockPoisoned)?;
        let game = batches.entry(batch.game.clone()).or_default();
        if accept(game.get(&batch.count), batch)? {
            game.insert(batch.count, batch.clone());
            debug!(
                target: "runtime::transport",
                game = %batch.game,
                position = batch.count,
                elements = batch.len(),
                "batch stored"
            );
        }
        Ok(())
    }

    async fn fetch_batches_since(&self, game: &str, count: u64) -> Result<Vec<LogSpec>> {
        self.check_online()?;
        let batches = self
            .batches
            .read()
            .map_err(|_| TransportError::LockPoisoned)?;
        Ok(batches
            .get(game)
            .map(|stored| stored.range(count..).map(|(_, batch)| batch.clone()).collect())
            .unwrap_or_default())
    }
}
