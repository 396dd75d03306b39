//! Sequence synchronizer: pushes committed batches and pulls batches produced
//! by other participants.
//!
//! A save is `commit -> encode -> send`. On success the log is acknowledged
//! and the undo history cleared; on any failure the commit is reverted so the
//! log looks exactly as before the attempt and the caller may retry.
//!
//! Futures returned here borrow single-threaded game objects and therefore
//! run on a current-thread runtime or inside a `LocalSet`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use game_core::{ActionSequenceLog, ElementRegistry, Game, LogSpec, SpecContext, UndoManager};

use crate::error::SyncError;
use crate::transport::Transport;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Outcome of a successful [`Synchronizer::save`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveReport {
    /// Position the batch was stored under.
    pub position: u64,
    /// Elements acknowledged and removed from the log.
    pub elements: usize,
}

#[derive(Clone)]
pub struct Synchronizer {
    transport: Arc<dyn Transport>,
}

impl Synchronizer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Commits and sends the pending elements of `log`.
    ///
    /// Returns `Ok(None)` when there was nothing to send.
    pub async fn save(
        &self,
        game: &Game,
        log: &ActionSequenceLog,
        undo: &UndoManager,
    ) -> Result<Option<SaveReport>> {
        let batch = log.commit();
        if batch.is_empty() {
            debug!(target: "runtime::sync", game = %log.game(), "nothing to save");
            return Ok(None);
        }

        let spec = match batch.encode(&SpecContext::new(game)) {
            Ok(spec) => spec,
            Err(err) => {
                log.revert_commit();
                return Err(err.into());
            }
        };

        if let Err(err) = self.transport.send_batch(&spec).await {
            log.revert_commit();
            warn!(
                target: "runtime::sync",
                game = %log.game(),
                position = batch.position(),
                %err,
                retryable = err.is_retryable(),
                "save failed, commit reverted"
            );
            return Err(err.into());
        }

        let elements = log.acknowledge();
        undo.clear();
        info!(
            target: "runtime::sync",
            game = %log.game(),
            position = batch.position(),
            elements,
            "batch saved"
        );
        Ok(Some(SaveReport {
            position: batch.position(),
            elements,
        }))
    }

    /// Fetches and decodes every batch at or after `log.count()`, in position order.
    ///
    /// Decoding is all-or-nothing: one bad batch or element fails the whole
    /// load and nothing is returned.
    pub async fn load(
        &self,
        game: &Game,
        log: &ActionSequenceLog,
        registry: &ElementRegistry,
    ) -> Result<Vec<ActionSequenceLog>> {
        let since = log.count();
        let mut specs = self.transport.fetch_batches_since(log.game(), since).await?;
        specs.retain(|spec| spec.count >= since);
        specs.sort_by_key(|spec| spec.count);
        check_batches(log.game(), &specs)?;

        let ctx = SpecContext::new(game);
        let batches = specs
            .iter()
            .map(|spec| ActionSequenceLog::decode(spec, &ctx, registry))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if !batches.is_empty() {
            debug!(
                target: "runtime::sync",
                game = %log.game(),
                since,
                batches = batches.len(),
                "batches loaded"
            );
        }
        Ok(batches)
    }
}

fn check_batches(game: &str, specs: &[LogSpec]) -> Result<()> {
    if let Some(spec) = specs.iter().find(|spec| spec.game != game) {
        return Err(SyncError::WrongGame {
            expected: game.to_string(),
            found: spec.game.clone(),
        });
    }
    if let Some(pair) = specs.windows(2).find(|pair| pair[0].count == pair[1].count) {
        return Err(SyncError::DuplicateBatch {
            position: pair[0].count,
        });
    }
    Ok(())
}
