//! Spectator loop: pulls batches committed by other participants and replays
//! them onto the local game in position order.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use game_core::{ActionSequenceLog, ElementRegistry, Game, Tick};

use crate::driver::ReplayDriver;
use crate::sync::{Result, Synchronizer};

pub struct Spectator {
    sync: Synchronizer,
    registry: ElementRegistry,
    driver: ReplayDriver,
    poll_interval: Duration,
    clock: Rc<Cell<Tick>>,
}

impl Spectator {
    pub fn new(
        sync: Synchronizer,
        registry: ElementRegistry,
        driver: ReplayDriver,
        poll_interval: Duration,
    ) -> Self {
        Self {
            sync,
            registry,
            driver,
            poll_interval,
            clock: Rc::new(Cell::new(0)),
        }
    }

    /// Tick at which the last replayed animation finished.
    pub fn clock(&self) -> Tick {
        self.clock.get()
    }

    /// Replays every batch stored at or after `log.count()`.
    ///
    /// Batches play one after another; the next starts when the previous
    /// one completes. Each replayed batch advances `log` past its position.
    /// Returns the number of batches replayed.
    pub async fn poll_once(&self, game: &Game, log: &ActionSequenceLog) -> Result<usize> {
        let batches = self.sync.load(game, log, &self.registry).await?;
        for batch in &batches {
            let clock = Rc::clone(&self.clock);
            let mut replay = batch.replay(game, self.clock.get(), move |end| clock.set(end))?;
            self.driver.run(game, &mut replay, self.clock.get()).await?;
            log.mark_replayed(batch.count());
            debug!(
                target: "runtime::spectator",
                game = %log.game(),
                position = batch.count(),
                elements = batch.len(),
                tick = self.clock.get(),
                "batch replayed"
            );
        }
        Ok(batches.len())
    }

    /// Polls until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Retryable transport failures are logged and polled again; anything
    /// else ends the loop with the error.
    pub async fn run(
        &self,
        game: &Game,
        log: &ActionSequenceLog,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(target: "runtime::spectator", game = %log.game(), "spectator started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.poll_once(game, log).await {
                        Ok(_) => {}
                        Err(err) if err.is_retryable() => {
                            warn!(target: "runtime::spectator", %err, "poll failed, retrying");
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        info!(target: "runtime::spectator", game = %log.game(), count = log.count(), "spectator stopped");
        Ok(())
    }
}
