//! Frame loop driving a [`Replay`] in wall-clock time.

use tokio::time::{MissedTickBehavior, interval};
use tracing::trace;

use game_core::{Game, Replay, ReplayStatus, SequenceError, Tick};

use crate::config::ReplayConfig;

/// Advances replays once per frame, `ticks_per_frame` game ticks at a time.
#[derive(Clone, Copy, Debug)]
pub struct ReplayDriver {
    config: ReplayConfig,
}

impl ReplayDriver {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Plays `replay` to the end, starting the clock at `start`.
    ///
    /// Returns the tick at which the last animation finished.
    pub async fn run(
        &self,
        game: &Game,
        replay: &mut Replay,
        start: Tick,
    ) -> Result<Tick, SequenceError> {
        let mut frames = interval(self.config.frame);
        frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut now = start;
        loop {
            frames.tick().await;
            if replay.advance(game, now)? == ReplayStatus::Complete {
                let end = replay.cursor().tick;
                trace!(target: "runtime::driver", start, end, "replay finished");
                return Ok(end);
            }
            now = now.saturating_add(self.config.ticks_per_frame);
        }
    }
}

impl Default for ReplayDriver {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}
