//! Tick-driven replay of decoded elements.
//!
//! A [`Replay`] is an explicit state machine advanced by a frame driver:
//! every call to [`Replay::advance`] hands it the current tick. The next
//! element is applied only after the previous element's animation has
//! reported completion, and the replay's own completion callback fires once,
//! after the last animation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::sequence::{Animation, SequenceElement, SequenceError};
use crate::state::{Game, Tick};

/// Where a replay stands. Serializable so a driver can persist progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCursor {
    /// Index of the next element to apply.
    pub next: usize,
    /// Scheduled start tick of the next element.
    pub tick: Tick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayStatus {
    Running,
    Complete,
}

/// Lifecycle of one element inside a replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementPhase {
    Decoded,
    Applying,
    Applied,
}

pub struct Replay {
    game: String,
    elements: Vec<SequenceElement>,
    cursor: ReplayCursor,
    current: Option<Animation>,
    on_complete: Option<Box<dyn FnOnce(Tick)>>,
    complete: bool,
}

impl Replay {
    pub(crate) fn new(
        game: impl Into<String>,
        elements: Vec<SequenceElement>,
        start_tick: Tick,
        on_complete: Option<Box<dyn FnOnce(Tick)>>,
    ) -> Self {
        Self {
            game: game.into(),
            elements,
            cursor: ReplayCursor {
                next: 0,
                tick: start_tick,
            },
            current: None,
            on_complete,
            complete: false,
        }
    }

    /// Applies `elements` to a throwaway copy of `game`.
    ///
    /// Fails with the first element that cannot be applied, leaving `game`
    /// untouched.
    pub(crate) fn rehearse(game: &Game, elements: &[SequenceElement]) -> Result<(), SequenceError> {
        let scratch = Game::from_view(&game.view())?;
        for (index, element) in elements.iter().enumerate() {
            if element.game() != game.name() {
                return Err(SequenceError::ForeignElement {
                    expected: game.name().to_string(),
                    found: element.game().to_string(),
                });
            }
            element.body().apply(&scratch).inspect_err(|err| {
                debug!(target: "game_core::sequence", index, tag = %element.tag(), %err, "replay rejected");
            })?;
        }
        Ok(())
    }

    pub fn cursor(&self) -> ReplayCursor {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn elements(&self) -> &[SequenceElement] {
        &self.elements
    }

    /// The animation currently playing, if any.
    pub fn current_animation(&self) -> Option<&Animation> {
        self.current.as_ref()
    }

    pub fn phase(&self, index: usize) -> Option<ElementPhase> {
        if index >= self.elements.len() {
            return None;
        }
        let applying = self.current.is_some() && index + 1 == self.cursor.next;
        Some(if applying {
            ElementPhase::Applying
        } else if index < self.cursor.next {
            ElementPhase::Applied
        } else {
            ElementPhase::Decoded
        })
    }

    /// Advances the replay to tick `now`.
    ///
    /// Applies as many elements as have become due; zero-length animations
    /// chain within one call.
    pub fn advance(&mut self, game: &Game, now: Tick) -> Result<ReplayStatus, SequenceError> {
        if self.complete {
            return Ok(ReplayStatus::Complete);
        }
        if game.name() != self.game {
            return Err(SequenceError::ForeignElement {
                expected: self.game.clone(),
                found: game.name().to_string(),
            });
        }

        loop {
            if let Some(animation) = self.current.as_mut() {
                if !animation.advance(now) {
                    return Ok(ReplayStatus::Running);
                }
                self.current = None;
            }

            let Some(element) = self.elements.get(self.cursor.next) else {
                self.complete = true;
                debug!(
                    target: "game_core::sequence",
                    game = %self.game,
                    elements = self.elements.len(),
                    tick = self.cursor.tick,
                    "replay complete"
                );
                if let Some(on_complete) = self.on_complete.take() {
                    on_complete(self.cursor.tick);
                }
                return Ok(ReplayStatus::Complete);
            };

            if now < self.cursor.tick {
                return Ok(ReplayStatus::Running);
            }

            let animation = element.apply(game, self.cursor.tick)?;
            trace!(
                target: "game_core::sequence",
                index = self.cursor.next,
                tag = %element.tag(),
                start = self.cursor.tick,
                "applied element"
            );
            self.cursor.tick += element.delay();
            self.cursor.next += 1;
            self.current = Some(animation);
        }
    }
}

impl fmt::Debug for Replay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replay")
            .field("game", &self.game)
            .field("elements", &self.elements.len())
            .field("cursor", &self.cursor)
            .field("current", &self.current)
            .field("complete", &self.complete)
            .finish()
    }
}
