//! The per-game action sequence log.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::replay::Replay;
use super::spec::{LOG_VERSION, LogSpec, SpecContext, check_version};
use super::{ElementRegistry, SequenceElement, SequenceError};
use crate::state::{Game, Tick};
use crate::undo::{Capturable, Finalize, Snapshot, UndoError, UndoManager};

#[derive(Debug, Default)]
struct LogState {
    pending: Vec<SequenceElement>,
    /// Position of the next batch.
    count: u64,
    /// Length of the committed, not yet acknowledged prefix of `pending`.
    validated_count: usize,
    /// `count` as it was before the outstanding commit.
    before_commit: Option<u64>,
}

/// Elements committed together under one position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    game: String,
    position: u64,
    elements: Vec<SequenceElement>,
}

impl Batch {
    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn elements(&self) -> &[SequenceElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Wire form of the batch; `count` carries the position.
    pub fn encode(&self, ctx: &SpecContext<'_>) -> Result<LogSpec, SequenceError> {
        Ok(LogSpec {
            version: LOG_VERSION,
            game: self.game.clone(),
            count: self.position,
            elements: self
                .elements
                .iter()
                .map(|element| element.to_specs(ctx))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Ordered, append-only buffer of the elements a game produced since the last
/// acknowledged commit.
///
/// The log takes part in undo: [`ActionSequenceLog::append_element`]
/// registers it before appending, so rolling a frame back also drops the
/// elements recorded in that frame.
pub struct ActionSequenceLog {
    game: String,
    state: RefCell<LogState>,
}

impl ActionSequenceLog {
    pub fn new(game: impl Into<String>) -> Self {
        Self::with_count(game, 0)
    }

    /// A log resuming after `count` batches already stored.
    pub fn with_count(game: impl Into<String>, count: u64) -> Self {
        Self {
            game: game.into(),
            state: RefCell::new(LogState {
                count,
                ..LogState::default()
            }),
        }
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn count(&self) -> u64 {
        self.state.borrow().count
    }

    pub fn validated_count(&self) -> usize {
        self.state.borrow().validated_count
    }

    pub fn len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().pending.is_empty()
    }

    pub fn pending(&self) -> Ref<'_, [SequenceElement]> {
        Ref::map(self.state.borrow(), |state| state.pending.as_slice())
    }

    /// Returns true while a commit awaits acknowledgement.
    pub fn has_outstanding_commit(&self) -> bool {
        self.state.borrow().before_commit.is_some()
    }

    /// Appends without registering with the undo manager.
    pub fn add_element(&self, element: SequenceElement) -> Result<(), SequenceError> {
        self.check_game(element.game())?;
        debug!(target: "game_core::sequence", game = %self.game, tag = %element.tag(), "element added");
        self.state.borrow_mut().pending.push(element);
        Ok(())
    }

    /// Registers the log with `undo`, then appends.
    pub fn append_element(
        self: &Rc<Self>,
        undo: &UndoManager,
        element: SequenceElement,
    ) -> Result<(), SequenceError> {
        self.check_game(element.game())?;
        undo.register(self);
        self.add_element(element)
    }

    /// Freezes the pending elements into a batch.
    ///
    /// The first commit after an acknowledgement takes position `count` and
    /// advances `count` by one. Committing again before acknowledgement keeps
    /// that position and covers every pending element, so a re-send extends
    /// the earlier batch.
    pub fn commit(&self) -> Batch {
        let mut state = self.state.borrow_mut();
        let position = if state.before_commit.is_some() {
            state.count.saturating_sub(1)
        } else if state.pending.is_empty() {
            state.count
        } else {
            let position = state.count;
            state.before_commit = Some(position);
            state.count = position + 1;
            position
        };

        state.validated_count = state.pending.len();
        for element in &mut state.pending {
            element.set_position(position);
        }
        debug!(
            target: "game_core::sequence",
            game = %self.game,
            position,
            elements = state.validated_count,
            "commit"
        );

        Batch {
            game: self.game.clone(),
            position,
            elements: state.pending.clone(),
        }
    }

    /// Drops the committed prefix once the store has accepted it.
    ///
    /// Returns the number of elements removed. Acknowledging without an
    /// outstanding commit removes nothing.
    pub fn acknowledge(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let validated = state.validated_count;
        let removed = validated.min(state.pending.len());
        if removed < validated {
            warn!(
                target: "game_core::sequence",
                game = %self.game,
                validated,
                pending = state.pending.len(),
                "pending shrank below the committed prefix"
            );
        }
        state.pending.drain(..removed);
        state.validated_count = 0;
        state.before_commit = None;
        debug!(target: "game_core::sequence", game = %self.game, removed, "acknowledged");
        removed
    }

    /// Takes back an unacknowledged commit after a failed send.
    ///
    /// Counters and element positions return to what they were before the
    /// commit; pending elements are kept.
    pub fn revert_commit(&self) {
        let mut state = self.state.borrow_mut();
        let Some(count) = state.before_commit.take() else {
            return;
        };
        state.count = count;
        state.validated_count = 0;
        for element in &mut state.pending {
            element.clear_position();
        }
        debug!(target: "game_core::sequence", game = %self.game, count, "commit reverted");
    }

    /// Records that the batch at `position` has been replayed locally.
    pub fn mark_replayed(&self, position: u64) {
        let mut state = self.state.borrow_mut();
        state.count = state.count.max(position + 1);
    }

    /// Wire form of the whole log.
    pub fn encode(&self, ctx: &SpecContext<'_>) -> Result<LogSpec, SequenceError> {
        let state = self.state.borrow();
        Ok(LogSpec {
            version: LOG_VERSION,
            game: self.game.clone(),
            count: state.count,
            elements: state
                .pending
                .iter()
                .map(|element| element.to_specs(ctx))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Builds a log from its wire form.
    ///
    /// Every element is decoded before the log exists; one bad element rejects
    /// the whole spec.
    pub fn decode(
        spec: &LogSpec,
        ctx: &SpecContext<'_>,
        registry: &ElementRegistry,
    ) -> Result<Self, SequenceError> {
        check_version("log", spec.version, LOG_VERSION)?;
        if spec.game != ctx.game().name() {
            return Err(SequenceError::ForeignElement {
                expected: ctx.game().name().to_string(),
                found: spec.game.clone(),
            });
        }

        let pending = spec
            .elements
            .iter()
            .map(|element| {
                let mut element = registry.decode(element, ctx)?;
                element.set_position(spec.count);
                Ok(element)
            })
            .collect::<Result<Vec<_>, SequenceError>>()?;

        Ok(Self {
            game: spec.game.clone(),
            state: RefCell::new(LogState {
                pending,
                count: spec.count,
                ..LogState::default()
            }),
        })
    }

    /// Applies every pending element instantly, without animation.
    ///
    /// Used when a whole game is reloaded. Elements are tried on a copy of
    /// `game` first, so a failure leaves `game` untouched.
    pub fn reload(&self, game: &Game, registry: &ElementRegistry) -> Result<usize, SequenceError> {
        self.check_game(game.name())?;
        let state = self.state.borrow();

        let scratch = Game::from_view(&game.view())?;
        for element in &state.pending {
            registry.launch(element, &scratch)?;
        }
        for element in &state.pending {
            registry.launch(element, game)?;
        }
        debug!(target: "game_core::sequence", game = %self.game, elements = state.pending.len(), "reloaded");
        Ok(state.pending.len())
    }

    /// Starts a replay of the pending elements from `start_tick`.
    ///
    /// Fails without touching `game` if any element cannot be applied.
    pub fn replay(
        &self,
        game: &Game,
        start_tick: Tick,
        on_complete: impl FnOnce(Tick) + 'static,
    ) -> Result<Replay, SequenceError> {
        self.check_game(game.name())?;
        let pending = self.state.borrow().pending.clone();
        Replay::rehearse(game, &pending)?;
        Ok(Replay::new(
            self.game.clone(),
            pending,
            start_tick,
            Some(Box::new(on_complete)),
        ))
    }

    fn check_game(&self, game: &str) -> Result<(), SequenceError> {
        if game == self.game {
            Ok(())
        } else {
            Err(SequenceError::ForeignElement {
                expected: self.game.clone(),
                found: game.to_string(),
            })
        }
    }
}

impl Capturable for ActionSequenceLog {
    fn label(&self) -> String {
        format!("sequence_log:{}", self.game)
    }

    fn capture(&self) -> Snapshot {
        Snapshot::new(self.state.borrow().pending.clone())
    }

    fn restore(&self, snapshot: &Snapshot) -> Result<Option<Finalize>, UndoError> {
        let pending = snapshot.expect::<Vec<SequenceElement>>(&self.label())?;
        self.state.borrow_mut().pending = pending.clone();
        Ok(None)
    }
}

impl fmt::Debug for ActionSequenceLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ActionSequenceLog")
            .field("game", &self.game)
            .field("pending", &state.pending.len())
            .field("count", &state.count)
            .field("validated_count", &state.validated_count)
            .finish()
    }
}
