//! Map-wide state: weather, fires and the turn track.

use std::cell::{Ref, RefCell};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::state::{Hex, Side, Weather};
use crate::undo::{Capturable, Finalize, Snapshot, UndoError};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub weather: Weather,
    /// Hexes currently on fire.
    pub fires: BTreeSet<Hex>,
    /// Current turn number, starting at 1.
    pub turn: u32,
    /// Side whose turn it is.
    pub active_side: Side,
}

/// Shared, undoable board state.
#[derive(Debug, Default)]
pub struct Board {
    state: RefCell<BoardState>,
}

impl Board {
    pub fn new(state: BoardState) -> Self {
        Self {
            state: RefCell::new(state),
        }
    }

    pub fn state(&self) -> Ref<'_, BoardState> {
        self.state.borrow()
    }

    pub fn weather(&self) -> Weather {
        self.state.borrow().weather
    }

    pub fn turn(&self) -> u32 {
        self.state.borrow().turn
    }

    pub fn active_side(&self) -> Side {
        self.state.borrow().active_side
    }

    pub fn is_burning(&self, hex: Hex) -> bool {
        self.state.borrow().fires.contains(&hex)
    }

    pub(crate) fn set_weather(&self, weather: Weather) {
        self.state.borrow_mut().weather = weather;
    }

    pub(crate) fn update_fires(&self, ignited: &[Hex], extinguished: &[Hex]) {
        let mut state = self.state.borrow_mut();
        for hex in extinguished {
            state.fires.remove(hex);
        }
        state.fires.extend(ignited.iter().copied());
    }

    pub(crate) fn set_turn(&self, turn: u32, side: Side) {
        let mut state = self.state.borrow_mut();
        state.turn = turn;
        state.active_side = side;
    }
}

impl Capturable for Board {
    fn label(&self) -> String {
        "board".to_string()
    }

    fn capture(&self) -> Snapshot {
        Snapshot::new(self.state.borrow().clone())
    }

    fn restore(&self, snapshot: &Snapshot) -> Result<Option<Finalize>, UndoError> {
        let state = snapshot.expect::<BoardState>("board")?;
        *self.state.borrow_mut() = state.clone();
        Ok(None)
    }
}
