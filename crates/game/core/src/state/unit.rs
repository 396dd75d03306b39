//! Units on the hex map.

use std::cell::{Ref, RefCell};

use serde::{Deserialize, Serialize};

use crate::state::{Hex, Side, UnitId};
use crate::undo::{Capturable, Finalize, Snapshot, UndoError};

/// Mutable part of a unit. This is what the undo manager captures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    /// Current hex, `None` once the unit is eliminated.
    pub hex: Option<Hex>,
    /// Remaining strength steps.
    pub steps: u8,
}

/// A counter on the map.
///
/// Identity (`id`, `name`, `side`) is fixed for the whole game; position and
/// strength live behind a `RefCell` so the unit can be shared between the game,
/// the undo manager and replay without exclusive borrows.
#[derive(Debug)]
pub struct Unit {
    id: UnitId,
    name: String,
    side: Side,
    state: RefCell<UnitState>,
}

impl Unit {
    pub fn new(id: UnitId, name: impl Into<String>, side: Side, hex: Hex, steps: u8) -> Self {
        Self {
            id,
            name: name.into(),
            side,
            state: RefCell::new(UnitState {
                hex: Some(hex),
                steps,
            }),
        }
    }

    pub(crate) fn from_parts(id: UnitId, name: String, side: Side, state: UnitState) -> Self {
        Self {
            id,
            name,
            side,
            state: RefCell::new(state),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn hex(&self) -> Option<Hex> {
        self.state.borrow().hex
    }

    pub fn steps(&self) -> u8 {
        self.state.borrow().steps
    }

    pub fn is_eliminated(&self) -> bool {
        self.steps() == 0
    }

    pub fn state(&self) -> Ref<'_, UnitState> {
        self.state.borrow()
    }

    pub(crate) fn set_hex(&self, hex: Hex) {
        self.state.borrow_mut().hex = Some(hex);
    }

    /// Removes up to `steps` strength steps and returns the remaining strength.
    ///
    /// A unit reduced to zero steps leaves the map.
    pub(crate) fn take_losses(&self, steps: u8) -> u8 {
        let mut state = self.state.borrow_mut();
        state.steps = state.steps.saturating_sub(steps);
        if state.steps == 0 {
            state.hex = None;
        }
        state.steps
    }
}

impl Capturable for Unit {
    fn label(&self) -> String {
        format!("unit:{}", self.name)
    }

    fn capture(&self) -> Snapshot {
        Snapshot::new(self.state.borrow().clone())
    }

    fn restore(&self, snapshot: &Snapshot) -> Result<Option<Finalize>, UndoError> {
        let state = snapshot.expect::<UnitState>(&self.label())?;
        *self.state.borrow_mut() = state.clone();
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn losses_eliminate_at_zero_steps() {
        let unit = Unit::new(UnitId(1), "2nd Rifles", Side::Allied, Hex::new(1, 1), 3);
        assert_eq!(unit.take_losses(2), 1);
        assert_eq!(unit.hex(), Some(Hex::new(1, 1)));
        assert_eq!(unit.take_losses(4), 0);
        assert!(unit.is_eliminated());
        assert_eq!(unit.hex(), None);
    }

    #[test]
    fn restore_brings_back_captured_state() {
        let unit = Unit::new(UnitId(1), "2nd Rifles", Side::Allied, Hex::new(1, 1), 3);
        let snapshot = unit.capture();
        unit.set_hex(Hex::new(4, 4));
        unit.take_losses(1);

        assert!(unit.restore(&snapshot).unwrap().is_none());
        assert_eq!(unit.hex(), Some(Hex::new(1, 1)));
        assert_eq!(unit.steps(), 3);
    }

    #[test]
    fn foreign_snapshot_is_rejected() {
        let unit = Unit::new(UnitId(1), "2nd Rifles", Side::Allied, Hex::new(1, 1), 3);
        match unit.restore(&Snapshot::new(42u32)) {
            Err(err) => assert!(matches!(err, UndoError::SnapshotMismatch { .. })),
            Ok(_) => panic!("foreign snapshot was accepted"),
        }
    }
}
