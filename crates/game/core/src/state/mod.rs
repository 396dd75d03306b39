//! Game model shared by live play and replay.
//!
//! A [`Game`] owns its units and board behind shared handles. Gameplay code
//! registers those handles with the undo manager before mutating them, and
//! sequence elements call the same mutation helpers when they are replayed, so
//! both paths produce identical state.
mod board;
mod error;
mod types;
mod unit;

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use board::{Board, BoardState};
pub use error::GameStateError;
pub use types::{Hex, Side, Tick, UnitId, Weather};
pub use unit::{Unit, UnitState};

/// Serializable description of a unit, used by [`GameView`] and scenarios.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    pub id: UnitId,
    pub name: String,
    pub side: Side,
    pub state: UnitState,
}

/// Canonical, order-stable view of a whole game.
///
/// Two participants that applied the same history have equal views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub name: String,
    pub units: Vec<UnitView>,
    pub board: BoardState,
}

/// One game instance: its units and board.
#[derive(Debug)]
pub struct Game {
    name: String,
    units: BTreeMap<UnitId, Rc<Unit>>,
    board: Rc<Board>,
}

impl Game {
    /// Creates an empty game on turn 1 with the allied side to move.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: BTreeMap::new(),
            board: Rc::new(Board::new(BoardState {
                turn: 1,
                ..BoardState::default()
            })),
        }
    }

    /// Rebuilds an independent game from a view.
    pub fn from_view(view: &GameView) -> Result<Self, GameStateError> {
        let mut game = Self {
            name: view.name.clone(),
            units: BTreeMap::new(),
            board: Rc::new(Board::new(view.board.clone())),
        };
        for unit in &view.units {
            game.add_unit(Unit::from_parts(
                unit.id,
                unit.name.clone(),
                unit.side,
                unit.state.clone(),
            ))?;
        }
        Ok(game)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn board(&self) -> &Rc<Board> {
        &self.board
    }

    pub fn add_unit(&mut self, unit: Unit) -> Result<Rc<Unit>, GameStateError> {
        let id = unit.id();
        if self.units.contains_key(&id) {
            return Err(GameStateError::DuplicateUnit(id));
        }
        if let Some(holder) = self.unit_by_name(unit.name()) {
            return Err(GameStateError::DuplicateName {
                name: unit.name().to_string(),
                holder: holder.id(),
            });
        }
        let unit = Rc::new(unit);
        self.units.insert(id, Rc::clone(&unit));
        Ok(unit)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Rc<Unit>> {
        self.units.get(&id)
    }

    pub fn require_unit(&self, id: UnitId) -> Result<&Rc<Unit>, GameStateError> {
        self.unit(id).ok_or(GameStateError::UnknownUnit(id))
    }

    pub fn unit_by_name(&self, name: &str) -> Option<&Rc<Unit>> {
        self.units.values().find(|unit| unit.name() == name)
    }

    /// Units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Rc<Unit>> {
        self.units.values()
    }

    /// The first unit standing on `hex`, if any.
    pub fn unit_at(&self, hex: Hex) -> Option<&Rc<Unit>> {
        self.units.values().find(|unit| unit.hex() == Some(hex))
    }

    /// Moves a unit to `to`.
    ///
    /// Friendly stacking is allowed; entering a hex held by the enemy is not.
    pub fn move_unit(&self, id: UnitId, to: Hex) -> Result<(), GameStateError> {
        let unit = self.check_move(id, to)?;
        unit.set_hex(to);
        Ok(())
    }

    /// Checks that [`Game::move_unit`] would succeed, without moving.
    pub fn check_move(&self, id: UnitId, to: Hex) -> Result<&Rc<Unit>, GameStateError> {
        let unit = self.require_on_map(id)?;
        if let Some(occupant) = self
            .units
            .values()
            .find(|other| other.hex() == Some(to) && other.side() != unit.side())
        {
            return Err(GameStateError::Occupied {
                hex: to,
                occupant: occupant.id(),
            });
        }
        Ok(unit)
    }

    /// Applies step losses and returns the unit's remaining strength.
    pub fn apply_losses(&self, id: UnitId, steps: u8) -> Result<u8, GameStateError> {
        Ok(self.require_on_map(id)?.take_losses(steps))
    }

    /// Looks up a unit that has not been eliminated.
    pub fn require_on_map(&self, id: UnitId) -> Result<&Rc<Unit>, GameStateError> {
        let unit = self.require_unit(id)?;
        if unit.is_eliminated() {
            return Err(GameStateError::Eliminated(id));
        }
        Ok(unit)
    }

    pub fn set_weather(&self, weather: Weather) {
        self.board.set_weather(weather);
    }

    pub fn update_fires(&self, ignited: &[Hex], extinguished: &[Hex]) {
        self.board.update_fires(ignited, extinguished);
    }

    pub fn set_turn(&self, turn: u32, side: Side) {
        self.board.set_turn(turn, side);
    }

    pub fn view(&self) -> GameView {
        GameView {
            name: self.name.clone(),
            units: self
                .units
                .values()
                .map(|unit| UnitView {
                    id: unit.id(),
                    name: unit.name().to_string(),
                    side: unit.side(),
                    state: unit.state().clone(),
                })
                .collect(),
            board: self.board.state().clone(),
        }
    }

    /// SHA-256 over the bincode encoding of [`Game::view`].
    pub fn state_root(&self) -> Result<[u8; 32], GameStateError> {
        let bytes = bincode::serialize(&self.view())
            .map_err(|e| GameStateError::Encoding(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skirmish() -> Game {
        let mut game = Game::new("skirmish");
        game.add_unit(Unit::new(UnitId(1), "1st Armored", Side::Allied, Hex::new(0, 0), 4))
            .unwrap();
        game.add_unit(Unit::new(UnitId(2), "7th Grenadier", Side::Axis, Hex::new(2, 0), 3))
            .unwrap();
        game
    }

    #[test]
    fn duplicate_units_are_rejected() {
        let mut game = skirmish();
        let err = game
            .add_unit(Unit::new(UnitId(1), "clone", Side::Axis, Hex::new(5, 5), 1))
            .unwrap_err();
        assert_eq!(err, GameStateError::DuplicateUnit(UnitId(1)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut game = skirmish();
        let err = game
            .add_unit(Unit::new(UnitId(3), "1st Armored", Side::Allied, Hex::new(5, 5), 2))
            .unwrap_err();
        assert_eq!(
            err,
            GameStateError::DuplicateName {
                name: "1st Armored".into(),
                holder: UnitId(1)
            }
        );
        assert!(game.unit(UnitId(3)).is_none());

        let mut view = skirmish().view();
        view.units[1].name = view.units[0].name.clone();
        assert!(matches!(
            Game::from_view(&view),
            Err(GameStateError::DuplicateName { .. })
        ));
    }

    #[test]
    fn cannot_enter_enemy_hex() {
        let game = skirmish();
        let err = game.move_unit(UnitId(1), Hex::new(2, 0)).unwrap_err();
        assert_eq!(
            err,
            GameStateError::Occupied {
                hex: Hex::new(2, 0),
                occupant: UnitId(2)
            }
        );
        game.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
        assert_eq!(game.unit_at(Hex::new(1, 0)).map(|u| u.id()), Some(UnitId(1)));
    }

    #[test]
    fn eliminated_units_cannot_act() {
        let game = skirmish();
        assert_eq!(game.apply_losses(UnitId(2), 5).unwrap(), 0);
        assert_eq!(
            game.move_unit(UnitId(2), Hex::new(3, 0)),
            Err(GameStateError::Eliminated(UnitId(2)))
        );
    }

    #[test]
    fn view_round_trip_preserves_state_root() {
        let game = skirmish();
        game.move_unit(UnitId(1), Hex::new(1, 1)).unwrap();
        game.update_fires(&[Hex::new(3, 3)], &[]);
        game.set_weather(Weather::Rain);

        let copy = Game::from_view(&game.view()).unwrap();
        assert_eq!(copy.state_root().unwrap(), game.state_root().unwrap());

        copy.set_turn(2, Side::Axis);
        assert_ne!(copy.state_root().unwrap(), game.state_root().unwrap());
        // Copies are independent.
        assert_eq!(game.board().turn(), 1);
    }

    #[test]
    fn state_root_is_printable() {
        let root = skirmish().state_root().unwrap();
        assert_eq!(hex::encode(root).len(), 64);
    }
}
