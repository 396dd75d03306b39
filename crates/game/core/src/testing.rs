//! Shared fixtures for unit tests.

use crate::state::{Game, Hex, Side, Unit, UnitId};

/// Three units: two allied, one axis two hexes east of the first.
pub(crate) fn skirmish() -> Game {
    let mut game = Game::new("skirmish");
    for unit in [
        Unit::new(UnitId(1), "1st Armored", Side::Allied, Hex::new(0, 0), 4),
        Unit::new(UnitId(2), "7th Grenadier", Side::Axis, Hex::new(2, 0), 3),
        Unit::new(UnitId(3), "5th Rifles", Side::Allied, Hex::new(1, 1), 3),
    ] {
        game.add_unit(unit).expect("fixture units are unique");
    }
    game
}
