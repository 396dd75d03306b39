//! Scenario system for unit placement and game initialization.
//!
//! A scenario names the game and places every unit on the map. Sequence
//! elements refer to units by name, so names must be unique within a scenario.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use game_core::{BoardState, Game, GameView, Hex, Side, UnitId, UnitState, UnitView, Weather};

use crate::error::{Result, RuntimeError};

/// Placement of one unit at scenario start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    pub id: UnitId,
    pub name: String,
    pub side: Side,
    pub hex: Hex,
    pub steps: u8,
}

/// Board conditions at scenario start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSetup {
    pub weather: Weather,
    pub fires: Vec<Hex>,
    pub turn: u32,
    pub active_side: Side,
}

impl Default for BoardSetup {
    fn default() -> Self {
        Self {
            weather: Weather::Clear,
            fires: Vec::new(),
            turn: 1,
            active_side: Side::Allied,
        }
    }
}

/// Scenario configuration for game initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Game name; also the key batches are stored under.
    pub name: String,
    pub units: Vec<UnitPlacement>,
    #[serde(default)]
    pub board: BoardSetup,
}

impl Scenario {
    /// Built-in four-unit skirmish used when no scenario file is configured.
    pub fn skirmish(name: impl Into<String>) -> Self {
        let place = |id, name: &str, side, hex, steps| UnitPlacement {
            id: UnitId(id),
            name: name.to_string(),
            side,
            hex,
            steps,
        };
        Self {
            name: name.into(),
            units: vec![
                place(1, "1st Armored", Side::Allied, Hex::new(0, 0), 4),
                place(2, "7th Grenadier", Side::Axis, Hex::new(2, 0), 3),
                place(3, "5th Rifles", Side::Allied, Hex::new(1, 1), 3),
                place(4, "21st Panzer", Side::Axis, Hex::new(3, 1), 4),
            ],
            board: BoardSetup::default(),
        }
    }

    /// Parses a scenario from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        let scenario: Scenario = ron::from_str(text)
            .map_err(|e| RuntimeError::InvalidScenario(format!("failed to parse RON: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Loads a scenario from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RuntimeError::ScenarioIo {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_ron(&text)?;
        tracing::info!(
            target: "runtime::scenario",
            path = %path.display(),
            name = %scenario.name,
            units = scenario.units.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    /// Checks ids and names are unique, strengths positive and hexes unshared.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RuntimeError::InvalidScenario("empty game name".into()));
        }
        if self.board.turn == 0 {
            return Err(RuntimeError::InvalidScenario("turns start at 1".into()));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        let mut hexes = HashSet::new();
        for unit in &self.units {
            if !ids.insert(unit.id) {
                return Err(RuntimeError::InvalidScenario(format!(
                    "unit id {} used twice",
                    unit.id
                )));
            }
            if !names.insert(unit.name.as_str()) {
                return Err(RuntimeError::InvalidScenario(format!(
                    "unit name '{}' used twice",
                    unit.name
                )));
            }
            if unit.steps == 0 {
                return Err(RuntimeError::InvalidScenario(format!(
                    "unit '{}' starts without steps",
                    unit.name
                )));
            }
            if !hexes.insert(unit.hex) {
                return Err(RuntimeError::InvalidScenario(format!(
                    "hex {} holds more than one unit",
                    unit.hex
                )));
            }
        }
        Ok(())
    }

    /// Builds the initial game.
    pub fn build_game(&self) -> Result<Game> {
        self.validate()?;
        let view = GameView {
            name: self.name.clone(),
            units: self
                .units
                .iter()
                .map(|unit| UnitView {
                    id: unit.id,
                    name: unit.name.clone(),
                    side: unit.side,
                    state: UnitState {
                        hex: Some(unit.hex),
                        steps: unit.steps,
                    },
                })
                .collect(),
            board: BoardState {
                weather: self.board.weather,
                fires: self.board.fires.iter().copied().collect(),
                turn: self.board.turn,
                active_side: self.board.active_side,
            },
        };
        Ok(Game::from_view(&view)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"(
        name: "river-crossing",
        units: [
            (id: 1, name: "2nd Guards", side: allied, hex: (col: 0, row: 0), steps: 4),
            (id: 2, name: "9th Jaeger", side: axis, hex: (col: 3, row: 2), steps: 3),
        ],
        board: (weather: rain, fires: [(col: 1, row: 1)]),
    )"#;

    #[test]
    fn parses_ron_and_builds_game() {
        let scenario = Scenario::from_ron(SCENARIO).unwrap();
        assert_eq!(scenario.board.turn, 1);

        let game = scenario.build_game().unwrap();
        assert_eq!(game.name(), "river-crossing");
        assert_eq!(game.board().weather(), Weather::Rain);
        assert!(game.board().is_burning(Hex::new(1, 1)));
        let jaeger = game.unit_by_name("9th Jaeger").unwrap();
        assert_eq!(jaeger.hex(), Some(Hex::new(3, 2)));
        assert_eq!(jaeger.side(), Side::Axis);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut scenario = Scenario::skirmish("dup");
        scenario.units[1].name = scenario.units[0].name.clone();
        assert!(matches!(
            scenario.build_game(),
            Err(RuntimeError::InvalidScenario(_))
        ));
    }

    #[test]
    fn stacked_units_are_rejected() {
        let mut scenario = Scenario::skirmish("stack");
        scenario.units[1].hex = scenario.units[0].hex;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ron");
        match Scenario::load(&path) {
            Err(RuntimeError::ScenarioIo { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn builtin_skirmish_is_valid() {
        let game = Scenario::skirmish("skirmish").build_game().unwrap();
        assert_eq!(game.units().count(), 4);
    }
}
