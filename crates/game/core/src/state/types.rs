//! Plain value types shared by the game model and the wire format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical replay time. Element delays and animation windows are measured in ticks.
pub type Tick = u64;

/// Offset coordinate of a map hex.
///
/// Neighbourhood and distance math lives with the map renderer; the sequencing
/// core only stores and compares coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Hex {
    pub col: i32,
    pub row: i32,
}

impl Hex {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Stable identifier of a unit within one game.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two opposing camps of a game.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Allied,
    Axis,
}

impl Side {
    /// Returns the opposing side.
    pub const fn opponent(self) -> Self {
        match self {
            Side::Allied => Side::Axis,
            Side::Axis => Side::Allied,
        }
    }
}

/// Weather in effect for the current turn.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Storm,
    Snow,
}

impl Weather {
    /// Maps a single d6 roll to the weather table.
    ///
    /// 1-3 clear, 4 rain, 5 storm, 6 snow. Out-of-range rolls are clamped.
    pub const fn from_roll(roll: u8) -> Self {
        match roll {
            0..=3 => Weather::Clear,
            4 => Weather::Rain,
            5 => Weather::Storm,
            _ => Weather::Snow,
        }
    }

    /// Whether fires burning on the map may spread under this weather.
    pub const fn lets_fire_spread(self) -> bool {
        matches!(self, Weather::Clear)
    }
}
