//! Built-in element kinds.
//!
//! Each kind owns its wire content, its decoder and the state change it makes
//! when replayed. Unit references are written as unit names.

mod combat;
mod environment;
mod movement;
mod turn;

pub use combat::{AttackElement, LossesElement};
pub use environment::{FireElement, WeatherElement};
pub use movement::UnitMove;
pub use turn::TurnElement;

pub(crate) use combat::{decode_attack, decode_losses};
pub(crate) use environment::{decode_fire, decode_weather};
pub(crate) use movement::{decode_advance, decode_move, decode_retreat};
pub(crate) use turn::decode_turn;
