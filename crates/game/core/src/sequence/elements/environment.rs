//! Weather rolls and fire spread.

use serde::{Deserialize, Serialize};

use super::combat::check_dice;
use crate::sequence::spec::{SpecContext, from_content, to_content};
use crate::sequence::{ElementBody, ElementTag, SequenceError};
use crate::state::{Game, Hex, Weather};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherElement {
    pub weather: Weather,
    pub dice: Vec<u8>,
}

impl WeatherElement {
    pub(crate) fn encode(&self) -> Result<serde_json::Value, SequenceError> {
        to_content(ElementTag::Weather, self)
    }

    pub(crate) fn apply(&self, game: &Game) -> Result<(), SequenceError> {
        game.set_weather(self.weather);
        Ok(())
    }
}

pub(crate) fn decode_weather(
    content: &serde_json::Value,
    _ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    let element: WeatherElement = from_content(ElementTag::Weather, content)?;
    check_dice(ElementTag::Weather, &element.dice)?;
    Ok(ElementBody::Weather(element))
}

/// Hexes catching fire and burning out during one fire phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FireElement {
    #[serde(default)]
    pub ignited: Vec<Hex>,
    #[serde(default)]
    pub extinguished: Vec<Hex>,
}

impl FireElement {
    pub fn is_empty(&self) -> bool {
        self.ignited.is_empty() && self.extinguished.is_empty()
    }

    pub(crate) fn encode(&self) -> Result<serde_json::Value, SequenceError> {
        to_content(ElementTag::Fire, self)
    }

    pub(crate) fn apply(&self, game: &Game) -> Result<(), SequenceError> {
        game.update_fires(&self.ignited, &self.extinguished);
        Ok(())
    }
}

pub(crate) fn decode_fire(
    content: &serde_json::Value,
    _ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    from_content(ElementTag::Fire, content).map(ElementBody::Fire)
}
