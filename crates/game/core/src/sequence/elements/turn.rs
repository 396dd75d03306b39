use serde::{Deserialize, Serialize};

use crate::sequence::spec::{SpecContext, from_content, to_content};
use crate::sequence::{ElementBody, ElementTag, SequenceError};
use crate::state::{Game, Side};

/// Hand-over of play to `side` at the start of `turn`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurnElement {
    pub turn: u32,
    pub side: Side,
}

impl TurnElement {
    pub(crate) fn encode(&self) -> Result<serde_json::Value, SequenceError> {
        to_content(ElementTag::Turn, self)
    }

    pub(crate) fn apply(&self, game: &Game) -> Result<(), SequenceError> {
        game.set_turn(self.turn, self.side);
        Ok(())
    }
}

pub(crate) fn decode_turn(
    content: &serde_json::Value,
    _ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    let element: TurnElement = from_content(ElementTag::Turn, content)?;
    if element.turn == 0 {
        return Err(SequenceError::MalformedContent {
            tag: ElementTag::Turn,
            reason: "turns are numbered from 1".into(),
        });
    }
    Ok(ElementBody::Turn(element))
}
