//! Unit displacement: plain moves, combat retreats and advances after combat.

use serde::{Deserialize, Serialize};

use crate::sequence::spec::{SpecContext, from_content, to_content};
use crate::sequence::{ElementBody, ElementTag, SequenceError};
use crate::state::{Game, Hex, UnitId};

/// A unit leaving `from` for `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMove {
    pub unit: UnitId,
    pub from: Hex,
    pub to: Hex,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Content {
    unit: String,
    from: Hex,
    to: Hex,
}

impl UnitMove {
    pub fn new(unit: UnitId, from: Hex, to: Hex) -> Self {
        Self { unit, from, to }
    }

    pub(crate) fn encode(
        &self,
        tag: ElementTag,
        ctx: &SpecContext<'_>,
    ) -> Result<serde_json::Value, SequenceError> {
        to_content(
            tag,
            &Content {
                unit: ctx.unit_ref(self.unit)?,
                from: self.from,
                to: self.to,
            },
        )
    }

    fn decode(
        tag: ElementTag,
        content: &serde_json::Value,
        ctx: &SpecContext<'_>,
    ) -> Result<Self, SequenceError> {
        let content: Content = from_content(tag, content)?;
        Ok(Self {
            unit: ctx.resolve_unit(&content.unit)?,
            from: content.from,
            to: content.to,
        })
    }

    pub(crate) fn apply(&self, tag: ElementTag, game: &Game) -> Result<(), SequenceError> {
        let unit = game.require_unit(self.unit)?;
        let at = unit.hex();
        if at != Some(self.from) {
            return Err(SequenceError::Desync {
                tag,
                reason: format!(
                    "{} expected at {} but is at {}",
                    unit.name(),
                    self.from,
                    at.map_or_else(|| "no hex".to_string(), |hex| hex.to_string())
                ),
            });
        }
        game.move_unit(self.unit, self.to)?;
        Ok(())
    }
}

pub(crate) fn decode_move(
    content: &serde_json::Value,
    ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    UnitMove::decode(ElementTag::Move, content, ctx).map(ElementBody::Move)
}

pub(crate) fn decode_retreat(
    content: &serde_json::Value,
    ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    UnitMove::decode(ElementTag::Retreat, content, ctx).map(ElementBody::Retreat)
}

pub(crate) fn decode_advance(
    content: &serde_json::Value,
    ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    UnitMove::decode(ElementTag::Advance, content, ctx).map(ElementBody::Advance)
}
