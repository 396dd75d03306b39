//! Attack declarations with their dice, and the resulting step losses.

use serde::{Deserialize, Serialize};

use crate::sequence::spec::{SpecContext, from_content, to_content};
use crate::sequence::{ElementBody, ElementTag, SequenceError};
use crate::state::{Game, UnitId};

/// An attack and the dice thrown for it.
///
/// Replaying an attack changes no state; the outcome follows as separate
/// `losses`, `retreat` and `advance` elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackElement {
    pub attackers: Vec<UnitId>,
    pub defender: UnitId,
    /// Column shift handed over by the arbitrator.
    pub advantage: i32,
    pub dice: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttackContent {
    attackers: Vec<String>,
    defender: String,
    advantage: i32,
    dice: Vec<u8>,
}

impl AttackElement {
    pub(crate) fn encode(&self, ctx: &SpecContext<'_>) -> Result<serde_json::Value, SequenceError> {
        let attackers = self
            .attackers
            .iter()
            .map(|id| ctx.unit_ref(*id))
            .collect::<Result<_, _>>()?;
        to_content(
            ElementTag::Attack,
            &AttackContent {
                attackers,
                defender: ctx.unit_ref(self.defender)?,
                advantage: self.advantage,
                dice: self.dice.clone(),
            },
        )
    }

    pub(crate) fn apply(&self, game: &Game) -> Result<(), SequenceError> {
        for id in self.attackers.iter().chain(std::iter::once(&self.defender)) {
            let unit = game.require_unit(*id)?;
            if unit.is_eliminated() {
                return Err(SequenceError::Desync {
                    tag: ElementTag::Attack,
                    reason: format!("{} takes part in an attack but is eliminated", unit.name()),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn decode_attack(
    content: &serde_json::Value,
    ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    let content: AttackContent = from_content(ElementTag::Attack, content)?;
    if content.attackers.is_empty() {
        return Err(SequenceError::MalformedContent {
            tag: ElementTag::Attack,
            reason: "attack without attackers".into(),
        });
    }
    check_dice(ElementTag::Attack, &content.dice)?;

    let attackers = content
        .attackers
        .iter()
        .map(|name| ctx.resolve_unit(name))
        .collect::<Result<_, _>>()?;
    Ok(ElementBody::Attack(AttackElement {
        attackers,
        defender: ctx.resolve_unit(&content.defender)?,
        advantage: content.advantage,
        dice: content.dice,
    }))
}

/// Strength steps removed from one unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossesElement {
    pub unit: UnitId,
    pub steps: u8,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LossesContent {
    unit: String,
    steps: u8,
}

impl LossesElement {
    pub(crate) fn encode(&self, ctx: &SpecContext<'_>) -> Result<serde_json::Value, SequenceError> {
        to_content(
            ElementTag::Losses,
            &LossesContent {
                unit: ctx.unit_ref(self.unit)?,
                steps: self.steps,
            },
        )
    }

    pub(crate) fn apply(&self, game: &Game) -> Result<(), SequenceError> {
        game.apply_losses(self.unit, self.steps)?;
        Ok(())
    }
}

pub(crate) fn decode_losses(
    content: &serde_json::Value,
    ctx: &SpecContext<'_>,
) -> Result<ElementBody, SequenceError> {
    let content: LossesContent = from_content(ElementTag::Losses, content)?;
    Ok(ElementBody::Losses(LossesElement {
        unit: ctx.resolve_unit(&content.unit)?,
        steps: content.steps,
    }))
}

/// Dice are six-sided.
pub(crate) fn check_dice(tag: ElementTag, dice: &[u8]) -> Result<(), SequenceError> {
    match dice.iter().find(|die| !(1..=6).contains(*die)) {
        Some(die) => Err(SequenceError::MalformedContent {
            tag,
            reason: format!("die value {die} out of range"),
        }),
        None => Ok(()),
    }
}
