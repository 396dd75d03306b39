use serde::{Deserialize, Serialize};

use crate::sequence::elements::{
    AttackElement, FireElement, LossesElement, TurnElement, UnitMove, WeatherElement,
};
use crate::sequence::spec::{ELEMENT_VERSION, ElementSpec, SpecContext};
use crate::sequence::{Animation, ElementRegistry, SequenceError};
use crate::state::{Game, Tick};

/// Wire tag of an element kind.
#[derive(
    Clone,
    Copy,
    Debug,
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
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ElementTag {
    Move,
    Attack,
    Losses,
    Retreat,
    Advance,
    Weather,
    Fire,
    Turn,
}

impl ElementTag {
    /// Animation length in ticks. Replay advances its cursor by this much.
    pub const fn delay(self) -> Tick {
        match self {
            Self::Move | Self::Losses | Self::Retreat | Self::Advance | Self::Fire => 500,
            Self::Attack | Self::Weather => 1500,
            Self::Turn => 0,
        }
    }
}

/// Kind-specific payload of a [`SequenceElement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementBody {
    Move(UnitMove),
    Attack(AttackElement),
    Losses(LossesElement),
    Retreat(UnitMove),
    Advance(UnitMove),
    Weather(WeatherElement),
    Fire(FireElement),
    Turn(TurnElement),
}

impl ElementBody {
    pub fn tag(&self) -> ElementTag {
        match self {
            Self::Move(_) => ElementTag::Move,
            Self::Attack(_) => ElementTag::Attack,
            Self::Losses(_) => ElementTag::Losses,
            Self::Retreat(_) => ElementTag::Retreat,
            Self::Advance(_) => ElementTag::Advance,
            Self::Weather(_) => ElementTag::Weather,
            Self::Fire(_) => ElementTag::Fire,
            Self::Turn(_) => ElementTag::Turn,
        }
    }

    fn encode(&self, ctx: &SpecContext<'_>) -> Result<serde_json::Value, SequenceError> {
        let tag = self.tag();
        match self {
            Self::Move(body) | Self::Retreat(body) | Self::Advance(body) => body.encode(tag, ctx),
            Self::Attack(body) => body.encode(ctx),
            Self::Losses(body) => body.encode(ctx),
            Self::Weather(body) => body.encode(),
            Self::Fire(body) => body.encode(),
            Self::Turn(body) => body.encode(),
        }
    }

    /// Mutates `game` the way the recorded action did.
    pub(crate) fn apply(&self, game: &Game) -> Result<(), SequenceError> {
        let tag = self.tag();
        match self {
            Self::Move(body) | Self::Retreat(body) | Self::Advance(body) => body.apply(tag, game),
            Self::Attack(body) => body.apply(game),
            Self::Losses(body) => body.apply(game),
            Self::Weather(body) => body.apply(game),
            Self::Fire(body) => body.apply(game),
            Self::Turn(body) => body.apply(game),
        }
    }
}

/// One recorded step of play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceElement {
    game: String,
    position: Option<u64>,
    body: ElementBody,
}

impl SequenceElement {
    pub fn new(game: impl Into<String>, body: ElementBody) -> Self {
        Self {
            game: game.into(),
            position: None,
            body,
        }
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    /// Batch position assigned at commit, `None` while pending.
    pub fn position(&self) -> Option<u64> {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: u64) {
        self.position = Some(position);
    }

    pub(crate) fn clear_position(&mut self) {
        self.position = None;
    }

    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    pub fn tag(&self) -> ElementTag {
        self.body.tag()
    }

    pub fn delay(&self) -> Tick {
        self.tag().delay()
    }

    /// Structural equality over everything replay depends on.
    ///
    /// The batch position is bookkeeping and does not take part.
    pub fn equals_to(&self, other: &SequenceElement) -> bool {
        self.game == other.game && self.body == other.body
    }

    pub fn to_specs(&self, ctx: &SpecContext<'_>) -> Result<ElementSpec, SequenceError> {
        Ok(ElementSpec {
            version: ELEMENT_VERSION,
            kind: self.tag().to_string(),
            content: self.body.encode(ctx)?,
        })
    }

    pub fn from_specs(
        spec: &ElementSpec,
        ctx: &SpecContext<'_>,
        registry: &ElementRegistry,
    ) -> Result<Self, SequenceError> {
        registry.decode(spec, ctx)
    }

    /// Applies the element and returns the animation that presents it.
    pub fn apply(&self, game: &Game, tick: Tick) -> Result<Animation, SequenceError> {
        self.body.apply(game)?;
        Ok(Animation::new(self.tag(), tick, self.delay()))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::state::{Hex, Side, UnitId, Weather};

    #[test]
    fn tags_use_snake_case_wire_strings() {
        let wire: Vec<String> = ElementTag::iter().map(|tag| tag.to_string()).collect();
        assert_eq!(
            wire,
            ["move", "attack", "losses", "retreat", "advance", "weather", "fire", "turn"]
        );
        assert_eq!(ElementTag::from_str("retreat").unwrap(), ElementTag::Retreat);
        assert!(ElementTag::from_str("airstrike").is_err());
    }

    #[test]
    fn unit_references_resolve_to_the_same_unit() {
        use crate::sequence::ElementRegistry;
        use crate::sequence::elements::UnitMove;
        use crate::state::{GameStateError, Unit};

        let mut game = crate::testing::skirmish();
        // A second "5th Rifles" would make the wire name ambiguous.
        let err = game
            .add_unit(Unit::new(UnitId(9), "5th Rifles", Side::Allied, Hex::new(4, 4), 3))
            .unwrap_err();
        assert!(matches!(err, GameStateError::DuplicateName { holder: UnitId(3), .. }));

        let ctx = SpecContext::new(&game);
        let registry = ElementRegistry::standard();
        for unit in [UnitId(1), UnitId(3)] {
            let element = SequenceElement::new(
                "skirmish",
                ElementBody::Move(UnitMove::new(unit, Hex::new(0, 0), Hex::new(0, 1))),
            );
            let decoded =
                SequenceElement::from_specs(&element.to_specs(&ctx).unwrap(), &ctx, &registry)
                    .unwrap();
            assert!(decoded.equals_to(&element));
        }
    }

    #[test]
    fn equality_ignores_position() {
        let body = ElementBody::Turn(TurnElement {
            turn: 2,
            side: Side::Axis,
        });
        let a = SequenceElement::new("g", body.clone());
        let mut b = SequenceElement::new("g", body);
        b.set_position(7);
        assert!(a.equals_to(&b));

        let c = SequenceElement::new(
            "g",
            ElementBody::Weather(WeatherElement {
                weather: Weather::Rain,
                dice: vec![4],
            }),
        );
        assert!(!a.equals_to(&c));
        assert!(!a.equals_to(&SequenceElement::new("other", a.body().clone())));
    }

    #[test]
    fn retreat_and_move_share_content_but_not_tag() {
        let step = UnitMove::new(UnitId(1), Hex::new(0, 0), Hex::new(0, 1));
        let retreat = SequenceElement::new("g", ElementBody::Retreat(step.clone()));
        let advance = SequenceElement::new("g", ElementBody::Move(step));
        assert!(!retreat.equals_to(&advance));
        assert_eq!(retreat.delay(), 500);
    }
}
