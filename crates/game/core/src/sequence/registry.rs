//! Element registry mapping wire tags to decoders and reload launchers.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::{trace, warn};

use super::elements::{
    decode_advance, decode_attack, decode_fire, decode_losses, decode_move, decode_retreat,
    decode_turn, decode_weather,
};
use super::spec::{ELEMENT_VERSION, ElementSpec, SpecContext, check_version};
use super::{ElementBody, ElementTag, SequenceElement, SequenceError};
use crate::state::Game;

/// Turns wire content into an element body.
pub type DecodeFn = fn(&serde_json::Value, &SpecContext<'_>) -> Result<ElementBody, SequenceError>;

/// Applies an element instantly, without animation, during a full reload.
pub type LaunchFn = fn(&SequenceElement, &Game) -> Result<(), SequenceError>;

#[derive(Clone, Copy)]
pub struct ElementEntry {
    pub decode: DecodeFn,
    pub launch: Option<LaunchFn>,
}

/// Registry of known element kinds.
///
/// Built once at startup and then shared read-only. Wire tags are parsed into
/// [`ElementTag`] before lookup, so an unknown string and a known but
/// unregistered kind both surface as [`SequenceError::UnknownElementType`].
#[derive(Clone, Default)]
pub struct ElementRegistry {
    entries: HashMap<ElementTag, ElementEntry>,
}

impl ElementRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in element kind.
    ///
    /// `turn`, `weather` and `attack` get reload launchers; the rest reload
    /// through their regular apply.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(ElementTag::Move, decode_move)
            .register(ElementTag::Attack, decode_attack)
            .register(ElementTag::Losses, decode_losses)
            .register(ElementTag::Retreat, decode_retreat)
            .register(ElementTag::Advance, decode_advance)
            .register(ElementTag::Weather, decode_weather)
            .register(ElementTag::Fire, decode_fire)
            .register(ElementTag::Turn, decode_turn)
            .register_launcher(ElementTag::Turn, launch_turn)
            .register_launcher(ElementTag::Weather, launch_weather)
            .register_launcher(ElementTag::Attack, launch_attack);
        registry
    }

    /// Registers the decoder for `tag`. A later registration replaces an
    /// earlier one.
    pub fn register(&mut self, tag: ElementTag, decode: DecodeFn) -> &mut Self {
        match self.entries.get_mut(&tag) {
            Some(entry) => {
                warn!(target: "game_core::sequence", %tag, "element kind registered twice, last wins");
                entry.decode = decode;
            }
            None => {
                self.entries.insert(tag, ElementEntry { decode, launch: None });
            }
        }
        self
    }

    /// Registers the reload launcher for an already registered `tag`.
    pub fn register_launcher(&mut self, tag: ElementTag, launch: LaunchFn) -> &mut Self {
        match self.entries.get_mut(&tag) {
            Some(entry) => {
                if entry.launch.replace(launch).is_some() {
                    warn!(target: "game_core::sequence", %tag, "launcher registered twice, last wins");
                }
            }
            None => {
                warn!(target: "game_core::sequence", %tag, "launcher for unregistered element kind ignored");
            }
        }
        self
    }

    pub fn is_registered(&self, tag: ElementTag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Registered kinds, in tag order.
    pub fn tags(&self) -> Vec<ElementTag> {
        let mut tags: Vec<_> = self.entries.keys().copied().collect();
        tags.sort();
        tags
    }

    /// Looks up the entry for a wire tag.
    pub fn lookup(&self, tag: &str) -> Result<&ElementEntry, SequenceError> {
        ElementTag::from_str(tag)
            .ok()
            .and_then(|tag| self.entries.get(&tag))
            .ok_or_else(|| SequenceError::UnknownElementType(tag.to_string()))
    }

    /// Decodes one element for the game carried by `ctx`.
    pub fn decode(
        &self,
        spec: &ElementSpec,
        ctx: &SpecContext<'_>,
    ) -> Result<SequenceElement, SequenceError> {
        check_version("element", spec.version, ELEMENT_VERSION)?;
        let entry = self.lookup(&spec.kind)?;
        let body = (entry.decode)(&spec.content, ctx)?;
        if body.tag().as_ref() != spec.kind {
            return Err(SequenceError::MalformedContent {
                tag: body.tag(),
                reason: format!("decoder for '{}' produced a '{}'", spec.kind, body.tag()),
            });
        }
        trace!(target: "game_core::sequence", tag = %body.tag(), "decoded element");
        Ok(SequenceElement::new(ctx.game().name(), body))
    }

    /// Applies `element` immediately, through its launcher when one is registered.
    pub fn launch(&self, element: &SequenceElement, game: &Game) -> Result<(), SequenceError> {
        match self.entries.get(&element.tag()).and_then(|entry| entry.launch) {
            Some(launch) => launch(element, game),
            None => element.body().apply(game),
        }
    }
}

fn launch_turn(element: &SequenceElement, game: &Game) -> Result<(), SequenceError> {
    if let ElementBody::Turn(turn) = element.body() {
        // Out-of-order turns during reload are ignored; the latest turn wins.
        if turn.turn >= game.board().turn() {
            game.set_turn(turn.turn, turn.side);
        }
    }
    Ok(())
}

fn launch_weather(element: &SequenceElement, game: &Game) -> Result<(), SequenceError> {
    if let ElementBody::Weather(weather) = element.body() {
        game.set_weather(weather.weather);
    }
    Ok(())
}

/// Attacks only reveal dice; nothing to do without animation.
fn launch_attack(_element: &SequenceElement, _game: &Game) -> Result<(), SequenceError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::elements::TurnElement;
    use crate::state::Side;

    fn turn_spec(turn: u32) -> ElementSpec {
        ElementSpec {
            version: ELEMENT_VERSION,
            kind: "turn".into(),
            content: serde_json::json!({ "turn": turn, "side": "axis" }),
        }
    }

    #[test]
    fn standard_registry_knows_every_kind() {
        use strum::IntoEnumIterator;
        let registry = ElementRegistry::standard();
        for tag in ElementTag::iter() {
            assert!(registry.is_registered(tag), "{tag} missing");
        }
        assert!(registry.lookup("turn").unwrap().launch.is_some());
        assert!(registry.lookup("move").unwrap().launch.is_none());
    }

    #[test]
    fn unknown_and_unregistered_tags_fail_lookup() {
        let mut registry = ElementRegistry::new();
        registry.register(ElementTag::Turn, decode_turn);

        assert!(matches!(
            registry.lookup("airstrike"),
            Err(SequenceError::UnknownElementType(tag)) if tag == "airstrike"
        ));
        assert!(matches!(
            registry.lookup("move"),
            Err(SequenceError::UnknownElementType(tag)) if tag == "move"
        ));
        assert!(registry.lookup("turn").is_ok());
    }

    #[test]
    fn last_registration_wins() {
        fn always_turn_nine(
            _: &serde_json::Value,
            _: &SpecContext<'_>,
        ) -> Result<ElementBody, SequenceError> {
            Ok(ElementBody::Turn(TurnElement {
                turn: 9,
                side: Side::Allied,
            }))
        }

        let mut registry = ElementRegistry::new();
        registry
            .register(ElementTag::Turn, decode_turn)
            .register(ElementTag::Turn, always_turn_nine);

        let game = Game::new("g");
        let ctx = SpecContext::new(&game);
        let element = registry.decode(&turn_spec(2), &ctx).unwrap();
        assert_eq!(
            element.body(),
            &ElementBody::Turn(TurnElement {
                turn: 9,
                side: Side::Allied
            })
        );
        assert_eq!(element.game(), "g");
    }

    #[test]
    fn element_version_is_checked() {
        let registry = ElementRegistry::standard();
        let game = Game::new("g");
        let ctx = SpecContext::new(&game);
        let spec = ElementSpec {
            version: 2,
            ..turn_spec(2)
        };
        assert_eq!(
            registry.decode(&spec, &ctx).unwrap_err(),
            SequenceError::UnsupportedVersion {
                what: "element",
                found: 2,
                supported: ELEMENT_VERSION
            }
        );
    }

    #[test]
    fn launch_falls_back_to_apply() {
        use crate::sequence::elements::FireElement;
        use crate::state::Hex;

        let registry = ElementRegistry::standard();
        let game = Game::new("g");
        let fire = SequenceElement::new(
            "g",
            ElementBody::Fire(FireElement {
                ignited: vec![Hex::new(1, 1)],
                extinguished: vec![],
            }),
        );
        registry.launch(&fire, &game).unwrap();
        assert!(game.board().is_burning(Hex::new(1, 1)));

        let stale_turn = SequenceElement::new(
            "g",
            ElementBody::Turn(TurnElement {
                turn: 0,
                side: Side::Axis,
            }),
        );
        registry.launch(&stale_turn, &game).unwrap();
        assert_eq!(game.board().turn(), 1);
        assert_eq!(game.board().active_side(), Side::Allied);
    }
}
