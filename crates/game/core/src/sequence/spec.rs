//! Transport-safe encoding of elements and logs.
//!
//! ```text
//! { version, game, count, elements: [ { version, type, content } ] }
//! ```
//!
//! `content` is whatever the element kind produces. Object references (units)
//! travel as names and are resolved through a [`SpecContext`] on decode.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::sequence::{ElementTag, SequenceError};
use crate::state::{Game, UnitId};

/// Version written into every [`LogSpec`].
pub const LOG_VERSION: u32 = 1;

/// Version written into every [`ElementSpec`].
pub const ELEMENT_VERSION: u32 = 1;

/// Encoded form of one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: serde_json::Value,
}

/// Encoded form of a log or a committed batch.
///
/// For a batch, `count` is the batch position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogSpec {
    pub version: u32,
    pub game: String,
    pub count: u64,
    pub elements: Vec<ElementSpec>,
}

impl LogSpec {
    pub fn to_json(&self) -> Result<String, SequenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SequenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns true if `self` holds the leading elements of `other` for the same position.
    ///
    /// A committer re-sending an unacknowledged batch produces such an extension.
    pub fn is_prefix_of(&self, other: &LogSpec) -> bool {
        self.game == other.game
            && self.count == other.count
            && self.elements.len() <= other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(mine, theirs)| mine == theirs)
    }
}

/// Per-encode/decode context.
///
/// Carries the target game and the table used to resolve unit references.
pub struct SpecContext<'a> {
    game: &'a Game,
    aliases: HashMap<String, UnitId>,
}

impl<'a> SpecContext<'a> {
    pub fn new(game: &'a Game) -> Self {
        let aliases = game
            .units()
            .map(|unit| (unit.name().to_string(), unit.id()))
            .collect();
        Self { game, aliases }
    }

    /// Adds an extra name under which a unit may be referenced on the wire.
    ///
    /// A unit's own name always wins over an alias of the same spelling.
    pub fn with_alias(mut self, name: impl Into<String>, id: UnitId) -> Self {
        self.aliases.entry(name.into()).or_insert(id);
        self
    }

    pub fn game(&self) -> &'a Game {
        self.game
    }

    /// Wire reference for a unit.
    pub fn unit_ref(&self, id: UnitId) -> Result<String, SequenceError> {
        self.game
            .unit(id)
            .map(|unit| unit.name().to_string())
            .ok_or(SequenceError::UnknownUnit(id))
    }

    /// Resolves a wire reference back to a unit of the target game.
    pub fn resolve_unit(&self, reference: &str) -> Result<UnitId, SequenceError> {
        self.aliases
            .get(reference)
            .copied()
            .filter(|id| self.game.unit(*id).is_some())
            .ok_or_else(|| SequenceError::UnknownReference(reference.to_string()))
    }
}

pub(crate) fn to_content<T: Serialize>(
    tag: ElementTag,
    content: &T,
) -> Result<serde_json::Value, SequenceError> {
    serde_json::to_value(content).map_err(|e| SequenceError::MalformedContent {
        tag,
        reason: e.to_string(),
    })
}

pub(crate) fn from_content<T: DeserializeOwned>(
    tag: ElementTag,
    content: &serde_json::Value,
) -> Result<T, SequenceError> {
    T::deserialize(content).map_err(|e| SequenceError::MalformedContent {
        tag,
        reason: e.to_string(),
    })
}

pub(crate) fn check_version(
    what: &'static str,
    found: u32,
    supported: u32,
) -> Result<(), SequenceError> {
    if found == supported {
        Ok(())
    } else {
        Err(SequenceError::UnsupportedVersion {
            what,
            found,
            supported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Hex, Side, Unit};

    #[test]
    fn wire_shape_uses_type_key() {
        let spec = LogSpec {
            version: LOG_VERSION,
            game: "g".into(),
            count: 3,
            elements: vec![ElementSpec {
                version: ELEMENT_VERSION,
                kind: "turn".into(),
                content: serde_json::json!({ "turn": 2, "side": "axis" }),
            }],
        };
        let value: serde_json::Value = serde_json::from_str(&spec.to_json().unwrap()).unwrap();
        assert_eq!(value["elements"][0]["type"], "turn");
        assert_eq!(value["count"], 3);
        assert_eq!(LogSpec::from_json(&spec.to_json().unwrap()).unwrap(), spec);
    }

    #[test]
    fn context_resolves_names_and_aliases() {
        let mut game = Game::new("g");
        game.add_unit(Unit::new(UnitId(4), "Recon", Side::Axis, Hex::new(0, 0), 1))
            .unwrap();
        game.add_unit(Unit::new(UnitId(5), "Pioneers", Side::Axis, Hex::new(1, 0), 2))
            .unwrap();
        let ctx = SpecContext::new(&game)
            .with_alias("R-4", UnitId(4))
            .with_alias("Pioneers", UnitId(4));

        assert_eq!(ctx.unit_ref(UnitId(4)).unwrap(), "Recon");
        assert_eq!(ctx.resolve_unit("Recon").unwrap(), UnitId(4));
        assert_eq!(ctx.resolve_unit("R-4").unwrap(), UnitId(4));
        assert_eq!(ctx.resolve_unit("Pioneers").unwrap(), UnitId(5));
        assert_eq!(
            ctx.resolve_unit("Ghost"),
            Err(SequenceError::UnknownReference("Ghost".into()))
        );
        assert_eq!(ctx.unit_ref(UnitId(9)), Err(SequenceError::UnknownUnit(UnitId(9))));
    }

    #[test]
    fn prefix_detection() {
        let element = |n: u32| ElementSpec {
            version: ELEMENT_VERSION,
            kind: "turn".into(),
            content: serde_json::json!({ "turn": n, "side": "allied" }),
        };
        let short = LogSpec {
            version: LOG_VERSION,
            game: "g".into(),
            count: 0,
            elements: vec![element(1)],
        };
        let long = LogSpec {
            elements: vec![element(1), element(2)],
            ..short.clone()
        };
        assert!(short.is_prefix_of(&long));
        assert!(!long.is_prefix_of(&short));
        let moved = LogSpec {
            count: 1,
            ..long.clone()
        };
        assert!(!short.is_prefix_of(&moved));
    }
}
