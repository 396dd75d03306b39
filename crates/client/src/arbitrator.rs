//! Combat results table used by the client.

use game_core::sequence::elements::AttackElement;
use game_core::{Arbitrator, CombatOutcome, Game, Hex, UnitId};

use crate::hexmap;

/// Strength-differential table with one d6.
///
/// The column is `die + advantage`, where the advantage is attacking steps
/// minus defending steps, clamped to `-3..=3`:
///
/// | column | result                                        |
/// |--------|-----------------------------------------------|
/// | <= 2   | attacker loses 1                              |
/// | 3-4    | both lose 1                                   |
/// | 5-6    | defender loses 1 and retreats                 |
/// | >= 7   | defender loses 2, retreats, attacker advances |
#[derive(Clone, Copy, Debug, Default)]
pub struct OddsTable;

impl OddsTable {
    const MAX_SHIFT: i32 = 3;

    fn strength(game: &Game, units: &[UnitId]) -> i32 {
        units
            .iter()
            .filter_map(|id| game.unit(*id))
            .map(|unit| i32::from(unit.steps()))
            .sum()
    }

    /// Free hex next to the defender, away from the leading attacker.
    fn retreat_hex(game: &Game, attack: &AttackElement) -> Option<Hex> {
        let defender = game.unit(attack.defender)?.hex()?;
        let lead = attack
            .attackers
            .first()
            .and_then(|id| game.unit(*id))
            .and_then(|unit| unit.hex())?;
        hexmap::step_away(defender, lead, |hex| game.unit_at(hex).is_none())
    }
}

impl Arbitrator for OddsTable {
    fn advantage(&self, game: &Game, attackers: &[UnitId], defender: UnitId) -> i32 {
        let diff = Self::strength(game, attackers) - Self::strength(game, &[defender]);
        diff.clamp(-Self::MAX_SHIFT, Self::MAX_SHIFT)
    }

    fn resolve(&self, game: &Game, attack: &AttackElement) -> CombatOutcome {
        let die = attack.dice.first().copied().map_or(1, i32::from);
        match die + attack.advantage {
            i32::MIN..=2 => CombatOutcome {
                attacker_losses: 1,
                ..CombatOutcome::default()
            },
            3..=4 => CombatOutcome {
                attacker_losses: 1,
                defender_losses: 1,
                ..CombatOutcome::default()
            },
            5..=6 => CombatOutcome {
                defender_losses: 1,
                retreat_to: Self::retreat_hex(game, attack),
                ..CombatOutcome::default()
            },
            _ => CombatOutcome {
                defender_losses: 2,
                retreat_to: Self::retreat_hex(game, attack),
                advance: true,
                ..CombatOutcome::default()
            },
        }
    }
}
