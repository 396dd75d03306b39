//! Combat as an explicit, resumable state machine.
//!
//! ```text
//! Rolling -> Revealing -> ApplyingLosses -> Retreating -> Advancing -> Done
//! ```
//!
//! Each call to [`CombatSequence::advance`] performs one step and records the
//! matching element: `attack` with the dice, then `losses`, `retreat` and
//! `advance` as the outcome requires. The whole combat lives in one undo
//! frame, so [`CombatSequence::cancel`] takes it back in one go. The sequence
//! is serializable and can be persisted between steps.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorSeverity, GameError};
use crate::sequence::elements::AttackElement;
use crate::sequence::{ElementBody, SequenceError};
use crate::session::Session;
use crate::state::{Game, Hex, UnitId};
use crate::undo::UndoError;

/// Resolves combat results. Odds tables and terrain effects live behind it.
pub trait Arbitrator {
    /// Column shift in favour of the attackers.
    fn advantage(&self, game: &Game, attackers: &[UnitId], defender: UnitId) -> i32;

    /// Number of dice thrown per attack.
    fn dice(&self) -> usize {
        1
    }

    fn resolve(&self, game: &Game, attack: &AttackElement) -> CombatOutcome;
}

/// What an attack costs both sides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    /// Steps lost by the leading attacker.
    pub attacker_losses: u8,
    pub defender_losses: u8,
    /// Where a surviving defender falls back to.
    pub retreat_to: Option<Hex>,
    /// Whether the leading attacker moves into a vacated defender hex.
    pub advance: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStep {
    Rolling,
    Revealing {
        attack: AttackElement,
    },
    ApplyingLosses {
        outcome: CombatOutcome,
    },
    Retreating {
        outcome: CombatOutcome,
        /// Defender hex before the attack.
        defender_hex: Hex,
    },
    Advancing {
        vacated: Hex,
    },
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    #[error("an attack needs at least one attacker")]
    NoAttackers,

    #[error("{attacker} and {defender} fight on the same side")]
    SameSide { attacker: UnitId, defender: UnitId },

    #[error("unit {0} is not on the map")]
    OffMap(UnitId),

    #[error("combat already finished")]
    Finished,

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Undo(#[from] UndoError),
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoAttackers | Self::SameSide { .. } | Self::OffMap(_) => ErrorSeverity::Validation,
            Self::Finished => ErrorSeverity::Internal,
            Self::Sequence(err) => err.severity(),
            Self::Undo(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoAttackers => "COMBAT_NO_ATTACKERS",
            Self::SameSide { .. } => "COMBAT_SAME_SIDE",
            Self::OffMap(_) => "COMBAT_OFF_MAP",
            Self::Finished => "COMBAT_FINISHED",
            Self::Sequence(err) => err.error_code(),
            Self::Undo(err) => err.error_code(),
        }
    }
}

/// One attack in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSequence {
    attackers: Vec<UnitId>,
    defender: UnitId,
    step: CombatStep,
}

impl CombatSequence {
    /// Validates the participants and opens the undo frame for the combat.
    pub fn start(
        session: &Session,
        attackers: Vec<UnitId>,
        defender: UnitId,
    ) -> Result<Self, CombatError> {
        let game = session.game();
        if attackers.is_empty() {
            return Err(CombatError::NoAttackers);
        }
        let target = game.require_unit(defender).map_err(SequenceError::from)?;
        if target.hex().is_none() {
            return Err(CombatError::OffMap(defender));
        }
        for id in &attackers {
            let unit = game.require_unit(*id).map_err(SequenceError::from)?;
            if unit.hex().is_none() {
                return Err(CombatError::OffMap(*id));
            }
            if unit.side() == target.side() {
                return Err(CombatError::SameSide {
                    attacker: *id,
                    defender,
                });
            }
        }

        session.undo().open();
        Ok(Self {
            attackers,
            defender,
            step: CombatStep::Rolling,
        })
    }

    pub fn step(&self) -> &CombatStep {
        &self.step
    }

    pub fn is_done(&self) -> bool {
        self.step == CombatStep::Done
    }

    fn lead(&self) -> Result<UnitId, CombatError> {
        self.attackers.first().copied().ok_or(CombatError::NoAttackers)
    }

    /// Performs the next step. `roll` throws one die.
    pub fn advance(
        &mut self,
        session: &Session,
        arbitrator: &dyn Arbitrator,
        roll: &mut dyn FnMut() -> u8,
    ) -> Result<&CombatStep, CombatError> {
        let game = session.game();
        let next = match &self.step {
            CombatStep::Rolling => {
                let attack = AttackElement {
                    attackers: self.attackers.clone(),
                    defender: self.defender,
                    advantage: arbitrator.advantage(game, &self.attackers, self.defender),
                    dice: (0..arbitrator.dice().max(1)).map(|_| roll()).collect(),
                };
                session.record(ElementBody::Attack(attack.clone()))?;
                CombatStep::Revealing { attack }
            }
            CombatStep::Revealing { attack } => CombatStep::ApplyingLosses {
                outcome: arbitrator.resolve(game, attack),
            },
            CombatStep::ApplyingLosses { outcome } => {
                let defender_hex = game
                    .require_unit(self.defender)
                    .map_err(SequenceError::from)?
                    .hex()
                    .ok_or(CombatError::OffMap(self.defender))?;
                if outcome.attacker_losses > 0 {
                    session.inflict(self.lead()?, outcome.attacker_losses)?;
                }
                if outcome.defender_losses > 0 {
                    session.inflict(self.defender, outcome.defender_losses)?;
                }
                CombatStep::Retreating {
                    outcome: outcome.clone(),
                    defender_hex,
                }
            }
            CombatStep::Retreating {
                outcome,
                defender_hex,
            } => {
                let defender = game.require_unit(self.defender).map_err(SequenceError::from)?;
                if let (Some(to), false) = (outcome.retreat_to, defender.is_eliminated()) {
                    session.displace(self.defender, to, ElementBody::Retreat)?;
                }
                let lead_alive = !game
                    .require_unit(self.lead()?)
                    .map_err(SequenceError::from)?
                    .is_eliminated();
                let vacated = game.unit_at(*defender_hex).is_none();
                if outcome.advance && vacated && lead_alive {
                    CombatStep::Advancing {
                        vacated: *defender_hex,
                    }
                } else {
                    CombatStep::Done
                }
            }
            CombatStep::Advancing { vacated } => {
                session.displace(self.lead()?, *vacated, ElementBody::Advance)?;
                CombatStep::Done
            }
            CombatStep::Done => return Err(CombatError::Finished),
        };

        debug!(target: "game_core::combat", defender = %self.defender, step = ?next, "combat step");
        self.step = next;
        Ok(&self.step)
    }

    /// Runs the remaining steps.
    pub fn run_to_end(
        &mut self,
        session: &Session,
        arbitrator: &dyn Arbitrator,
        roll: &mut dyn FnMut() -> u8,
    ) -> Result<(), CombatError> {
        while !self.is_done() {
            self.advance(session, arbitrator, roll)?;
        }
        Ok(())
    }

    /// Abandons the combat and reverts everything it recorded.
    ///
    /// Returns `Ok(false)` when nothing had been recorded yet.
    pub fn cancel(self, session: &Session) -> Result<bool, CombatError> {
        if self.step == CombatStep::Rolling {
            return Ok(false);
        }
        debug!(target: "game_core::combat", defender = %self.defender, "combat cancelled");
        Ok(session.undo().cancel()?)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::notify::NotificationBus;
    use crate::sequence::ElementTag;
    use crate::testing::skirmish;
    use crate::undo::UndoManager;

    struct Fixed(CombatOutcome);

    impl Arbitrator for Fixed {
        fn advantage(&self, _: &Game, attackers: &[UnitId], _: UnitId) -> i32 {
            attackers.len() as i32
        }

        fn dice(&self) -> usize {
            2
        }

        fn resolve(&self, _: &Game, _: &AttackElement) -> CombatOutcome {
            self.0.clone()
        }
    }

    fn session() -> Session {
        Session::new(skirmish(), Rc::new(UndoManager::new(NotificationBus::new())))
    }

    fn tags(session: &Session) -> Vec<ElementTag> {
        session.log().pending().iter().map(|e| e.tag()).collect()
    }

    #[test]
    fn full_combat_records_every_step() {
        let session = session();
        let arbitrator = Fixed(CombatOutcome {
            attacker_losses: 1,
            defender_losses: 1,
            retreat_to: Some(Hex::new(3, 0)),
            advance: true,
        });
        let mut dice = [6u8, 2].into_iter().cycle();
        let mut roll = move || dice.next().unwrap_or(1);

        let mut combat = session.attack(vec![UnitId(1), UnitId(3)], UnitId(2)).unwrap();
        combat.run_to_end(&session, &arbitrator, &mut roll).unwrap();

        assert_eq!(
            tags(&session),
            vec![
                ElementTag::Attack,
                ElementTag::Losses,
                ElementTag::Losses,
                ElementTag::Retreat,
                ElementTag::Advance,
            ]
        );
        let game = session.game();
        assert_eq!(game.unit(UnitId(1)).unwrap().steps(), 3);
        assert_eq!(game.unit(UnitId(1)).unwrap().hex(), Some(Hex::new(2, 0)));
        assert_eq!(game.unit(UnitId(2)).unwrap().hex(), Some(Hex::new(3, 0)));

        let ElementBody::Attack(attack) = session.log().pending()[0].body().clone() else {
            panic!("first element is not the attack");
        };
        assert_eq!(attack.dice, vec![6, 2]);
        assert_eq!(attack.advantage, 2);
        assert!(matches!(
            combat.advance(&session, &arbitrator, &mut roll),
            Err(CombatError::Finished)
        ));
    }

    #[test]
    fn eliminated_defender_lets_attacker_advance() {
        let session = session();
        let arbitrator = Fixed(CombatOutcome {
            defender_losses: 3,
            retreat_to: Some(Hex::new(3, 0)),
            advance: true,
            ..CombatOutcome::default()
        });
        let mut roll = || 5;
        let mut combat = session.attack(vec![UnitId(1)], UnitId(2)).unwrap();
        combat.run_to_end(&session, &arbitrator, &mut roll).unwrap();

        assert_eq!(
            tags(&session),
            vec![ElementTag::Attack, ElementTag::Losses, ElementTag::Advance]
        );
        assert!(session.game().unit(UnitId(2)).unwrap().is_eliminated());
    }

    #[test]
    fn cancel_reverts_the_whole_combat() {
        let session = session();
        session.move_unit(UnitId(3), Hex::new(1, 2)).unwrap();
        let before = session.game().state_root().unwrap();

        let arbitrator = Fixed(CombatOutcome {
            attacker_losses: 2,
            defender_losses: 1,
            retreat_to: Some(Hex::new(3, 0)),
            advance: false,
        });
        let mut roll = || 3;
        let mut combat = session.attack(vec![UnitId(1)], UnitId(2)).unwrap();
        for _ in 0..4 {
            combat.advance(&session, &arbitrator, &mut roll).unwrap();
        }
        assert!(combat.is_done());

        assert!(combat.cancel(&session).unwrap());
        assert_eq!(session.game().state_root().unwrap(), before);
        assert_eq!(tags(&session), vec![ElementTag::Move]);
    }

    #[test]
    fn cancel_before_rolling_keeps_earlier_actions() {
        let session = session();
        session.move_unit(UnitId(3), Hex::new(1, 2)).unwrap();
        let combat = session.attack(vec![UnitId(1)], UnitId(2)).unwrap();
        assert!(!combat.cancel(&session).unwrap());
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn friendly_fire_is_refused() {
        let session = session();
        assert!(matches!(
            session.attack(vec![UnitId(1)], UnitId(3)),
            Err(CombatError::SameSide { .. })
        ));
        assert!(matches!(
            session.attack(vec![], UnitId(2)),
            Err(CombatError::NoAttackers)
        ));
    }

    #[test]
    fn sequence_state_serializes_between_steps() {
        let session = session();
        let arbitrator = Fixed(CombatOutcome::default());
        let mut roll = || 4;
        let mut combat = session.attack(vec![UnitId(1)], UnitId(2)).unwrap();
        combat.advance(&session, &arbitrator, &mut roll).unwrap();

        let json = serde_json::to_string(&combat).unwrap();
        let restored: CombatSequence = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, combat);
        assert!(matches!(restored.step(), CombatStep::Revealing { .. }));
    }
}
