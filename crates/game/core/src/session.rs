//! A local player's view of one game: the game model, its sequence log and
//! the undo manager, wired together.

use std::rc::Rc;

use tracing::debug;

use crate::combat::{CombatError, CombatSequence};
use crate::sequence::elements::{FireElement, TurnElement, UnitMove, WeatherElement};
use crate::sequence::{ActionSequenceLog, ElementBody, SequenceElement, SequenceError};
use crate::state::{Game, Hex, Side, UnitId, Weather};
use crate::undo::UndoManager;

/// Entry point for local play.
///
/// Every gameplay operation opens an undo frame, registers the objects it is
/// about to mutate, mutates them and appends the matching element to the log.
pub struct Session {
    game: Game,
    log: Rc<ActionSequenceLog>,
    undo: Rc<UndoManager>,
}

impl Session {
    pub fn new(game: Game, undo: Rc<UndoManager>) -> Self {
        let log = Rc::new(ActionSequenceLog::new(game.name()));
        Self { game, log, undo }
    }

    /// Builds a session around an existing log, e.g. one resumed at a known count.
    pub fn with_log(
        game: Game,
        log: Rc<ActionSequenceLog>,
        undo: Rc<UndoManager>,
    ) -> Result<Self, SequenceError> {
        if log.game() != game.name() {
            return Err(SequenceError::ForeignElement {
                expected: game.name().to_string(),
                found: log.game().to_string(),
            });
        }
        Ok(Self { game, log, undo })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn log(&self) -> &Rc<ActionSequenceLog> {
        &self.log
    }

    pub fn undo(&self) -> &Rc<UndoManager> {
        &self.undo
    }

    /// Moves a unit as one undoable action.
    pub fn move_unit(&self, unit: UnitId, to: Hex) -> Result<(), SequenceError> {
        self.undo.open();
        self.displace(unit, to, ElementBody::Move)
    }

    /// Rolls for the weather of the current turn.
    pub fn roll_weather(&self, roll: u8) -> Result<Weather, SequenceError> {
        let weather = Weather::from_roll(roll);
        self.undo.open();
        self.undo.register(self.game.board());
        self.game.set_weather(weather);
        self.record(ElementBody::Weather(WeatherElement {
            weather,
            dice: vec![roll],
        }))?;
        Ok(weather)
    }

    /// Updates burning hexes. New fires only start in clear weather.
    ///
    /// Returns the change actually applied, which is empty when nothing
    /// happened; an empty change records no element.
    pub fn spread_fire(
        &self,
        ignited: &[Hex],
        extinguished: &[Hex],
    ) -> Result<FireElement, SequenceError> {
        let board = self.game.board();
        let ignited = if board.weather().lets_fire_spread() {
            ignited
                .iter()
                .copied()
                .filter(|hex| !board.is_burning(*hex))
                .collect()
        } else {
            Vec::new()
        };
        let extinguished = extinguished
            .iter()
            .copied()
            .filter(|hex| board.is_burning(*hex))
            .collect();
        let change = FireElement {
            ignited,
            extinguished,
        };
        if change.is_empty() {
            return Ok(change);
        }

        self.undo.open();
        self.undo.register(board);
        self.game.update_fires(&change.ignited, &change.extinguished);
        self.record(ElementBody::Fire(change.clone()))?;
        Ok(change)
    }

    /// Hands play to the other side.
    ///
    /// The hand-over is recorded without undo and closes the undo history:
    /// actions of the finished player turn can no longer be taken back.
    pub fn end_turn(&self) -> Result<TurnElement, SequenceError> {
        let board = self.game.board();
        let side = board.active_side().opponent();
        let turn = match side {
            Side::Allied => board.turn() + 1,
            Side::Axis => board.turn(),
        };
        let element = TurnElement { turn, side };
        self.log.add_element(SequenceElement::new(
            self.game.name(),
            ElementBody::Turn(element.clone()),
        ))?;
        self.game.set_turn(turn, side);
        self.undo.clear();
        debug!(target: "game_core::session", turn, %side, "turn ended");
        Ok(element)
    }

    /// Starts an attack; see [`CombatSequence`].
    pub fn attack(
        &self,
        attackers: Vec<UnitId>,
        defender: UnitId,
    ) -> Result<CombatSequence, CombatError> {
        CombatSequence::start(self, attackers, defender)
    }

    /// Registers, moves and records one unit displacement inside the open frame.
    pub(crate) fn displace(
        &self,
        unit: UnitId,
        to: Hex,
        kind: fn(UnitMove) -> ElementBody,
    ) -> Result<(), SequenceError> {
        // Validate before registering: a rejected move must leave history alone.
        let handle = self.game.check_move(unit, to)?;
        let Some(from) = handle.hex() else {
            return Err(crate::state::GameStateError::Eliminated(unit).into());
        };
        self.undo.register(handle);
        self.game.move_unit(unit, to)?;
        self.record(kind(UnitMove::new(unit, from, to)))
    }

    /// Registers and applies step losses inside the open frame.
    pub(crate) fn inflict(&self, unit: UnitId, steps: u8) -> Result<(), SequenceError> {
        use crate::sequence::elements::LossesElement;

        self.undo.register(self.game.require_on_map(unit)?);
        self.game.apply_losses(unit, steps)?;
        self.record(ElementBody::Losses(LossesElement { unit, steps }))
    }

    /// Appends an element to the log as part of the open undo frame.
    pub(crate) fn record(&self, body: ElementBody) -> Result<(), SequenceError> {
        self.log
            .append_element(&self.undo, SequenceElement::new(self.game.name(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationBus;
    use crate::sequence::ElementTag;
    use crate::testing::skirmish;

    fn session() -> Session {
        Session::new(skirmish(), Rc::new(UndoManager::new(NotificationBus::new())))
    }

    fn tags(session: &Session) -> Vec<ElementTag> {
        session.log().pending().iter().map(|e| e.tag()).collect()
    }

    #[test]
    fn move_is_recorded_and_undoable() {
        let session = session();
        session.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
        session.move_unit(UnitId(1), Hex::new(1, -1)).unwrap();
        assert_eq!(tags(&session), vec![ElementTag::Move, ElementTag::Move]);

        assert!(session.undo().undo().unwrap());
        let unit = session.game().unit(UnitId(1)).unwrap();
        assert_eq!(unit.hex(), Some(Hex::new(1, 0)));
        assert_eq!(session.log().len(), 1);

        assert!(session.undo().undo().unwrap());
        assert_eq!(unit.hex(), Some(Hex::new(0, 0)));
        assert!(session.log().is_empty());
    }

    #[test]
    fn failed_move_records_nothing() {
        let session = session();
        let err = session.move_unit(UnitId(1), Hex::new(2, 0)).unwrap_err();
        assert!(matches!(err, SequenceError::Game(_)));
        assert!(session.log().is_empty());
    }

    #[test]
    fn rejected_move_keeps_redo_history() {
        let session = session();
        session.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
        assert!(session.undo().undo().unwrap());
        assert!(session.undo().redoable());

        // (2, 0) holds the axis grenadiers.
        let err = session.move_unit(UnitId(1), Hex::new(2, 0)).unwrap_err();
        assert!(matches!(err, SequenceError::Game(_)));
        assert!(session.undo().redoable());
        assert!(!session.undo().undoable());
        assert!(session.log().is_empty());

        assert!(session.undo().redo().unwrap());
        let unit = session.game().unit(UnitId(1)).unwrap();
        assert_eq!(unit.hex(), Some(Hex::new(1, 0)));
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn recorded_turn_matches_board() {
        let session = session();
        let turn = session.end_turn().unwrap();
        let board = session.game().board();
        assert_eq!((board.turn(), board.active_side()), (turn.turn, turn.side));
        match session.log().pending().last().map(|e| e.body().clone()) {
            Some(ElementBody::Turn(recorded)) => assert_eq!(recorded, turn),
            other => panic!("expected a turn element, got {other:?}"),
        }
    }

    #[test]
    fn fire_needs_clear_weather_to_spread() {
        let session = session();
        let change = session.spread_fire(&[Hex::new(3, 3)], &[]).unwrap();
        assert_eq!(change.ignited, vec![Hex::new(3, 3)]);

        session.roll_weather(4).unwrap();
        assert_eq!(session.game().board().weather(), Weather::Rain);
        let change = session
            .spread_fire(&[Hex::new(4, 4)], &[Hex::new(3, 3)])
            .unwrap();
        assert!(change.ignited.is_empty());
        assert_eq!(change.extinguished, vec![Hex::new(3, 3)]);

        // Nothing left to change: no element.
        assert!(session.spread_fire(&[], &[Hex::new(3, 3)]).unwrap().is_empty());
        assert_eq!(
            tags(&session),
            vec![ElementTag::Fire, ElementTag::Weather, ElementTag::Fire]
        );
    }

    #[test]
    fn end_turn_closes_undo_history() {
        let session = session();
        session.move_unit(UnitId(3), Hex::new(1, 2)).unwrap();
        let turn = session.end_turn().unwrap();
        assert_eq!(turn, TurnElement { turn: 1, side: Side::Axis });
        assert!(!session.undo().undoable());

        let turn = session.end_turn().unwrap();
        assert_eq!(turn, TurnElement { turn: 2, side: Side::Allied });
        assert_eq!(session.log().len(), 3);
    }

    #[test]
    fn sessions_reject_logs_of_other_games() {
        let undo = Rc::new(UndoManager::default());
        let log = Rc::new(ActionSequenceLog::new("elsewhere"));
        assert!(Session::with_log(skirmish(), log, undo).is_err());
    }
}
