//! Scripted player turns and catch-up for the author role.

use std::rc::Rc;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::info;

use game_core::{ActionSequenceLog, Arbitrator, ElementRegistry, Game, Hex, Session, Side, Unit, UnitId};
use runtime::{SaveReport, Synchronizer};

use crate::hexmap;

/// Loads every stored batch into `game` without animation.
///
/// Returns a log positioned after the last stored batch.
pub async fn catch_up(
    sync: &Synchronizer,
    game: &Game,
    registry: &ElementRegistry,
) -> Result<ActionSequenceLog> {
    let log = ActionSequenceLog::new(game.name());
    let batches = sync.load(game, &log, registry).await?;
    for batch in &batches {
        batch
            .reload(game, registry)
            .with_context(|| format!("batch {} does not apply", batch.count()))?;
        log.mark_replayed(batch.count());
    }
    if !batches.is_empty() {
        info!(batches = batches.len(), count = log.count(), "caught up with stored batches");
    }
    Ok(log)
}

/// Plays one turn for the active side and saves it.
///
/// Weather is rolled at the start of each allied turn. The first unit of
/// the active side steps toward the nearest enemy and attacks it when
/// adjacent, then play passes to the other side.
pub async fn play_turn<R: Rng>(
    session: &Session,
    sync: &Synchronizer,
    arbitrator: &dyn Arbitrator,
    rng: &mut R,
) -> Result<Option<SaveReport>> {
    let side = session.game().board().active_side();
    if side == Side::Allied {
        let weather = session.roll_weather(rng.gen_range(1..=6))?;
        info!(%weather, "weather rolled");
    }

    if let Some(((from, unit), (target, enemy))) = pick_engagement(session.game(), side) {
        let mut at = from;
        if hexmap::distance(from, target) > 1 {
            let to = hexmap::step_toward(from, target);
            if session.game().unit_at(to).is_none() {
                session.move_unit(unit, to)?;
                info!(%unit, %from, %to, "unit moved");
                at = to;
            }
        }
        if hexmap::distance(at, target) <= 1 {
            let mut roll = || -> u8 { rng.gen_range(1..=6) };
            let mut combat = session.attack(vec![unit], enemy)?;
            combat.run_to_end(session, arbitrator, &mut roll)?;
            info!(attacker = %unit, defender = %enemy, "attack resolved");
        }
    }

    let turn = session.end_turn()?;
    info!(turn = turn.turn, side = %turn.side, "turn handed over");

    Ok(sync
        .save(session.game(), session.log(), session.undo())
        .await?)
}

type Placed = (Hex, UnitId);

/// First unit of `side` on the map and the closest enemy to it.
fn pick_engagement(game: &Game, side: Side) -> Option<(Placed, Placed)> {
    let placed = |unit: &Rc<Unit>| unit.hex().map(|hex| (hex, unit.id()));
    let mover = game
        .units()
        .filter(|unit| unit.side() == side)
        .find_map(placed)?;
    let enemy = game
        .units()
        .filter(|unit| unit.side() != side)
        .filter_map(placed)
        .min_by_key(|(hex, _)| hexmap::distance(mover.0, *hex))?;
    Some((mover, enemy))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use game_core::UndoManager;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use runtime::{FileTransport, MemoryTransport, Scenario};
    use tempfile::TempDir;

    use super::*;
    use crate::arbitrator::OddsTable;

    #[tokio::test]
    async fn turns_are_saved_and_replayable() {
        let transport = MemoryTransport::new();
        let sync = Synchronizer::new(Arc::new(transport.clone()));
        let registry = ElementRegistry::standard();
        let mut rng = StdRng::seed_from_u64(7);

        let game = Scenario::skirmish("skirmish").build_game().unwrap();
        let log = catch_up(&sync, &game, &registry).await.unwrap();
        let session = Session::with_log(game, Rc::new(log), Rc::new(UndoManager::default())).unwrap();
        for position in 0..4 {
            let report = play_turn(&session, &sync, &OddsTable, &mut rng)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(report.position, position);
        }
        assert_eq!(transport.batch_count("skirmish").unwrap(), 4);

        // A second author resumes from the store and reaches the same state.
        let resumed = Scenario::skirmish("skirmish").build_game().unwrap();
        let log = catch_up(&sync, &resumed, &registry).await.unwrap();
        assert_eq!(log.count(), 4);
        assert_eq!(resumed.view(), session.game().view());
    }

    #[tokio::test]
    async fn restarted_author_continues_from_disk() {
        let dir = TempDir::new().unwrap();
        let registry = ElementRegistry::standard();
        let mut rng = StdRng::seed_from_u64(7);

        let open = |dir: &TempDir| {
            Synchronizer::new(Arc::new(FileTransport::new(dir.path().join("batches")).unwrap()))
        };
        let resume = |game: Game, log: ActionSequenceLog| {
            Session::with_log(game, Rc::new(log), Rc::new(UndoManager::default())).unwrap()
        };

        let sync = open(&dir);
        let game = Scenario::skirmish("skirmish").build_game().unwrap();
        let log = catch_up(&sync, &game, &registry).await.unwrap();
        let first = resume(game, log);
        for position in 0..2 {
            let report = play_turn(&first, &sync, &OddsTable, &mut rng)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(report.position, position);
        }

        // Same directory, new process.
        let sync = open(&dir);
        let game = Scenario::skirmish("skirmish").build_game().unwrap();
        let log = catch_up(&sync, &game, &registry).await.unwrap();
        assert_eq!(log.count(), 2);
        assert_eq!(game.view(), first.game().view());

        let second = resume(game, log);
        for position in 2..4 {
            let report = play_turn(&second, &sync, &OddsTable, &mut rng)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(report.position, position);
        }

        let reader = Scenario::skirmish("skirmish").build_game().unwrap();
        let log = catch_up(&open(&dir), &reader, &registry).await.unwrap();
        assert_eq!(log.count(), 4);
        assert_eq!(reader.view(), second.game().view());
    }
}
