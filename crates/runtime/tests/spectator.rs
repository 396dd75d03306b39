use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use game_core::{ActionSequenceLog, ElementRegistry, Hex, Session, UndoManager, UnitId, Weather};
use runtime::{MemoryTransport, ReplayConfig, ReplayDriver, Scenario, Spectator, Synchronizer};
use tokio::sync::watch;

fn fast_driver() -> ReplayDriver {
    ReplayDriver::new(ReplayConfig {
        frame: Duration::from_millis(1),
        ticks_per_frame: 500,
    })
}

fn spectator(sync: Synchronizer) -> Spectator {
    Spectator::new(
        sync,
        ElementRegistry::standard(),
        fast_driver(),
        Duration::from_millis(5),
    )
}

/// Author plays two batches; a spectator on a fresh copy replays them and
/// ends in the same state.
#[tokio::test]
async fn spectator_replays_batches_in_order() {
    println!("\n════════════════════════════════════════════════════════");
    println!("  HEX WARGAME - Author / Spectator Replay");
    println!("════════════════════════════════════════════════════════\n");

    let transport = MemoryTransport::new();
    let sync = Synchronizer::new(Arc::new(transport));

    // ================================================================
    // PHASE 1: Author commits two batches
    // ================================================================
    let author = Session::new(
        Scenario::skirmish("skirmish").build_game().unwrap(),
        Rc::new(UndoManager::default()),
    );
    author.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
    author.end_turn().unwrap();
    sync.save(author.game(), author.log(), author.undo())
        .await
        .unwrap();
    author.roll_weather(5).unwrap();
    author.move_unit(UnitId(4), Hex::new(3, 0)).unwrap();
    sync.save(author.game(), author.log(), author.undo())
        .await
        .unwrap();
    println!("✓ Author saved 2 batches\n");

    // ================================================================
    // PHASE 2: Spectator catches up
    // ================================================================
    let game = Scenario::skirmish("skirmish").build_game().unwrap();
    let log = ActionSequenceLog::new("skirmish");
    let spectator = spectator(sync);

    let replayed = spectator.poll_once(&game, &log).await.unwrap();
    assert_eq!(replayed, 2);
    assert_eq!(log.count(), 2);
    assert_eq!(spectator.clock(), 2500);
    println!("✓ Spectator replayed {} batches up to tick {}", replayed, spectator.clock());

    assert_eq!(game.view(), author.game().view());
    assert_eq!(
        game.state_root().unwrap(),
        author.game().state_root().unwrap()
    );
    assert_eq!(game.board().weather(), Weather::Storm);

    // Nothing new: nothing replayed.
    assert_eq!(spectator.poll_once(&game, &log).await.unwrap(), 0);
    println!("✓ States match\n");
}

#[tokio::test]
async fn spectator_run_stops_on_shutdown() {
    let transport = MemoryTransport::new();
    let sync = Synchronizer::new(Arc::new(transport));

    let author = Session::new(
        Scenario::skirmish("skirmish").build_game().unwrap(),
        Rc::new(UndoManager::default()),
    );
    author.move_unit(UnitId(3), Hex::new(1, 2)).unwrap();
    sync.save(author.game(), author.log(), author.undo())
        .await
        .unwrap();

    let game = Scenario::skirmish("skirmish").build_game().unwrap();
    let log = ActionSequenceLog::new("skirmish");
    let spectator = spectator(sync);
    let (stop, shutdown) = watch::channel(false);

    let (result, ()) = tokio::join!(spectator.run(&game, &log, shutdown), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.send(true).unwrap();
    });

    result.unwrap();
    assert_eq!(log.count(), 1);
    assert_eq!(game.unit(UnitId(3)).unwrap().hex(), Some(Hex::new(1, 2)));
}

#[tokio::test]
async fn spectator_skips_batches_it_already_played() {
    let transport = MemoryTransport::new();
    let sync = Synchronizer::new(Arc::new(transport));

    let author = Session::new(
        Scenario::skirmish("skirmish").build_game().unwrap(),
        Rc::new(UndoManager::default()),
    );
    author.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
    sync.save(author.game(), author.log(), author.undo())
        .await
        .unwrap();
    author.move_unit(UnitId(1), Hex::new(1, -1)).unwrap();
    sync.save(author.game(), author.log(), author.undo())
        .await
        .unwrap();

    // Resumed from a save that already holds the first move.
    let game = Scenario::skirmish("skirmish").build_game().unwrap();
    game.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
    let log = ActionSequenceLog::with_count("skirmish", 1);

    assert_eq!(spectator(sync).poll_once(&game, &log).await.unwrap(), 1);
    assert_eq!(game.unit(UnitId(1)).unwrap().hex(), Some(Hex::new(1, -1)));
    assert_eq!(log.count(), 2);
}
