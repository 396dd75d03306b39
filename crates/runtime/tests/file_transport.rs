use std::rc::Rc;
use std::sync::Arc;

use game_core::{ActionSequenceLog, ElementRegistry, Hex, Session, UndoManager, UnitId};
use runtime::{FileTransport, Scenario, SyncError, Synchronizer, Transport, TransportError};
use tempfile::TempDir;

fn author() -> Session {
    Session::new(
        Scenario::skirmish("skirmish").build_game().unwrap(),
        Rc::new(UndoManager::default()),
    )
}

#[tokio::test]
async fn batches_survive_a_new_transport_instance() {
    let dir = TempDir::new().unwrap();
    let sync = Synchronizer::new(Arc::new(FileTransport::new(dir.path()).unwrap()));

    let session = author();
    session.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
    session.spread_fire(&[Hex::new(5, 5)], &[]).unwrap();
    sync.save(session.game(), session.log(), session.undo())
        .await
        .unwrap();

    let file = dir.path().join("skirmish").join("batch_0000000000.json");
    assert!(file.exists());

    // A fresh process reads the same directory.
    let reader = Synchronizer::new(Arc::new(FileTransport::new(dir.path()).unwrap()));
    let game = Scenario::skirmish("skirmish").build_game().unwrap();
    let batches = reader
        .load(&game, &ActionSequenceLog::new("skirmish"), &ElementRegistry::standard())
        .await
        .unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[0].count(), 0);

    batches[0]
        .reload(&game, &ElementRegistry::standard())
        .unwrap();
    assert_eq!(game.view(), session.game().view());
}

#[tokio::test]
async fn second_committer_at_same_position_conflicts() {
    let dir = TempDir::new().unwrap();
    let first = Synchronizer::new(Arc::new(FileTransport::new(dir.path()).unwrap()));
    let second = Synchronizer::new(Arc::new(FileTransport::new(dir.path()).unwrap()));

    let a = author();
    a.move_unit(UnitId(1), Hex::new(1, 0)).unwrap();
    first.save(a.game(), a.log(), a.undo()).await.unwrap();

    let b = author();
    b.move_unit(UnitId(3), Hex::new(1, 2)).unwrap();
    let err = second.save(b.game(), b.log(), b.undo()).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Transport(TransportError::Conflict { position: 0, .. })
    ));
    assert_eq!(b.log().len(), 1);
}

#[tokio::test]
async fn unusable_game_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let transport = FileTransport::new(dir.path()).unwrap();

    let err = transport.fetch_batches_since("../escape", 0).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidGame(_)));
    assert!(transport.fetch_batches_since("unknown", 0).await.unwrap().is_empty());
}
