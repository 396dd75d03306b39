//! Hex wargame client binary.
//!
//! ```bash
//! wargame author [turns]     # play turns and commit them to the store
//! wargame spectate           # replay batches as they arrive, until Ctrl-C
//! wargame demo [turns]       # both roles in one process, then compare states
//! ```
//!
//! Settings come from the environment (see `RuntimeConfig::from_env`); a
//! `.env` file is honoured.

use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::watch;

use game_core::{ActionSequenceLog, ElementRegistry, Game, Session, UndoManager};
use runtime::{FileTransport, ReplayDriver, RuntimeConfig, Scenario, Spectator, Synchronizer};
use wargame_client::{OddsTable, logging, play};

const DEFAULT_TURNS: u32 = 4;

enum Mode {
    Author { turns: u32 },
    Spectate,
    Demo { turns: u32 },
}

impl Mode {
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mode = args.next();
        let turns = match args.next() {
            Some(turns) => turns
                .parse()
                .with_context(|| format!("invalid turn count '{turns}'"))?,
            None => DEFAULT_TURNS,
        };
        match mode.as_deref() {
            None | Some("demo") => Ok(Self::Demo { turns }),
            Some("author") => Ok(Self::Author { turns }),
            Some("spectate") => Ok(Self::Spectate),
            Some(other) => bail!("unknown mode '{other}' (expected author, spectate or demo)"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Configuration and logging
    let config = RuntimeConfig::from_env();
    let data_dir = config.data_dir();
    let session_id = std::env::var("SESSION_ID").ok();
    let _guard = logging::setup_logging(&data_dir.join("logs"), session_id.as_deref())?;
    let mode = Mode::from_args(std::env::args().skip(1))?;

    // 2. Scenario and store
    let scenario = match &config.scenario_path {
        Some(path) => Scenario::load(path)?,
        None => Scenario::skirmish(config.game_name.clone()),
    };
    let transport = FileTransport::new(data_dir.join("batches"))?;
    tracing::info!("Batch store: {}", transport.base_dir().display());
    let sync = Synchronizer::new(Arc::new(transport));
    let registry = ElementRegistry::standard();

    // 3. Run the selected role
    match mode {
        Mode::Author { turns } => {
            let game = author(&scenario, &sync, &registry, turns).await?;
            println!("state root: {}", hex::encode(game.state_root()?));
        }
        Mode::Spectate => spectate(&config, &scenario, sync, registry).await?,
        Mode::Demo { turns } => {
            let authored = author(&scenario, &sync, &registry, turns).await?;

            let game = scenario.build_game()?;
            let log = ActionSequenceLog::new(game.name());
            let spectator = Spectator::new(
                sync,
                registry,
                ReplayDriver::new(config.replay),
                config.poll_interval,
            );
            let batches = spectator.poll_once(&game, &log).await?;

            let expected = hex::encode(authored.state_root()?);
            let replayed = hex::encode(game.state_root()?);
            println!("author    state root: {expected}");
            println!("spectator state root: {replayed} ({batches} batches)");
            if expected != replayed {
                bail!("spectator diverged from author");
            }
        }
    }

    tracing::info!("Client shutdown complete");
    Ok(())
}

/// Catches up with the store, plays `turns` turns and returns the final game.
async fn author(
    scenario: &Scenario,
    sync: &Synchronizer,
    registry: &ElementRegistry,
    turns: u32,
) -> Result<Game> {
    let game = scenario.build_game()?;
    let log = play::catch_up(sync, &game, registry).await?;
    let session = Session::with_log(game, Rc::new(log), Rc::new(UndoManager::default()))?;

    let mut rng = rand::thread_rng();
    for _ in 0..turns {
        if let Some(report) = play::play_turn(&session, sync, &OddsTable, &mut rng).await? {
            tracing::info!(
                position = report.position,
                elements = report.elements,
                "turn committed"
            );
        }
    }

    let view = session.game().view();
    Ok(Game::from_view(&view)?)
}

async fn spectate(
    config: &RuntimeConfig,
    scenario: &Scenario,
    sync: Synchronizer,
    registry: ElementRegistry,
) -> Result<()> {
    let game = scenario.build_game()?;
    let log = ActionSequenceLog::new(game.name());
    let spectator = Spectator::new(
        sync,
        registry,
        ReplayDriver::new(config.replay),
        config.poll_interval,
    );

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop.send(true);
        }
    });

    spectator.run(&game, &log, shutdown).await?;
    println!("state root: {}", hex::encode(game.state_root()?));
    Ok(())
}
