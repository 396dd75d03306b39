//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use game_core::Tick;

/// Configuration shared by the synchronizer, spectators and the client.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub game_name: String,
    pub save_data_dir: Option<PathBuf>,
    pub poll_interval: Duration,
    pub replay: ReplayConfig,
    pub notify_capacity: usize,
    pub scenario_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_name: "skirmish".to_string(),
            save_data_dir: None,
            poll_interval: Duration::from_millis(1000),
            replay: ReplayConfig::default(),
            notify_capacity: 256,
            scenario_path: None,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `GAME_NAME` - Game whose log is synchronized (default: skirmish)
    /// - `SAVE_DATA_DIR` - Directory of the file store (default: platform-specific)
    /// - `SYNC_POLL_INTERVAL_MS` - Spectator poll interval (default: 1000)
    /// - `REPLAY_FRAME_MS` - Wall time between replay frames (default: 16)
    /// - `REPLAY_TICKS_PER_FRAME` - Game ticks advanced per frame (default: 16)
    /// - `NOTIFY_CAPACITY` - Notification bus buffer (default: 256)
    /// - `SCENARIO_PATH` - RON scenario to start from (default: built-in skirmish)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(name) = env::var("GAME_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
        {
            config.game_name = name.trim().to_string();
        }

        config.save_data_dir = env::var("SAVE_DATA_DIR").ok().map(PathBuf::from);

        if let Some(ms) = read_env::<u64>("SYNC_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms.max(1));
        }

        if let Some(ms) = read_env::<u64>("REPLAY_FRAME_MS") {
            config.replay.frame = Duration::from_millis(ms.max(1));
        }

        if let Some(ticks) = read_env::<Tick>("REPLAY_TICKS_PER_FRAME") {
            config.replay.ticks_per_frame = ticks.max(1);
        }

        if let Some(capacity) = read_env::<usize>("NOTIFY_CAPACITY") {
            config.notify_capacity = capacity.max(1);
        }

        config.scenario_path = env::var("SCENARIO_PATH").ok().map(PathBuf::from);

        config
    }

    /// Directory of the file store.
    ///
    /// Follows platform conventions when `SAVE_DATA_DIR` is not set:
    /// - macOS: `~/Library/Application Support/hex-wargame`
    /// - Linux: `~/.local/share/hex-wargame` (or `$XDG_DATA_HOME/hex-wargame`)
    /// - Windows: `%APPDATA%\hex-wargame`
    /// - Fallback: `./save_data`
    pub fn data_dir(&self) -> PathBuf {
        self.save_data_dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "hex-wargame")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("./save_data"))
        })
    }
}

/// Pace of replay playback.
#[derive(Clone, Copy, Debug)]
pub struct ReplayConfig {
    pub frame: Duration,
    pub ticks_per_frame: Tick,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(16),
            ticks_per_frame: 16,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
