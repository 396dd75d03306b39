//! File-based transport.
//!
//! Batches are stored as individual JSON files:
//! ```text
//! {base_dir}/{game}/batch_{position:010}.json
//! ```
//!
//! Each file wraps the batch with the time it was first stored. Writes go to
//! a temporary file that is renamed into place, so a reader never sees a
//! partially written batch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use game_core::LogSpec;

use super::{Result, Transport, TransportError, accept};

#[derive(Debug, Serialize, Deserialize)]
struct StoredBatch {
    stored_at: DateTime<Utc>,
    batch: LogSpec,
}

/// Stores each batch as a JSON file under a per-game directory.
pub struct FileTransport {
    base_dir: PathBuf,
    /// Serializes read-check-write sequences of this process.
    write_lock: Mutex<()>,
}

impl FileTransport {
    /// Creates the transport, creating `base_dir` if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if !base_dir.exists() {
            std::fs::create_dir_all(&base_dir)?;
        }
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn game_dir(&self, game: &str) -> Result<PathBuf> {
        let usable = !game.is_empty()
            && game != "."
            && game != ".."
            && !game.contains(['/', '\\']);
        if usable {
            Ok(self.base_dir.join(game))
        } else {
            Err(TransportError::InvalidGame(game.to_string()))
        }
    }

    fn batch_file(position: u64) -> String {
        format!("batch_{:010}.json", position)
    }

    fn parse_position(file_name: &str) -> Option<u64> {
        file_name
            .strip_prefix("batch_")?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }

    async fn read_batch(path: &Path) -> Result<StoredBatch> {
        let json = fs::read_to_string(path).await?;
        serde_json::from_str(&json).map_err(|e| {
            TransportError::Serialization(format!(
                "failed to deserialize {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn send_batch(&self, batch: &LogSpec) -> Result<()> {
        let dir = self.game_dir(&batch.game)?;
        let path = dir.join(Self::batch_file(batch.count));
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&dir).await?;
        let existing = if fs::try_exists(&path).await? {
            Some(Self::read_batch(&path).await?)
        } else {
            None
        };
        if !accept(existing.as_ref().map(|stored| &stored.batch), batch)? {
            return Ok(());
        }

        let stored = StoredBatch {
            stored_at: existing.map_or_else(Utc::now, |stored| stored.stored_at),
            batch: batch.clone(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| {
            TransportError::Serialization(format!("failed to serialize batch: {}", e))
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        debug!(
            target: "runtime::transport",
            game = %batch.game,
            position = batch.count,
            path = %path.display(),
            "batch written"
        );
        Ok(())
    }

    async fn fetch_batches_since(&self, game: &str, count: u64) -> Result<Vec<LogSpec>> {
        let dir = self.game_dir(game)?;
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut positions = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            match name.to_str().and_then(Self::parse_position) {
                Some(position) if position >= count => positions.push(position),
                Some(_) => {}
                None => {
                    if !name.to_string_lossy().ends_with(".tmp") {
                        warn!(target: "runtime::transport", file = ?name, "ignoring unexpected file");
                    }
                }
            }
        }
        positions.sort_unstable();

        let mut batches = Vec::with_capacity(positions.len());
        for position in positions {
            let stored = Self::read_batch(&dir.join(Self::batch_file(position))).await?;
            if stored.batch.count != position || stored.batch.game != game {
                return Err(TransportError::Serialization(format!(
                    "file for batch {} of '{}' holds batch {} of '{}'",
                    position, game, stored.batch.count, stored.batch.game
                )));
            }
            batches.push(stored.batch);
        }
        Ok(batches)
    }
}
