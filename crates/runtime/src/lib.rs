//! Runtime orchestration around the sequencing core.
//!
//! This crate moves committed batches between participants and plays the
//! batches of others back onto the local game.
//!
//! Modules are organized by responsibility:
//! - [`transport`] abstracts the batch store (memory and file backends)
//! - [`sync`] hosts the [`Synchronizer`] save/load round trip
//! - [`driver`] paces a replay in wall-clock frames
//! - [`spectator`] polls the store and replays new batches in order
//! - [`scenario`] builds initial games from RON files
//! - [`config`] reads runtime settings from the environment
//!
//! Everything that touches a [`game_core::Game`] runs on one thread; use a
//! current-thread tokio runtime or a `LocalSet`.
pub mod config;
pub mod driver;
pub mod error;
pub mod scenario;
pub mod spectator;
pub mod sync;
pub mod transport;

pub use config::{ReplayConfig, RuntimeConfig};
pub use driver::ReplayDriver;
pub use error::{Result, RuntimeError, SyncError};
pub use scenario::{BoardSetup, Scenario, UnitPlacement};
pub use spectator::Spectator;
pub use sync::{SaveReport, Synchronizer};
pub use transport::{FileTransport, MemoryTransport, Transport, TransportError};
