//! Hex wargame client: author and spectator roles around the runtime.
//!
//! - [`play`] scripts player turns and catches an author up with the store
//! - [`arbitrator`] holds the combat results table
//! - [`logging`] installs the tracing subscriber
pub mod arbitrator;
pub mod hexmap;
pub mod logging;
pub mod play;

pub use arbitrator::OddsTable;
