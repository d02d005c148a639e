//! Player module - spawns and supervises the external audio player.
//!
//! The player writes audio straight to the sound server; nothing is read back
//! from it, the only signal of interest is that it has exited.

mod process;

pub use process::{find_player, PlayerError, PlayerProcess, PlayerSession, PlayerState};
