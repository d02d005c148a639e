//! Mixer module - finds the player's stream in the sound server and mutes it.
//!
//! Architecture:
//! - `listing.rs` - Byte-level scanner for the sink input listing
//! - `controller.rs` - Mixer backend seam, `pacmd` backend and mute logic

mod controller;
mod listing;

pub use controller::{Listing, MixerBackend, MixerController, MixerError, MuteOutcome, PacmdBackend};
pub use listing::{find_player_input, is_player_line, SinkInputRecord};
