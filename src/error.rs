//! Errors that end the program.

use thiserror::Error;

use crate::config::ConfigError;
use crate::metadata::MetadataError;
use crate::mixer::MixerError;
use crate::player::PlayerError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Player(#[from] PlayerError),

  #[error("Failed to set up metadata client: {0}")]
  Metadata(#[from] MetadataError),

  #[error(transparent)]
  Mixer(#[from] MixerError),

  #[error("Failed to install signal handler: {0}")]
  Signal(#[from] std::io::Error),

  #[error("Unknown command: {0} (expected play, mute or unmute)")]
  UnknownCommand(String),
}
