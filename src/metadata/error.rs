//! Metadata fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching the live metadata.
///
/// All of these are transient: the poller retries on any of them.
#[derive(Debug, Error)]
pub enum MetadataError {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("HTTP error: {0}")]
  HttpStatus(reqwest::StatusCode),

  #[error("Metadata fetch timed out")]
  Timeout,

  #[error("JSON decoding error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("No levels in metadata document")]
  NoLevels,

  #[error("Malformed current level: {0}")]
  InvalidLevel(#[source] serde_json::Error),

  #[error("Position {position} out of range for {len} items")]
  PositionOutOfRange { position: i64, len: usize },

  #[error("No step for id {0}")]
  StepNotFound(String),

  #[error("Step {0} is not an object")]
  InvalidStep(String),
}
