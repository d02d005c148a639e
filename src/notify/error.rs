//! Notification error types.

use thiserror::Error;

/// Errors from showing a notification. Never fatal to the session.
#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("D-Bus error: {0}")]
  Dbus(#[from] zbus::Error),

  #[error("Failed to run notifier command {program}: {source}")]
  Spawn {
    program: String,
    source: std::io::Error,
  },
}
