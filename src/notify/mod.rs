//! Desktop notification module.
//!
//! Architecture:
//! - `dbus.rs` - Native notifications via the session bus
//! - `command.rs` - `notify-send` fallback
//! - `notifier.rs` - Backend selection, done once on first use

mod command;
mod dbus;
mod error;
mod notifier;

pub use command::CommandNotifier;
pub use dbus::DbusNotifier;
pub use error::NotifyError;
pub use notifier::{NotificationBackend, NotificationSink, Notifier};

use crate::config::AppConfig;

/// What every notification carries besides its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySettings {
  pub app_name: String,
  pub icon_name: String,
  /// Display time in milliseconds.
  pub timeout_ms: i32,
}

impl Default for NotifySettings {
  fn default() -> Self {
    Self::from(&AppConfig::default())
  }
}

impl From<&AppConfig> for NotifySettings {
  fn from(config: &AppConfig) -> Self {
    Self {
      app_name: config.app_name.clone(),
      icon_name: config.icon_name.clone(),
      timeout_ms: config.notification_timeout_ms,
    }
  }
}
