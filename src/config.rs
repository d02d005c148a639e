//! Application configuration, optionally loaded from a JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "fipradio";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read config file {path:?}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("Failed to parse config file {path:?}: {source}")]
  Parse {
    path: PathBuf,
    source: serde_json::Error,
  },
  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
  /// Live stream handed to the player.
  #[serde(default = "default_stream_url")]
  pub stream_url: String,

  /// Endpoint describing what is currently on air.
  #[serde(default = "default_meta_url")]
  pub meta_url: String,

  /// Player executable, either a bare name looked up on PATH or a path.
  #[serde(default = "default_player_binary")]
  pub player_binary: String,

  /// Application name shown in notifications.
  #[serde(default = "default_app_name")]
  pub app_name: String,

  /// Freedesktop icon name shown in notifications.
  #[serde(default = "default_icon_name")]
  pub icon_name: String,

  /// Delay between two successful metadata polls, in seconds.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,

  /// Delay before retrying a failed metadata fetch, in milliseconds.
  #[serde(default = "default_retry_delay")]
  pub retry_delay_ms: u64,

  /// Upper bound for a single metadata fetch, in seconds.
  #[serde(default = "default_fetch_timeout")]
  pub fetch_timeout_secs: u64,

  /// How long a notification stays on screen, in milliseconds.
  #[serde(default = "default_notification_timeout")]
  pub notification_timeout_ms: i32,
}

fn default_stream_url() -> String {
  "http://direct.fipradio.fr/live/fip-midfi.mp3".to_string()
}

fn default_meta_url() -> String {
  "http://www.fipradio.fr/livemeta/7".to_string()
}

fn default_player_binary() -> String {
  "mplayer".to_string()
}

fn default_app_name() -> String {
  "FIP radio".to_string()
}

fn default_icon_name() -> String {
  "applications-multimedia".to_string()
}

fn default_poll_interval() -> u64 {
  5
}

fn default_retry_delay() -> u64 {
  100
}

fn default_fetch_timeout() -> u64 {
  10
}

fn default_notification_timeout() -> i32 {
  2000
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      stream_url: default_stream_url(),
      meta_url: default_meta_url(),
      player_binary: default_player_binary(),
      app_name: default_app_name(),
      icon_name: default_icon_name(),
      poll_interval_secs: default_poll_interval(),
      retry_delay_ms: default_retry_delay(),
      fetch_timeout_secs: default_fetch_timeout(),
      notification_timeout_ms: default_notification_timeout(),
    }
  }
}

impl AppConfig {
  /// Default location of the config file, if the platform has a config dir.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
  }

  /// Load the config from `path`, falling back to defaults when the file does not exist.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = match std::fs::read_to_string(path) {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        log::debug!("No config file at {:?}, using defaults", path);
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        })
      }
    };

    let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;

    log::info!("Loaded config from {:?}", path);
    Ok(config)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |msg: &str| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg.to_string())) };

    if self.stream_url.trim().is_empty() {
      return invalid("Stream URL cannot be empty");
    }
    if !self.meta_url.starts_with("http://") && !self.meta_url.starts_with("https://") {
      return invalid("Metadata URL must start with http:// or https://");
    }
    if self.player_binary.trim().is_empty() {
      return invalid("Player binary cannot be empty");
    }
    if self.poll_interval_secs < 1 || self.poll_interval_secs > 300 {
      return invalid("Poll interval must be between 1 and 300 seconds");
    }
    if self.retry_delay_ms < 10 || self.retry_delay_ms > 10_000 {
      return invalid("Retry delay must be between 10 and 10000 milliseconds");
    }
    if self.fetch_timeout_secs < 1 || self.fetch_timeout_secs > 120 {
      return invalid("Fetch timeout must be between 1 and 120 seconds");
    }
    if self.notification_timeout_ms < 0 {
      return invalid("Notification timeout cannot be negative");
    }
    Ok(())
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs)
  }

  pub fn retry_delay(&self) -> Duration {
    Duration::from_millis(self.retry_delay_ms)
  }

  pub fn fetch_timeout(&self) -> Duration {
    Duration::from_secs(self.fetch_timeout_secs)
  }

  /// File name of the player, as the mixer reports it for the player's stream.
  pub fn player_name(&self) -> String {
    Path::new(&self.player_binary)
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.player_binary.clone())
  }
}
