use std::str::FromStr;
use std::sync::Arc;

mod config;
mod error;
mod metadata;
mod mixer;
mod notify;
mod player;
mod session;

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use metadata::{
  Level, LiveMeta, MetadataClient, MetadataError, MetadataPoller, Step, TrackMetadata, TrackSource, UNKNOWN_FIELD,
};
pub use mixer::{
  find_player_input, is_player_line, Listing, MixerBackend, MixerController, MixerError, MuteOutcome, PacmdBackend,
  SinkInputRecord,
};
pub use notify::{
  CommandNotifier, DbusNotifier, NotificationBackend, NotificationSink, Notifier, NotifyError, NotifySettings,
};
pub use player::{find_player, PlayerError, PlayerProcess, PlayerSession, PlayerState};
pub use session::Coordinator;

use tokio::task::JoinHandle;

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// Play the stream and notify track changes.
  Play,
  /// Mute the running player's stream.
  Mute,
  /// Unmute the running player's stream.
  Unmute,
}

impl FromStr for Action {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "play" => Ok(Action::Play),
      "mute" => Ok(Action::Mute),
      "unmute" => Ok(Action::Unmute),
      other => Err(AppError::UnknownCommand(other.to_string())),
    }
  }
}

/// Install the log subscriber; `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load the config from its default location, or defaults if there is none.
pub fn load_config() -> Result<AppConfig, AppError> {
  match AppConfig::default_path() {
    Some(path) => Ok(AppConfig::load(&path)?),
    None => Ok(AppConfig::default()),
  }
}

pub async fn run(action: Action, config: AppConfig) -> Result<(), AppError> {
  match action {
    Action::Play => play(&config).await,
    Action::Mute => set_muted(&config, true).await,
    Action::Unmute => set_muted(&config, false).await,
  }
}

async fn set_muted(config: &AppConfig, muted: bool) -> Result<(), AppError> {
  let mixer = MixerController::new(PacmdBackend::default(), config.player_name());
  let outcome = mixer.set_muted(muted).await?;
  log::info!("Mute request ({}): {:?}", muted, outcome);
  Ok(())
}

async fn play(config: &AppConfig) -> Result<(), AppError> {
  let source = MetadataClient::new(config.meta_url.clone(), config.fetch_timeout())?;
  let coordinator = Coordinator::new(
    PlayerProcess::new(config.player_binary.clone(), config.stream_url.clone()),
    MetadataPoller::new(source, config.retry_delay()),
    Notifier::new(NotifySettings::from(config)),
    config.poll_interval(),
  );

  let mixer = Arc::new(MixerController::new(PacmdBackend::default(), config.player_name()));
  let signals = spawn_mute_signals(mixer)?;

  log::info!("Playing {} with {}", config.stream_url, config.player_binary);
  let result = tokio::select! {
    result = coordinator.start() => result.map(|status| {
      if !status.success() {
        log::warn!("Player exited with: {}", status);
      }
    }),
    _ = tokio::signal::ctrl_c() => {
      log::info!("Interrupted, stopping player");
      Ok(())
    }
  };

  signals.abort();
  coordinator.notifier().close().await;
  Ok(result?)
}

/// Mute on SIGUSR1 and unmute on SIGUSR2 while the session runs.
#[cfg(unix)]
fn spawn_mute_signals<B>(mixer: Arc<MixerController<B>>) -> Result<JoinHandle<()>, AppError>
where
  B: MixerBackend + 'static,
{
  use tokio::signal::unix::{signal, SignalKind};

  let mut mute = signal(SignalKind::user_defined1())?;
  let mut unmute = signal(SignalKind::user_defined2())?;

  Ok(tokio::spawn(async move {
    loop {
      let muted = tokio::select! {
        Some(()) = mute.recv() => true,
        Some(()) = unmute.recv() => false,
        else => break,
      };
      match mixer.set_muted(muted).await {
        Ok(outcome) => log::info!("Mute request ({}): {:?}", muted, outcome),
        Err(e) => log::warn!("Mute request ({}) failed: {}", muted, e),
      }
    }
  }))
}

#[cfg(not(unix))]
fn spawn_mute_signals<B>(_mixer: Arc<MixerController<B>>) -> Result<JoinHandle<()>, AppError>
where
  B: MixerBackend + 'static,
{
  log::debug!("Mute signals are only available on Unix");
  Ok(tokio::spawn(async {}))
}
