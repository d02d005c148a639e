//! Player binary detection and process supervision.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::{Child, Command};

#[derive(Error, Debug)]
pub enum PlayerError {
  #[error("Player executable not found: {0}")]
  NotFound(String),
  #[error("Failed to spawn player: {0}")]
  SpawnFailed(#[source] std::io::Error),
  #[error("Failed to wait for player: {0}")]
  WaitFailed(#[source] std::io::Error),
}

/// Find the player executable.
///
/// Anything containing a path separator is taken as a path and must exist;
/// a bare name is looked up on PATH and then in the usual install prefixes.
pub fn find_player(binary: &str) -> Option<PathBuf> {
  let candidate = Path::new(binary);
  if candidate.components().count() > 1 {
    return candidate.exists().then(|| candidate.to_path_buf());
  }

  if let Ok(path) = which::which(binary) {
    return Some(path);
  }

  #[cfg(unix)]
  {
    for prefix in ["/usr/bin", "/usr/local/bin"] {
      let p = Path::new(prefix).join(binary);
      if p.exists() {
        return Some(p);
      }
    }
  }

  None
}

/// Spawn the player on `url` with all standard streams on the null device.
///
/// The child is killed if its handle is dropped before it exits.
pub fn spawn_player(player: &Path, url: &str) -> Result<Child, PlayerError> {
  log::info!("Spawning player: {:?} {}", player, url);

  Command::new(player)
    .arg(url)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .kill_on_drop(true)
    .spawn()
    .map_err(PlayerError::SpawnFailed)
}

/// Lifecycle of a spawned player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
  Running,
  Exited(ExitStatus),
}

/// A running player child, owned by [`PlayerProcess::run`].
pub struct PlayerSession {
  child: Child,
  state: PlayerState,
}

impl PlayerSession {
  fn new(child: Child) -> Self {
    Self {
      child,
      state: PlayerState::Running,
    }
  }

  pub fn state(&self) -> PlayerState {
    self.state
  }

  pub fn pid(&self) -> Option<u32> {
    self.child.id()
  }

  /// Wait for the child to exit.
  pub async fn wait(&mut self) -> Result<ExitStatus, PlayerError> {
    if let PlayerState::Exited(status) = self.state {
      return Ok(status);
    }
    let status = self.child.wait().await.map_err(PlayerError::WaitFailed)?;
    self.state = PlayerState::Exited(status);
    Ok(status)
  }
}

/// Launches the configured player on the stream URL.
#[derive(Debug, Clone)]
pub struct PlayerProcess {
  binary: String,
  stream_url: String,
}

impl PlayerProcess {
  pub fn new(binary: impl Into<String>, stream_url: impl Into<String>) -> Self {
    Self {
      binary: binary.into(),
      stream_url: stream_url.into(),
    }
  }

  /// Start the player and wait until it exits.
  ///
  /// Dropping the returned future kills the player.
  pub async fn run(&self) -> Result<ExitStatus, PlayerError> {
    let player = find_player(&self.binary).ok_or_else(|| PlayerError::NotFound(self.binary.clone()))?;
    let mut session = PlayerSession::new(spawn_player(&player, &self.stream_url)?);
    log::info!("Player started (pid: {:?})", session.pid());

    let status = session.wait().await?;
    log::info!("Player exited with: {}", status);
    Ok(status)
  }
}
