//! Mute control for the player's sink input.

use std::process::{ExitStatus, Stdio};

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::process::{Child, Command};

use super::listing::find_player_input;

const PACMD: &str = "pacmd";

#[derive(Error, Debug)]
pub enum MixerError {
  #[error("Failed to run {command}: {source}")]
  Spawn { command: String, source: std::io::Error },
  #[error("Failed to read mixer listing: {0}")]
  Read(#[from] std::io::Error),
  #[error("{command} exited with {status}")]
  CommandFailed { command: String, status: ExitStatus },
}

/// Line-oriented sink input listing, optionally backed by the process producing it.
pub struct Listing {
  reader: Box<dyn AsyncBufRead + Send + Unpin>,
  child: Option<(String, Child)>,
}

impl Listing {
  pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
    Self {
      reader: Box::new(reader),
      child: None,
    }
  }

  fn from_child(command: String, mut child: Child) -> Result<Self, MixerError> {
    let stdout = child.stdout.take().ok_or_else(|| MixerError::Spawn {
      command: command.clone(),
      source: std::io::Error::other("stdout not captured"),
    })?;
    Ok(Self {
      reader: Box::new(BufReader::new(stdout)),
      child: Some((command, child)),
    })
  }

  /// Wait for the listing process once its output has been read to the end.
  ///
  /// A listing that ended because the command failed is an error, not an
  /// empty listing.
  pub async fn finish(self) -> Result<(), MixerError> {
    let Some((command, mut child)) = self.child else {
      return Ok(());
    };
    drop(self.reader);

    let status = child.wait().await?;
    if !status.success() {
      return Err(MixerError::CommandFailed { command, status });
    }
    Ok(())
  }
}

/// Access to the sound server's sink inputs.
pub trait MixerBackend: Send + Sync {
  /// Start a listing of all sink inputs.
  fn list_sink_inputs(&self) -> BoxFuture<'_, Result<Listing, MixerError>>;

  /// Set the mute state of one sink input.
  fn set_sink_input_mute<'a>(&'a self, index: &'a [u8], muted: bool) -> BoxFuture<'a, Result<(), MixerError>>;
}

/// PulseAudio backend driving `pacmd`.
#[derive(Debug, Clone)]
pub struct PacmdBackend {
  program: String,
}

impl Default for PacmdBackend {
  fn default() -> Self {
    Self::with_program(PACMD)
  }
}

impl PacmdBackend {
  pub fn with_program(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn command(&self) -> Command {
    let mut command = Command::new(&self.program);
    command.stdin(Stdio::null()).stderr(Stdio::null()).kill_on_drop(true);
    command
  }

  fn spawn_error(&self, source: std::io::Error) -> MixerError {
    MixerError::Spawn {
      command: self.program.clone(),
      source,
    }
  }
}

impl MixerBackend for PacmdBackend {
  fn list_sink_inputs(&self) -> BoxFuture<'_, Result<Listing, MixerError>> {
    Box::pin(async move {
      let child = self
        .command()
        .arg("list-sink-inputs")
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| self.spawn_error(e))?;

      Listing::from_child(self.program.clone(), child)
    })
  }

  fn set_sink_input_mute<'a>(&'a self, index: &'a [u8], muted: bool) -> BoxFuture<'a, Result<(), MixerError>> {
    Box::pin(async move {
      let index = String::from_utf8_lossy(index);
      log::debug!("{} set-sink-input-mute {} {}", self.program, index, muted as u8);

      let status = self
        .command()
        .arg("set-sink-input-mute")
        .arg(&*index)
        .arg(if muted { "1" } else { "0" })
        .stdout(Stdio::null())
        .status()
        .await
        .map_err(|e| self.spawn_error(e))?;

      if !status.success() {
        return Err(MixerError::CommandFailed {
          command: self.program.clone(),
          status,
        });
      }
      Ok(())
    })
  }
}

/// Result of a mute request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteOutcome {
  /// The mute command was issued.
  Changed,
  /// The player's stream was already in the requested state.
  AlreadySet,
  /// The player has no active stream.
  NotFound,
}

/// Mutes and unmutes the player's stream in the sound server.
pub struct MixerController<B> {
  backend: B,
  player: String,
}

impl<B: MixerBackend> MixerController<B> {
  /// `player` is the binary name the sound server reports for the stream.
  pub fn new(backend: B, player: impl Into<String>) -> Self {
    Self {
      backend,
      player: player.into(),
    }
  }

  pub async fn set_muted(&self, muted: bool) -> Result<MuteOutcome, MixerError> {
    let mut listing = self.backend.list_sink_inputs().await?;

    let Some(record) = find_player_input(&mut listing.reader, &self.player).await? else {
      listing.finish().await?;
      log::info!("No sink input for {}, nothing to {}", self.player, verb(muted));
      return Ok(MuteOutcome::NotFound);
    };
    // Only reached with an index; see find_player_input.
    let index = record.index.unwrap_or_default();

    if record.muted == Some(muted) {
      log::debug!("Sink input {} already {}d", String::from_utf8_lossy(&index), verb(muted));
      return Ok(MuteOutcome::AlreadySet);
    }

    self.backend.set_sink_input_mute(&index, muted).await?;
    log::info!("Sink input {} {}d", String::from_utf8_lossy(&index), verb(muted));
    Ok(MuteOutcome::Changed)
  }
}

fn verb(muted: bool) -> &'static str {
  if muted {
    "mute"
  } else {
    "unmute"
  }
}
