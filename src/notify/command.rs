//! Fallback notifications through the `notify-send` command.

use std::process::Stdio;

use tokio::process::Command;

use super::error::NotifyError;
use super::NotifySettings;

const NOTIFY_SEND: &str = "notify-send";

/// Runs an external notifier once per message.
pub struct CommandNotifier {
  program: String,
  settings: NotifySettings,
}

impl CommandNotifier {
  pub fn new(settings: NotifySettings) -> Self {
    Self::with_program(NOTIFY_SEND, settings)
  }

  pub fn with_program(program: impl Into<String>, settings: NotifySettings) -> Self {
    Self {
      program: program.into(),
      settings,
    }
  }

  fn args<'a>(&'a self, body: &'a str) -> [&'a str; 4] {
    ["-i", &self.settings.icon_name, &self.settings.app_name, body]
  }

  /// Launch the notifier. Its exit status is not waited for.
  pub fn show(&self, body: &str) -> Result<(), NotifyError> {
    Command::new(&self.program)
      .args(self.args(body))
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()
      .map_err(|source| NotifyError::Spawn {
        program: self.program.clone(),
        source,
      })?;
    Ok(())
  }
}
