//! Session coordinator - runs the player and the now-playing notifications side by side.

use std::process::ExitStatus;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::metadata::{MetadataPoller, TrackMetadata, TrackSource};
use crate::notify::NotificationSink;
use crate::player::{PlayerError, PlayerProcess};

/// One listening session: the player plus the metadata loop feeding notifications.
pub struct Coordinator<S, N> {
  player: PlayerProcess,
  poller: MetadataPoller<S>,
  notifier: N,
  poll_interval: Duration,
}

impl<S: TrackSource, N: NotificationSink> Coordinator<S, N> {
  pub fn new(player: PlayerProcess, poller: MetadataPoller<S>, notifier: N, poll_interval: Duration) -> Self {
    Self {
      player,
      poller,
      notifier,
      poll_interval,
    }
  }

  pub fn notifier(&self) -> &N {
    &self.notifier
  }

  /// Run the player and the metadata loop until the player exits.
  ///
  /// The metadata loop is cancelled as soon as the player is gone; a player
  /// that cannot be launched ends the session with an error.
  pub async fn start(&self) -> Result<ExitStatus, PlayerError> {
    let cancel = CancellationToken::new();

    let player = async {
      let result = self.player.run().await;
      cancel.cancel();
      result
    };

    let (result, ()) = tokio::join!(player, self.metadata_loop(cancel.clone()));
    result
  }

  /// Poll, notify on change, sleep; until `cancel` fires.
  pub async fn metadata_loop(&self, cancel: CancellationToken) {
    log::info!("Metadata loop started (every {:?})", self.poll_interval);
    let mut last: Option<TrackMetadata> = None;

    loop {
      let track = tokio::select! {
        _ = cancel.cancelled() => break,
        track = self.poller.poll() => track,
      };

      if last.as_ref() != Some(&track) {
        log::info!("Now playing: {} - {} ({})", track.authors, track.title, track.release_year);
        let body = track.to_string();
        tokio::select! {
          _ = cancel.cancelled() => break,
          result = self.notifier.display(&body) => {
            if let Err(e) = result {
              log::warn!("Failed to show notification: {}", e);
            }
          }
        }
        last = Some(track);
      }

      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = tokio::time::sleep(self.poll_interval) => {}
      }
    }

    log::info!("Metadata loop stopped");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::metadata::testing::{track, ScriptedSource};
  use crate::metadata::MetadataError;
  use crate::notify::NotifyError;
  use futures_util::future::BoxFuture;
  use parking_lot::Mutex;
  use std::sync::Arc;

  #[derive(Default)]
  struct RecordingSink {
    bodies: Mutex<Vec<String>>,
    fail: bool,
  }

  impl NotificationSink for RecordingSink {
    fn display<'a>(&'a self, body: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
      Box::pin(async move {
        self.bodies.lock().push(body.to_string());
        if self.fail {
          return Err(NotifyError::Spawn {
            program: "notify-send".into(),
            source: std::io::Error::other("boom"),
          });
        }
        Ok(())
      })
    }
  }

  fn coordinator(
    source: Arc<ScriptedSource>,
    sink: RecordingSink,
    player: PlayerProcess,
  ) -> Coordinator<Arc<ScriptedSource>, RecordingSink> {
    Coordinator::new(
      player,
      MetadataPoller::new(source, Duration::from_millis(1)),
      sink,
      Duration::from_millis(1),
    )
  }

  /// Run the metadata loop until the source has been fetched `calls` times.
  async fn run_until_calls(
    coordinator: &Coordinator<Arc<ScriptedSource>, RecordingSink>,
    source: &ScriptedSource,
    calls: usize,
  ) {
    let cancel = CancellationToken::new();
    let watcher = async {
      while *source.calls.lock() < calls {
        tokio::time::sleep(Duration::from_millis(1)).await;
      }
      cancel.cancel();
    };
    tokio::join!(coordinator.metadata_loop(cancel.clone()), watcher);
  }

  #[tokio::test]
  async fn test_identical_tracks_notify_once() {
    let source = Arc::new(ScriptedSource::new(vec![
      Ok(track("A", "X")),
      Ok(track("A", "X")),
      Ok(track("A", "X")),
    ]));
    let coordinator = coordinator(source.clone(), RecordingSink::default(), PlayerProcess::new("true", ""));

    run_until_calls(&coordinator, &source, 6).await;
    assert_eq!(*coordinator.notifier().bodies.lock(), vec!["A\nX (?)".to_string()]);
  }

  #[tokio::test]
  async fn test_any_field_change_notifies_again() {
    let source = Arc::new(ScriptedSource::new(vec![
      Ok(track("A", "X")),
      Ok(track("A", "X")),
      Ok(track("B", "X")),
      Ok(track("B", "X")),
      Ok(track("B", "Y")),
    ]));
    let coordinator = coordinator(source.clone(), RecordingSink::default(), PlayerProcess::new("true", ""));

    run_until_calls(&coordinator, &source, 8).await;
    assert_eq!(
      *coordinator.notifier().bodies.lock(),
      vec!["A\nX (?)".to_string(), "B\nX (?)".to_string(), "B\nY (?)".to_string()]
    );
  }

  #[tokio::test]
  async fn test_failed_fetches_and_notifications_do_not_stop_loop() {
    let source = Arc::new(ScriptedSource::new(vec![
      Err(MetadataError::NoLevels),
      Ok(track("A", "X")),
      Err(MetadataError::StepNotFound("b".into())),
      Ok(track("B", "X")),
    ]));
    let sink = RecordingSink {
      fail: true,
      ..RecordingSink::default()
    };
    let coordinator = coordinator(source.clone(), sink, PlayerProcess::new("true", ""));

    run_until_calls(&coordinator, &source, 6).await;
    assert_eq!(coordinator.notifier().bodies.lock().len(), 2);
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_player_exit_cancels_metadata_loop() {
    // Never yields a track, so the loop is stuck retrying when the player exits.
    let source = Arc::new(ScriptedSource::new(Vec::new()));
    let coordinator = coordinator(source.clone(), RecordingSink::default(), PlayerProcess::new("sleep", "0.2"));

    let status = tokio::time::timeout(Duration::from_secs(5), coordinator.start())
      .await
      .expect("session should end with the player")
      .unwrap();
    assert!(status.success());
    assert!(*source.calls.lock() > 1);
    assert!(coordinator.notifier().bodies.lock().is_empty());
  }

  #[tokio::test]
  async fn test_unlaunchable_player_ends_session_with_error() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(track("A", "X"))]));
    let coordinator = coordinator(
      source,
      RecordingSink::default(),
      PlayerProcess::new("definitely-not-a-player-binary", "http://example.com"),
    );

    let result = tokio::time::timeout(Duration::from_secs(5), coordinator.start())
      .await
      .expect("session should end with the player");
    assert!(matches!(result, Err(PlayerError::NotFound(_))));
  }
}
