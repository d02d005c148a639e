//! Backend selection and the lazily initialized notification state.

use futures_util::future::BoxFuture;
use tokio::sync::OnceCell;

use super::command::CommandNotifier;
use super::dbus::DbusNotifier;
use super::error::NotifyError;
use super::NotifySettings;

/// Shows a message to the user.
pub trait NotificationSink: Send + Sync {
  fn display<'a>(&'a self, body: &'a str) -> BoxFuture<'a, Result<(), NotifyError>>;
}

/// The notification mechanism picked at first use.
pub enum NotificationBackend {
  Native(DbusNotifier),
  Fallback(CommandNotifier),
}

impl NotificationBackend {
  /// Prefer the notification daemon, fall back to `notify-send`.
  pub async fn select(settings: NotifySettings) -> Self {
    match DbusNotifier::connect(settings.clone()).await {
      Ok(native) => NotificationBackend::Native(native),
      Err(e) => {
        log::warn!("Notification service unavailable, falling back to notify-send: {}", e);
        NotificationBackend::Fallback(CommandNotifier::new(settings))
      }
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      NotificationBackend::Native(_) => "native",
      NotificationBackend::Fallback(_) => "fallback",
    }
  }

  async fn show(&self, body: &str) -> Result<(), NotifyError> {
    match self {
      NotificationBackend::Native(native) => native.show(body).await,
      NotificationBackend::Fallback(command) => command.show(body),
    }
  }
}

/// Desktop notifier; the backend is chosen on the first `display` and kept.
pub struct Notifier {
  settings: NotifySettings,
  backend: OnceCell<NotificationBackend>,
}

impl Notifier {
  pub fn new(settings: NotifySettings) -> Self {
    Self {
      settings,
      backend: OnceCell::new(),
    }
  }

  /// Use `backend` instead of selecting one on first use.
  pub fn with_backend(settings: NotifySettings, backend: NotificationBackend) -> Self {
    Self {
      settings,
      backend: OnceCell::from(backend),
    }
  }

  async fn backend(&self) -> &NotificationBackend {
    self
      .backend
      .get_or_init(|| async {
        let backend = NotificationBackend::select(self.settings.clone()).await;
        log::info!("Using {} notification backend", backend.name());
        backend
      })
      .await
  }

  /// Release the notification state. Nothing to do if nothing was shown.
  pub async fn close(&self) {
    if let Some(NotificationBackend::Native(native)) = self.backend.get() {
      if let Err(e) = native.close().await {
        log::debug!("Failed to close notification: {}", e);
      }
    }
  }
}

impl NotificationSink for Notifier {
  fn display<'a>(&'a self, body: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
    Box::pin(async move { self.backend().await.show(body).await })
  }
}
