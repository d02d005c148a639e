//! Native notifications through the freedesktop notification service.
//!
//! Reference: https://specifications.freedesktop.org/notification-spec/latest/

use std::collections::HashMap;

use parking_lot::Mutex;
use zbus::Connection;
use zvariant::Value;

use super::error::NotifyError;
use super::NotifySettings;

const DESTINATION: &str = "org.freedesktop.Notifications";
const PATH: &str = "/org/freedesktop/Notifications";
const INTERFACE: &str = "org.freedesktop.Notifications";

/// Long-lived handle on the notification daemon.
///
/// Every call replaces the previously shown bubble instead of stacking a new one.
pub struct DbusNotifier {
  connection: Connection,
  settings: NotifySettings,
  /// Id of the last notification shown, 0 before the first one.
  last_id: Mutex<u32>,
}

impl DbusNotifier {
  /// Connect to the session bus and make sure a notification daemon answers.
  pub async fn connect(settings: NotifySettings) -> Result<Self, NotifyError> {
    let connection = Connection::session().await?;

    let reply = connection
      .call_method(Some(DESTINATION), PATH, Some(INTERFACE), "GetServerInformation", &())
      .await?;
    let (name, vendor, version, spec_version): (String, String, String, String) = reply.body().deserialize()?;
    log::info!(
      "Notification daemon: {} {} by {} (spec {})",
      name,
      version,
      vendor,
      spec_version
    );

    Ok(Self {
      connection,
      settings,
      last_id: Mutex::new(0),
    })
  }

  /// Show `body`, replacing the previous notification if still on screen.
  pub async fn show(&self, body: &str) -> Result<(), NotifyError> {
    let replaces_id = *self.last_id.lock();
    let actions: Vec<&str> = Vec::new();
    let hints: HashMap<&str, Value<'_>> = HashMap::new();

    let reply = self
      .connection
      .call_method(
        Some(DESTINATION),
        PATH,
        Some(INTERFACE),
        "Notify",
        &(
          self.settings.app_name.as_str(),
          replaces_id,
          self.settings.icon_name.as_str(),
          self.settings.app_name.as_str(),
          body,
          actions,
          hints,
          self.settings.timeout_ms,
        ),
      )
      .await?;

    let id: u32 = reply.body().deserialize()?;
    *self.last_id.lock() = id;
    Ok(())
  }

  /// Withdraw the last notification, if any.
  pub async fn close(&self) -> Result<(), NotifyError> {
    let id = std::mem::take(&mut *self.last_id.lock());
    if id == 0 {
      return Ok(());
    }

    self
      .connection
      .call_method(Some(DESTINATION), PATH, Some(INTERFACE), "CloseNotification", &(id,))
      .await?;
    Ok(())
  }
}
