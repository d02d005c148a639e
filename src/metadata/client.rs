//! HTTP client for the live metadata endpoint, and the retrying poller.

use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::{header, Client};

use super::error::MetadataError;
use super::types::{LiveMeta, TrackMetadata};

/// Something that can tell which track is on air.
pub trait TrackSource: Send + Sync {
  fn fetch(&self) -> BoxFuture<'_, Result<TrackMetadata, MetadataError>>;
}

impl<T: TrackSource + ?Sized> TrackSource for std::sync::Arc<T> {
  fn fetch(&self) -> BoxFuture<'_, Result<TrackMetadata, MetadataError>> {
    (**self).fetch()
  }
}

/// Live metadata HTTP client.
pub struct MetadataClient {
  http: Client,
  url: String,
}

impl MetadataClient {
  /// Create a client for `url`; every fetch is bounded by `timeout`.
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, MetadataError> {
    let http = Client::builder()
      .timeout(timeout)
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      url: url.into(),
    })
  }

  /// Fetch and decode the whole live metadata document.
  pub async fn fetch_live_meta(&self) -> Result<LiveMeta, MetadataError> {
    let response = self
      .http
      .get(&self.url)
      .header(header::ACCEPT, "application/json")
      .send()
      .await
      .map_err(timeout_or_http)?;

    if !response.status().is_success() {
      return Err(MetadataError::HttpStatus(response.status()));
    }

    let body = response.bytes().await.map_err(timeout_or_http)?;
    Ok(serde_json::from_slice(&body)?)
  }
}

fn timeout_or_http(e: reqwest::Error) -> MetadataError {
  if e.is_timeout() {
    MetadataError::Timeout
  } else {
    MetadataError::Http(e)
  }
}

impl TrackSource for MetadataClient {
  fn fetch(&self) -> BoxFuture<'_, Result<TrackMetadata, MetadataError>> {
    Box::pin(async move { self.fetch_live_meta().await?.current_track() })
  }
}

/// Polls a [`TrackSource`] until it yields a track.
pub struct MetadataPoller<S> {
  source: S,
  retry_delay: Duration,
}

impl<S: TrackSource> MetadataPoller<S> {
  pub fn new(source: S, retry_delay: Duration) -> Self {
    Self {
      source,
      retry_delay,
    }
  }

  /// Fetch the current track, retrying after `retry_delay` on any failure.
  ///
  /// Never fails; only returns once a fetch succeeds.
  pub async fn poll(&self) -> TrackMetadata {
    let mut failures: u64 = 0;
    loop {
      match self.source.fetch().await {
        Ok(track) => {
          if failures > 0 {
            log::info!("Metadata fetch recovered after {} failures", failures);
          }
          return track;
        }
        Err(e) => {
          failures += 1;
          if failures == 1 {
            log::warn!("Metadata fetch failed, retrying: {}", e);
          } else {
            log::debug!("Metadata fetch attempt {} failed: {}", failures, e);
          }
          tokio::time::sleep(self.retry_delay).await;
        }
      }
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use parking_lot::Mutex;
  use std::collections::VecDeque;

  /// Replays scripted fetch results, then repeats the last track forever.
  pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Result<TrackMetadata, MetadataError>>>,
    last: Mutex<Option<TrackMetadata>>,
    pub(crate) calls: Mutex<usize>,
  }

  impl ScriptedSource {
    pub(crate) fn new(script: Vec<Result<TrackMetadata, MetadataError>>) -> Self {
      Self {
        script: Mutex::new(script.into()),
        last: Mutex::new(None),
        calls: Mutex::new(0),
      }
    }
  }

  impl TrackSource for ScriptedSource {
    fn fetch(&self) -> BoxFuture<'_, Result<TrackMetadata, MetadataError>> {
      Box::pin(async move {
        *self.calls.lock() += 1;
        let next = self.script.lock().pop_front();
        match next {
          Some(Ok(track)) => {
            *self.last.lock() = Some(track.clone());
            Ok(track)
          }
          Some(Err(e)) => Err(e),
          None => self.last.lock().clone().ok_or(MetadataError::NoLevels),
        }
      })
    }
  }

  pub(crate) fn track(title: &str, authors: &str) -> TrackMetadata {
    TrackMetadata {
      title: title.into(),
      authors: authors.into(),
      release_year: "?".into(),
    }
  }

  fn malformed() -> MetadataError {
    serde_json::from_str::<LiveMeta>("{not json").unwrap_err().into()
  }

  #[tokio::test]
  async fn test_poll_retries_until_success() {
    let source = ScriptedSource::new(vec![
      Err(malformed()),
      Err(MetadataError::PositionOutOfRange { position: 2, len: 1 }),
      Ok(track("X", "Y")),
    ]);
    let poller = MetadataPoller::new(source, Duration::from_millis(1));

    assert_eq!(poller.poll().await, track("X", "Y"));
    assert_eq!(*poller.source.calls.lock(), 3);
  }

  #[tokio::test]
  async fn test_poll_first_try() {
    let poller = MetadataPoller::new(ScriptedSource::new(vec![Ok(track("A", "B"))]), Duration::from_secs(60));
    assert_eq!(poller.poll().await, track("A", "B"));
    assert_eq!(*poller.source.calls.lock(), 1);
  }

  #[tokio::test]
  async fn test_unreachable_endpoint_is_an_error() {
    let client = MetadataClient::new("http://127.0.0.1:9/livemeta", Duration::from_secs(2)).unwrap();
    assert!(client.fetch().await.is_err());
  }

  /// Serve one HTTP request on a local port with a canned response; returns the URL.
  async fn serve_once(status: &'static str, body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
      let (mut stream, _) = listener.accept().await.unwrap();
      let mut request = Vec::new();
      let mut buf = [0u8; 1024];
      while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
          break;
        }
        request.extend_from_slice(&buf[..n]);
      }

      let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
      );
      stream.write_all(response.as_bytes()).await.unwrap();
      stream.shutdown().await.ok();
    });

    format!("http://{}/livemeta", addr)
  }

  #[tokio::test]
  async fn test_fetch_decodes_served_document() {
    let url = serve_once(
      "200 OK",
      r#"{"levels": [{"items": ["a", "b"], "position": 1}],
          "steps": {"a": {"title": "Old"}, "b": {"title": "Blue in Green", "authors": "Miles Davis", "anneeEditionMusique": 1959}}}"#,
    )
    .await;
    let client = MetadataClient::new(url, Duration::from_secs(5)).unwrap();

    let track = client.fetch().await.unwrap();
    assert_eq!(track.title, "Blue in Green");
    assert_eq!(track.authors, "Miles Davis");
    assert_eq!(track.release_year, "1959");
  }

  #[tokio::test]
  async fn test_fetch_rejects_error_status() {
    let url = serve_once("503 Service Unavailable", "{}").await;
    let client = MetadataClient::new(url, Duration::from_secs(5)).unwrap();

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, MetadataError::HttpStatus(status) if status.as_u16() == 503));
  }

  #[tokio::test]
  async fn test_fetch_rejects_malformed_body() {
    let url = serve_once("200 OK", "<html>maintenance</html>").await;
    let client = MetadataClient::new(url, Duration::from_secs(5)).unwrap();

    assert!(matches!(client.fetch().await, Err(MetadataError::Json(_))));
  }

  #[tokio::test]
  async fn test_silent_endpoint_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/livemeta", listener.local_addr().unwrap());
    let held = tokio::spawn(async move {
      let (stream, _) = listener.accept().await.unwrap();
      tokio::time::sleep(Duration::from_secs(10)).await;
      drop(stream);
    });
    let client = MetadataClient::new(url, Duration::from_millis(200)).unwrap();

    assert!(matches!(client.fetch().await, Err(MetadataError::Timeout)));
    held.abort();
  }
}
