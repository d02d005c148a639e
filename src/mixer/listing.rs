//! Scanner for `pacmd list-sink-inputs` output.
//!
//! Lines are handled as raw bytes: property values come back already escaped
//! by pacmd and are not guaranteed to be valid UTF-8.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const INDEX_PREFIX: &[u8] = b"index:";
const DEFAULT_INDEX_PREFIX: &[u8] = b"* index:";
const MUTED_PREFIX: &[u8] = b"muted:";
const APP_NAME_KEY: &[u8] = b"application.name";
const PROCESS_BINARY_KEY: &[u8] = b"application.process.binary";

/// Sink input being accumulated while scanning the listing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SinkInputRecord {
  /// Opaque index, as printed by the mixer.
  pub index: Option<Vec<u8>>,
  /// `None` until the record's `muted:` line has been seen.
  pub muted: Option<bool>,
  pub application_name: Option<Vec<u8>>,
  pub process_binary: Option<Vec<u8>>,
}

impl SinkInputRecord {
  /// Feed one trimmed line into the record.
  ///
  /// An `index:` line resets the record; the caller sees a fresh accumulator.
  pub fn feed(&mut self, line: &[u8]) {
    if let Some(rest) = strip_index_prefix(line) {
      *self = Self {
        index: last_token(rest).map(<[u8]>::to_vec),
        ..Self::default()
      };
    } else if let Some(rest) = line.strip_prefix(MUTED_PREFIX) {
      self.muted = Some(trim(rest) != b"no");
    } else if let Some(value) = property_value(line, APP_NAME_KEY) {
      self.application_name = Some(value.to_vec());
    } else if let Some(value) = property_value(line, PROCESS_BINARY_KEY) {
      self.process_binary = Some(value.to_vec());
    }
  }
}

/// Does this listing line identify the player's sink input?
///
/// Either `application.name` mentions `[player]`, or the quoted
/// `application.process.binary` value is exactly `player`.
pub fn is_player_line(line: &[u8], player: &str) -> bool {
  let player = player.as_bytes();

  if line.starts_with(APP_NAME_KEY) {
    let mut needle = Vec::with_capacity(player.len() + 2);
    needle.push(b'[');
    needle.extend_from_slice(player);
    needle.push(b']');
    return contains(line, &needle);
  }

  if let Some(value) = property_value(line, PROCESS_BINARY_KEY) {
    return unquote(value) == Some(player);
  }

  false
}

/// Scan a listing until the first sink input belonging to `player`.
///
/// Matching is evaluated on every line against the record as accumulated so
/// far, and stops at the first hit. A hit is only taken once the current
/// record has an index.
pub async fn find_player_input<R>(mut reader: R, player: &str) -> io::Result<Option<SinkInputRecord>>
where
  R: AsyncBufRead + Unpin,
{
  let mut record = SinkInputRecord::default();
  let mut buf = Vec::new();

  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
      return Ok(None);
    }

    let line = trim(&buf);
    record.feed(line);

    if record.index.is_some() && is_player_line(line, player) {
      return Ok(Some(record));
    }
  }
}

fn strip_index_prefix(line: &[u8]) -> Option<&[u8]> {
  line
    .strip_prefix(INDEX_PREFIX)
    .or_else(|| line.strip_prefix(DEFAULT_INDEX_PREFIX))
}

/// Value part of a `key = value` property line, if the line is for `key`.
fn property_value<'a>(line: &'a [u8], key: &[u8]) -> Option<&'a [u8]> {
  let rest = trim(line.strip_prefix(key)?);
  rest.strip_prefix(b"=").map(trim)
}

fn unquote(value: &[u8]) -> Option<&[u8]> {
  value.strip_prefix(b"\"")?.strip_suffix(b"\"")
}

fn last_token(bytes: &[u8]) -> Option<&[u8]> {
  bytes
    .split(|b| b.is_ascii_whitespace())
    .filter(|token| !token.is_empty())
    .last()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
  haystack.windows(needle.len()).any(|window| window == needle)
}

fn trim(mut bytes: &[u8]) -> &[u8] {
  while let [first, rest @ ..] = bytes {
    if !first.is_ascii_whitespace() {
      break;
    }
    bytes = rest;
  }
  while let [rest @ .., last] = bytes {
    if !last.is_ascii_whitespace() {
      break;
    }
    bytes = rest;
  }
  bytes
}
