//! Live metadata document and the normalized track record.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::MetadataError;

/// Placeholder for fields the remote step does not provide.
pub const UNKNOWN_FIELD: &str = "?";

const TITLE_KEY: &str = "title";
const AUTHORS_KEY: &str = "authors";
const RELEASE_YEAR_KEY: &str = "anneeEditionMusique";

/// Live metadata document as served by the endpoint.
///
/// Only the last level and the step it points to are ever read, so everything
/// else is kept as raw JSON and may be in any shape.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveMeta {
  pub levels: Vec<Value>,
  pub steps: Map<String, Value>,
}

/// One granularity of playback info; `items[position]` is the step on air.
///
/// A negative `position` counts from the end of `items`.
#[derive(Debug, Clone, Deserialize)]
pub struct Level {
  pub items: Vec<Value>,
  pub position: i64,
}

/// Raw track-like record, keyed by an opaque id in [`LiveMeta::steps`].
pub type Step = Map<String, Value>;

impl Level {
  /// Id of the step on air.
  pub fn current_id(&self) -> Result<String, MetadataError> {
    let len = self.items.len();
    let index = if self.position < 0 {
      len as i64 + self.position
    } else {
      self.position
    };

    let item = usize::try_from(index)
      .ok()
      .and_then(|index| self.items.get(index))
      .ok_or(MetadataError::PositionOutOfRange {
        position: self.position,
        len,
      })?;

    Ok(match item {
      Value::String(id) => id.clone(),
      other => other.to_string(),
    })
  }
}

impl LiveMeta {
  /// The last level, the only one describing what is on air right now.
  pub fn current_level(&self) -> Result<Level, MetadataError> {
    let level = self.levels.last().ok_or(MetadataError::NoLevels)?;
    Level::deserialize(level).map_err(MetadataError::InvalidLevel)
  }

  /// Resolve the step currently on air: last level, then `items[position]`.
  pub fn current_step(&self) -> Result<&Step, MetadataError> {
    let id = self.current_level()?.current_id()?;
    match self.steps.get(&id) {
      Some(Value::Object(step)) => Ok(step),
      Some(_) => Err(MetadataError::InvalidStep(id)),
      None => Err(MetadataError::StepNotFound(id)),
    }
  }

  pub fn current_track(&self) -> Result<TrackMetadata, MetadataError> {
    self.current_step().map(TrackMetadata::from_step)
  }
}

/// The fields of the track on air that notifications care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
  pub title: String,
  pub authors: String,
  pub release_year: String,
}

impl TrackMetadata {
  pub fn from_step(step: &Step) -> Self {
    Self {
      title: field(step, TITLE_KEY),
      authors: field(step, AUTHORS_KEY),
      release_year: field(step, RELEASE_YEAR_KEY),
    }
  }
}

fn field(step: &Step, key: &str) -> String {
  match step.get(key) {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    Some(Value::Bool(b)) => b.to_string(),
    _ => UNKNOWN_FIELD.to_string(),
  }
}

impl fmt::Display for TrackMetadata {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\n{} ({})", self.title, self.authors, self.release_year)
  }
}
