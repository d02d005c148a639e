//! Live metadata module.
//!
//! Fetches the station's live metadata document and resolves the track on air.

mod client;
mod error;
mod types;

pub use client::{MetadataClient, MetadataPoller, TrackSource};
pub use error::MetadataError;
pub use types::{LiveMeta, Level, Step, TrackMetadata, UNKNOWN_FIELD};

#[cfg(test)]
pub(crate) use client::tests as testing;
