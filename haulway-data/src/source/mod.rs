//! [`haulway_core::FeatureSource`] adapters for published layers.
//!
//! Both adapters resolve a layer to its artefact name
//! ([`haulway_core::Layer::file_name`]) and decode it with
//! [`crate::parse_layer`]. Failures map onto
//! [`haulway_core::LayerLoadError`]: a missing artefact is `NotFound`, an
//! I/O or transport failure is `Unreachable`, and an undecodable document is
//! `Malformed`.

mod fs;
mod http;

pub use fs::{FALLBACK_DIRS, FsFeatureSource};
pub use http::{HttpFeatureSource, HttpFeatureSourceConfig, SourceBuildError};
