//! Contract for loading feature layers.

use async_trait::async_trait;
use thiserror::Error;

use crate::{FeatureCollection, Layer};

/// Errors from [`FeatureSource::load`].
///
/// Every variant means "layer unavailable"; none of them is fatal to the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerLoadError {
    /// No artefact exists for the layer at any known location.
    #[error("layer {layer} not found (tried {tried:?})")]
    NotFound {
        /// Requested layer.
        layer: Layer,
        /// Locations that were tried, in order.
        tried: Vec<String>,
    },
    /// The artefact exists but could not be fetched or read.
    #[error("layer {layer} is unreachable at {location}: {message}")]
    Unreachable {
        /// Requested layer.
        layer: Layer,
        /// Path or URL that failed.
        location: String,
        /// Underlying error description.
        message: String,
    },
    /// The artefact was read but is not a usable feature collection.
    #[error("layer {layer} at {location} is malformed: {message}")]
    Malformed {
        /// Requested layer.
        layer: Layer,
        /// Path or URL that was read.
        location: String,
        /// Decoder error description.
        message: String,
    },
}

impl LayerLoadError {
    /// Layer the error refers to.
    pub fn layer(&self) -> Layer {
        match self {
            Self::NotFound { layer, .. }
            | Self::Unreachable { layer, .. }
            | Self::Malformed { layer, .. } => *layer,
        }
    }
}

/// Loads the feature collection backing a layer.
///
/// Implementations perform I/O and are awaited before a
/// [`FeatureIndex`](crate::FeatureIndex) can be built. Callers cache the
/// result for the session through [`LayerCache`](crate::LayerCache).
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Fetch and validate the features of `layer`.
    async fn load(&self, layer: Layer) -> Result<FeatureCollection, LayerLoadError>;
}
