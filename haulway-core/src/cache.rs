//! Session cache of layer indexes.
//!
//! Feature collections are loaded once per layer and kept for the session.
//! The cache is an explicit object owned by the engine controller and passed
//! around by reference; invalidation is always an explicit call.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{FeatureCollection, FeatureIndex, FeatureSource, Layer, LayerLoadError};

/// Indexed layers keyed by [`Layer`].
///
/// # Examples
/// ```
/// use haulway_core::{FeatureCollection, Layer, LayerCache};
///
/// let mut cache = LayerCache::new();
/// cache.insert(Layer::Frames, &FeatureCollection::new());
/// assert!(cache.get(Layer::Frames).is_some());
/// cache.invalidate(Layer::Frames);
/// assert!(cache.get(Layer::Frames).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayerCache {
    entries: HashMap<Layer, Arc<FeatureIndex>>,
}

impl LayerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `collection` and store it for `layer`, replacing any previous
    /// entry.
    pub fn insert(&mut self, layer: Layer, collection: &FeatureCollection) -> Arc<FeatureIndex> {
        let index = Arc::new(FeatureIndex::new(collection));
        self.entries.insert(layer, Arc::clone(&index));
        index
    }

    /// Cached index for `layer`, if loaded.
    pub fn get(&self, layer: Layer) -> Option<Arc<FeatureIndex>> {
        self.entries.get(&layer).cloned()
    }

    /// Cached index for `layer`, or an empty index when the layer is not
    /// available.
    pub fn get_or_empty(&self, layer: Layer) -> Arc<FeatureIndex> {
        self.get(layer)
            .unwrap_or_else(|| Arc::new(FeatureIndex::empty()))
    }

    /// Whether `layer` has been loaded.
    pub fn contains(&self, layer: Layer) -> bool {
        self.entries.contains_key(&layer)
    }

    /// Drop the cached index for `layer`.
    pub fn invalidate(&mut self, layer: Layer) {
        self.entries.remove(&layer);
    }

    /// Drop every cached index.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Return the cached index for `layer`, loading it from `source` on a
    /// miss.
    ///
    /// Failures are not cached, so a later call retries the load.
    pub async fn load<S>(
        &mut self,
        source: &S,
        layer: Layer,
    ) -> Result<Arc<FeatureIndex>, LayerLoadError>
    where
        S: FeatureSource + ?Sized,
    {
        if let Some(index) = self.get(layer) {
            return Ok(index);
        }
        let collection = source.load(layer).await?;
        log::info!(
            "Loaded layer {layer}: {} features ({})",
            collection.len(),
            summarise_kinds(&collection)
        );
        Ok(self.insert(layer, &collection))
    }
}

fn summarise_kinds(collection: &FeatureCollection) -> String {
    collection
        .kind_counts()
        .into_iter()
        .map(|(kind, count)| format!("{kind}:{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
