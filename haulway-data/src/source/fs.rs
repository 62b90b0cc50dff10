//! Layers read from local directories.

use std::io;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use haulway_core::{FeatureCollection, FeatureSource, Layer, LayerLoadError};

use crate::parse_layer;

/// Directories probed after the configured root, in order.
pub const FALLBACK_DIRS: [&str; 3] = ["../data", "data", "/data"];

/// Reads layer artefacts from the first directory that has them.
///
/// # Example
///
/// ```no_run
/// use haulway_core::{FeatureSource, Layer};
/// use haulway_data::FsFeatureSource;
///
/// # async fn demo() -> Result<(), haulway_core::LayerLoadError> {
/// let source = FsFeatureSource::new("public/data").with_default_fallbacks();
/// let frames = source.load(Layer::Frames).await?;
/// println!("{} frames", frames.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsFeatureSource {
    roots: Vec<Utf8PathBuf>,
}

impl FsFeatureSource {
    /// Read layers from `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// Probe `root` when earlier directories lack an artefact.
    #[must_use]
    pub fn with_fallback(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Append [`FALLBACK_DIRS`].
    #[must_use]
    pub fn with_default_fallbacks(self) -> Self {
        FALLBACK_DIRS
            .into_iter()
            .fold(self, |source, dir| source.with_fallback(dir))
    }

    /// Directories probed, in order.
    pub fn roots(&self) -> &[Utf8PathBuf] {
        &self.roots
    }

    /// Candidate paths for `layer`, in probe order.
    pub fn candidates(&self, layer: Layer) -> Vec<Utf8PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(layer.file_name()))
            .collect()
    }
}

#[async_trait]
impl FeatureSource for FsFeatureSource {
    async fn load(&self, layer: Layer) -> Result<FeatureCollection, LayerLoadError> {
        let roots = self.roots.clone();
        tokio::task::spawn_blocking(move || read_layer(&roots, layer))
            .await
            .map_err(|err| LayerLoadError::Unreachable {
                layer,
                location: layer.file_name().to_owned(),
                message: err.to_string(),
            })?
    }
}

fn read_layer(roots: &[Utf8PathBuf], layer: Layer) -> Result<FeatureCollection, LayerLoadError> {
    let (path, text) = read_first(roots, layer)?;
    log::debug!("Reading layer {layer} from {path}");
    parse_layer(&text, layer).map_err(|err| LayerLoadError::Malformed {
        layer,
        location: path.to_string(),
        message: err.to_string(),
    })
}

/// Contents of the first readable candidate.
///
/// Missing files fall through to the next root. When no root has the file
/// and at least one read failed for another reason, the last such failure
/// is reported.
fn read_first(
    roots: &[Utf8PathBuf],
    layer: Layer,
) -> Result<(Utf8PathBuf, String), LayerLoadError> {
    let name = layer.file_name();
    let mut tried = Vec::with_capacity(roots.len());
    let mut last_failure = None;
    for root in roots {
        let path = root.join(name);
        match read_utf8(root, name) {
            Ok(text) => return Ok((path, text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("Layer {layer} not found at {path}");
            }
            Err(err) => {
                log::warn!("Failed to read layer {layer} from {path}: {err}");
                last_failure = Some((path.clone(), err));
            }
        }
        tried.push(path.into_string());
    }
    match last_failure {
        Some((path, err)) => Err(LayerLoadError::Unreachable {
            layer,
            location: path.into_string(),
            message: err.to_string(),
        }),
        None => Err(LayerLoadError::NotFound { layer, tried }),
    }
}

fn read_utf8(root: &Utf8Path, name: &str) -> io::Result<String> {
    let dir = Dir::open_ambient_dir(root, ambient_authority())?;
    dir.read_to_string(name)
}
