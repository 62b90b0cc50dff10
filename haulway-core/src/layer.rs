//! Restriction layers known to the engine.

use std::str::FromStr;

use thiserror::Error;

/// A named feature layer.
///
/// # Examples
/// ```
/// use haulway_core::Layer;
///
/// let layer: Layer = "hgv_allowed".parse()?;
/// assert_eq!(layer, Layer::HgvAllowed);
/// assert_eq!(layer.file_name(), "hgv_allowed.geojson");
/// # Ok::<(), haulway_core::LayerParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Layer {
    /// Weight-limit control frames.
    Frames,
    /// Zones where heavy goods vehicles are allowed unconditionally.
    HgvAllowed,
    /// Zones where heavy goods vehicles are allowed under conditions.
    HgvConditional,
    /// Federal road segments.
    Federal,
}

impl Layer {
    /// Every layer, in display order.
    pub const ALL: [Self; 4] = [
        Self::Frames,
        Self::HgvAllowed,
        Self::HgvConditional,
        Self::Federal,
    ];

    /// Camel-case layer name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Frames => "frames",
            Self::HgvAllowed => "hgvAllowed",
            Self::HgvConditional => "hgvConditional",
            Self::Federal => "federal",
        }
    }

    /// Prefix used to namespace numeric feature ids of this layer.
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Frames => "frame",
            Self::HgvAllowed | Self::HgvConditional | Self::Federal => "obj",
        }
    }

    /// File name of the published GeoJSON artefact.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Frames => "frames_ready.geojson",
            Self::HgvAllowed => "hgv_allowed.geojson",
            Self::HgvConditional => "hgv_conditional.geojson",
            Self::Federal => "federal.geojson",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a layer name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown layer {0:?}")]
pub struct LayerParseError(pub String);

impl FromStr for Layer {
    type Err = LayerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalised.as_str() {
            "frames" | "framesready" => Ok(Self::Frames),
            "hgvallowed" => Ok(Self::HgvAllowed),
            "hgvconditional" => Ok(Self::HgvConditional),
            "federal" => Ok(Self::Federal),
            _ => Err(LayerParseError(s.to_owned())),
        }
    }
}
