//! Vehicle profiles: which permission rule applies to a route.
//!
//! Cars are exempt from every corridor and restriction check. Light trucks
//! may use allowed and conditional zones; heavy trucks only allowed ones.

use std::str::FromStr;

use thiserror::Error;

/// Coverage tolerance for light trucks, in metres.
pub const LIGHT_TRUCK_TOLERANCE_M: f64 = 120.0;

/// Coverage tolerance for heavy trucks, in metres.
pub const HEAVY_TRUCK_TOLERANCE_M: f64 = 150.0;

/// Vehicle class selecting the restriction rule.
///
/// # Examples
/// ```
/// use haulway_core::VehicleProfile;
///
/// let profile: VehicleProfile = "truck40".parse()?;
/// assert_eq!(profile, VehicleProfile::TruckLight);
/// assert!("car".parse::<VehicleProfile>()?.is_exempt());
/// # Ok::<(), haulway_core::ProfileParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum VehicleProfile {
    /// Passenger car; never restricted.
    Auto,
    /// Truck up to 40 t.
    #[default]
    TruckLight,
    /// Truck above 40 t.
    TruckHeavy,
}

impl VehicleProfile {
    /// Canonical tag of the profile.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::TruckLight => "truckLight",
            Self::TruckHeavy => "truckHeavy",
        }
    }

    /// Whether the profile skips corridor and restriction checks.
    pub const fn is_exempt(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Whether only unconditionally allowed zones satisfy the profile.
    pub const fn is_heavy(self) -> bool {
        matches!(self, Self::TruckHeavy)
    }

    /// Distance within which a zone still covers a route sample, or `None`
    /// for exempt profiles.
    pub const fn coverage_tolerance_m(self) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::TruckLight => Some(LIGHT_TRUCK_TOLERANCE_M),
            Self::TruckHeavy => Some(HEAVY_TRUCK_TOLERANCE_M),
        }
    }
}

impl std::fmt::Display for VehicleProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a profile tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown vehicle profile {0:?}")]
pub struct ProfileParseError(pub String);

impl FromStr for VehicleProfile {
    type Err = ProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "car" => Ok(Self::Auto),
            "trucklight" | "truck40" | "truck" => Ok(Self::TruckLight),
            "truckheavy" | "truck60" => Ok(Self::TruckHeavy),
            _ => Err(ProfileParseError(s.to_owned())),
        }
    }
}
