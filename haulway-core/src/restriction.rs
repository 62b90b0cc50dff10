//! Zone coverage checks along a route.
//!
//! A route is sampled at a fixed stride and every sample is tested against
//! the allowed zones and, for light trucks, the conditional zones. Samples
//! covered by neither are reported as violations.

use crate::{Coordinate, FeatureIndex, VehicleProfile};

/// Upper bound on the number of samples taken from a route.
pub const MAX_SAMPLES: usize = 200;

/// Stride between samples for a route of `len` vertices.
///
/// # Examples
/// ```
/// use haulway_core::restriction::sample_stride;
///
/// assert_eq!(sample_stride(10), 1);
/// assert_eq!(sample_stride(450), 2);
/// ```
pub fn sample_stride(len: usize) -> usize {
    sample_stride_for(len, MAX_SAMPLES)
}

fn sample_stride_for(len: usize, max_samples: usize) -> usize {
    (len / max_samples.max(1)).max(1)
}

/// Route vertices at indices `0, stride, 2 * stride, ...` paired with their
/// index into `route`.
pub fn sample_route(route: &[Coordinate]) -> impl Iterator<Item = (usize, Coordinate)> + '_ {
    sample_with_stride(route, sample_stride(route.len()))
}

fn sample_with_stride(
    route: &[Coordinate],
    stride: usize,
) -> impl Iterator<Item = (usize, Coordinate)> + '_ {
    route.iter().copied().enumerate().step_by(stride)
}

/// A route sample outside every permitted zone.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Violation {
    /// Ordinal of the sample among the samples taken.
    pub sample_index: usize,
    /// Index of the sampled vertex in the route.
    pub route_index: usize,
    /// Position of the sample.
    pub coordinate: Coordinate,
}

/// Outcome of a restriction check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictionReport {
    /// Profile the route was checked for.
    pub profile: VehicleProfile,
    /// Number of samples tested.
    pub samples_taken: usize,
    /// Uncovered samples in route order.
    pub violations: Vec<Violation>,
}

impl RestrictionReport {
    /// A report with no samples and no violations.
    pub fn empty(profile: VehicleProfile) -> Self {
        Self {
            profile,
            samples_taken: 0,
            violations: Vec::new(),
        }
    }

    /// Whether every sample was covered.
    pub fn is_clear(&self) -> bool {
        self.violations.is_empty()
    }

    /// First uncovered sample, if any.
    pub fn first_violation(&self) -> Option<&Violation> {
        self.violations.first()
    }

    /// One-line human-readable count.
    pub fn summary(&self) -> String {
        if self.violations.is_empty() {
            format!("{}: no restricted samples", self.profile)
        } else {
            format!(
                "{}: {} of {} samples outside permitted zones",
                self.profile,
                self.violations.len(),
                self.samples_taken
            )
        }
    }
}

impl std::fmt::Display for RestrictionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Samples a route and tests each sample against zone indexes.
///
/// # Examples
/// ```
/// use haulway_core::{Coordinate, FeatureIndex, RestrictionChecker, VehicleProfile};
///
/// let route = [Coordinate::new(55.0, 37.0), Coordinate::new(55.1, 37.1)];
/// let empty = FeatureIndex::empty();
/// let report = RestrictionChecker::default().check(
///     &route,
///     VehicleProfile::TruckHeavy,
///     &empty,
///     &empty,
/// );
/// assert!(report.is_clear());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictionChecker {
    max_samples: usize,
}

impl Default for RestrictionChecker {
    fn default() -> Self {
        Self {
            max_samples: MAX_SAMPLES,
        }
    }
}

impl RestrictionChecker {
    /// Checker with a custom sample budget.
    pub fn with_max_samples(max_samples: usize) -> Self {
        Self { max_samples }
    }

    /// Report the samples of `route` not covered for `profile`.
    ///
    /// Heavy trucks accept only `allowed`; light trucks accept `allowed` or
    /// `conditional`. Exempt profiles, routes shorter than two points and a
    /// pair of empty indexes produce an empty report.
    pub fn check(
        &self,
        route: &[Coordinate],
        profile: VehicleProfile,
        allowed: &FeatureIndex,
        conditional: &FeatureIndex,
    ) -> RestrictionReport {
        let Some(tolerance) = profile.coverage_tolerance_m() else {
            return RestrictionReport::empty(profile);
        };
        if route.len() < 2 || (allowed.is_empty() && conditional.is_empty()) {
            return RestrictionReport::empty(profile);
        }

        let stride = sample_stride_for(route.len(), self.max_samples);
        let mut samples_taken = 0;
        let mut violations = Vec::new();
        for (sample_index, (route_index, coordinate)) in
            sample_with_stride(route, stride).enumerate()
        {
            samples_taken += 1;
            let covered = allowed.is_point_covered(coordinate, tolerance)
                || (!profile.is_heavy() && conditional.is_point_covered(coordinate, tolerance));
            if !covered {
                violations.push(Violation {
                    sample_index,
                    route_index,
                    coordinate,
                });
            }
        }
        log::debug!(
            "Checked {samples_taken} samples for {profile}: {} violations",
            violations.len()
        );
        RestrictionReport {
            profile,
            samples_taken,
            violations,
        }
    }
}
