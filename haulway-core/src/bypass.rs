//! Detour synthesis around corridor features and restricted samples.
//!
//! Candidates are plain waypoint lists computed synchronously from the route
//! and the layer indexes. A [`BypassJob`] then hands each list to the
//! external [`Router`] in turn. The job carries the [`BuildTicket`] of the
//! build it belongs to and gives up as soon as a newer build starts.
//!
//! The corridor detour offsets a midpoint perpendicular to the chord between
//! two route anchors by a distance measured in degrees. A degree of longitude
//! shrinks with latitude, so the physical offset varies with latitude.

use std::sync::Arc;

use crate::restriction::sample_route;
use crate::{
    BuildTicket, Coordinate, Feature, FeatureId, FeatureIndex, Polyline, RestrictionReport,
    RouteBuild, RouteBuildError, RouteOptions, Router, StaleResult, VehicleProfile,
};

/// Most corridor features considered for detours in one build.
pub const MAX_CORRIDOR_BYPASSES: usize = 5;

/// Distance, in route samples, between the nearest sample and each anchor.
pub const ANCHOR_OFFSET: usize = 5;

/// Smallest perpendicular offset of a detour midpoint, in degrees.
pub const MIN_DETOUR_OFFSET_DEG: f64 = 0.002;

/// Largest perpendicular offset of a detour midpoint, in degrees.
pub const MAX_DETOUR_OFFSET_DEG: f64 = 0.01;

/// Offset of a detour midpoint as a fraction of the anchor chord length.
pub const DETOUR_OFFSET_FACTOR: f64 = 0.5;

/// Alternatives requested for each detour route.
pub const BYPASS_ALTERNATIVES: u8 = 1;

/// What a bypass routes around.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum BypassKind {
    /// A corridor feature near the route.
    Corridor {
        /// Feature being avoided.
        feature_id: FeatureId,
    },
    /// The first restricted sample of the route.
    Restriction {
        /// Ordinal of the violating sample.
        sample_index: usize,
    },
}

/// A detour waypoint list ready to be routed.
#[derive(Debug, Clone, PartialEq)]
pub struct BypassCandidate {
    /// What the detour avoids.
    pub kind: BypassKind,
    /// Waypoints spliced in before the destination.
    pub inserted_waypoints: Vec<Coordinate>,
    /// Full waypoint list passed to the router.
    pub waypoints: Vec<Coordinate>,
}

/// A routed detour.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BypassPlan {
    /// What the detour avoids.
    pub kind: BypassKind,
    /// Waypoints spliced in before the destination.
    pub inserted_waypoints: Vec<Coordinate>,
    /// Geometry returned by the router.
    pub polyline: Polyline,
    /// Length of the detour route in metres.
    pub distance_m: f64,
    /// Travel time of the detour route in seconds.
    pub duration_s: f64,
}

impl BypassPlan {
    fn from_build(candidate: BypassCandidate, build: RouteBuild) -> Self {
        Self {
            kind: candidate.kind,
            inserted_waypoints: candidate.inserted_waypoints,
            polyline: build.primary,
            distance_m: build.distance_m,
            duration_s: build.duration_s,
        }
    }
}

/// A candidate the router could not route.
#[derive(Debug, Clone, PartialEq)]
pub struct BypassFailure {
    /// What the detour would have avoided.
    pub kind: BypassKind,
    /// Router error.
    pub error: RouteBuildError,
}

/// Result of a [`BypassJob`] that finished on a current build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BypassOutcome {
    /// Routed detours in candidate order.
    pub plans: Vec<BypassPlan>,
    /// Candidates the router rejected, in candidate order.
    pub failures: Vec<BypassFailure>,
}

/// Midpoint of the `before`→`after` chord pushed perpendicular to it.
///
/// The offset is `DETOUR_OFFSET_FACTOR` times the chord length, clamped to
/// `[MIN_DETOUR_OFFSET_DEG, MAX_DETOUR_OFFSET_DEG]`, applied to the left of
/// the direction of travel in (longitude, latitude) degree space. A
/// zero-length chord is pushed north.
///
/// # Examples
/// ```
/// use haulway_core::Coordinate;
/// use haulway_core::bypass::detour_midpoint;
///
/// let mid = detour_midpoint(Coordinate::new(55.0, 37.0), Coordinate::new(55.0, 37.01));
/// assert!((mid.lon - 37.005).abs() < 1e-9);
/// assert!((mid.lat - 55.005).abs() < 1e-9);
/// ```
pub fn detour_midpoint(before: Coordinate, after: Coordinate) -> Coordinate {
    let d_lat = after.lat - before.lat;
    let d_lon = after.lon - before.lon;
    let chord = d_lat.hypot(d_lon);
    let offset = (chord * DETOUR_OFFSET_FACTOR).clamp(MIN_DETOUR_OFFSET_DEG, MAX_DETOUR_OFFSET_DEG);
    let mid_lat = (before.lat + after.lat) / 2.0;
    let mid_lon = (before.lon + after.lon) / 2.0;
    if chord == 0.0 {
        return Coordinate::new(mid_lat + offset, mid_lon);
    }
    Coordinate::new(mid_lat + d_lon / chord * offset, mid_lon - d_lat / chord * offset)
}

/// `waypoints` with `inserted` placed immediately before the destination.
///
/// An empty list yields `inserted` unchanged.
pub fn splice_before_destination(
    waypoints: &[Coordinate],
    inserted: &[Coordinate],
) -> Vec<Coordinate> {
    let Some((destination, head)) = waypoints.split_last() else {
        return inserted.to_vec();
    };
    head.iter()
        .chain(inserted)
        .chain(std::iter::once(destination))
        .copied()
        .collect()
}

/// Builds detour candidates for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BypassSynthesizer {
    max_corridor: usize,
    anchor_offset: usize,
}

impl Default for BypassSynthesizer {
    fn default() -> Self {
        Self {
            max_corridor: MAX_CORRIDOR_BYPASSES,
            anchor_offset: ANCHOR_OFFSET,
        }
    }
}

impl BypassSynthesizer {
    /// Detours around the first corridor features, in the given order.
    ///
    /// Each feature's representative coordinate is matched to its nearest
    /// route sample; the samples `ANCHOR_OFFSET` positions before and after
    /// it, clamped to the route, anchor the detour.
    pub fn corridor_candidates(
        &self,
        waypoints: &[Coordinate],
        route: &[Coordinate],
        corridor: &[Arc<Feature>],
    ) -> Vec<BypassCandidate> {
        let samples: Vec<Coordinate> = sample_route(route).map(|(_, c)| c).collect();
        if samples.is_empty() {
            return Vec::new();
        }
        corridor
            .iter()
            .take(self.max_corridor)
            .filter_map(|feature| {
                let target = feature.geometry.representative();
                let nearest = nearest_sample(&samples, target)?;
                let before = samples[nearest.saturating_sub(self.anchor_offset)];
                let after = samples[(nearest + self.anchor_offset).min(samples.len() - 1)];
                let inserted = vec![before, detour_midpoint(before, after), after];
                Some(BypassCandidate {
                    kind: BypassKind::Corridor {
                        feature_id: feature.id.clone(),
                    },
                    waypoints: splice_before_destination(waypoints, &inserted),
                    inserted_waypoints: inserted,
                })
            })
            .collect()
    }

    /// Detour through the allowed-zone vertex nearest to the first
    /// violation, if there is one.
    pub fn restriction_candidate(
        &self,
        waypoints: &[Coordinate],
        report: &RestrictionReport,
        allowed: &FeatureIndex,
    ) -> Option<BypassCandidate> {
        let violation = report.first_violation()?;
        let covered = allowed.nearest_covered_point(violation.coordinate)?;
        let inserted = vec![covered];
        Some(BypassCandidate {
            kind: BypassKind::Restriction {
                sample_index: violation.sample_index,
            },
            waypoints: splice_before_destination(waypoints, &inserted),
            inserted_waypoints: inserted,
        })
    }
}

fn nearest_sample(samples: &[Coordinate], target: Coordinate) -> Option<usize> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| (i, crate::geomath::distance(*sample, target)))
        .filter(|(_, d)| d.is_finite())
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Candidates bound to the build they were prepared for.
#[derive(Debug, Clone)]
pub struct BypassJob {
    ticket: BuildTicket,
    options: RouteOptions,
    candidates: Vec<BypassCandidate>,
}

impl BypassJob {
    /// Bundle `candidates` for routing under `ticket`.
    pub fn new(
        ticket: BuildTicket,
        profile: VehicleProfile,
        candidates: Vec<BypassCandidate>,
    ) -> Self {
        Self {
            ticket,
            options: RouteOptions::for_profile(profile).with_alternatives(BYPASS_ALTERNATIVES),
            candidates,
        }
    }

    /// Ticket of the build the job belongs to.
    pub fn ticket(&self) -> &BuildTicket {
        &self.ticket
    }

    /// Candidates in routing order.
    pub fn candidates(&self) -> &[BypassCandidate] {
        &self.candidates
    }

    /// Route every candidate in order.
    ///
    /// Router failures drop the candidate and are recorded in
    /// [`BypassOutcome::failures`]. The ticket is checked before and after
    /// each router call; a stale ticket abandons the remaining candidates.
    pub async fn run<R>(self, router: &R) -> Result<BypassOutcome, StaleResult>
    where
        R: Router + ?Sized,
    {
        let mut outcome = BypassOutcome::default();
        for candidate in self.candidates {
            self.ticket.ensure_current()?;
            let result = router.build(&candidate.waypoints, &self.options).await;
            self.ticket.ensure_current()?;
            match result {
                Ok(build) => outcome.plans.push(BypassPlan::from_build(candidate, build)),
                Err(error) => {
                    log::warn!("Omitting bypass {:?}: {error}", candidate.kind);
                    outcome.failures.push(BypassFailure {
                        kind: candidate.kind,
                        error,
                    });
                }
            }
        }
        Ok(outcome)
    }
}
