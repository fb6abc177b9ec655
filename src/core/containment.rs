use crate::core::geometry::{degree_distance, local_distance_km, polygon_contains};
use crate::core::speed::SpeedModel;
use crate::domain::model::{FilterResult, IsochroneSet, Poi, PoiCategory, Ring};
use crate::utils::error::{IsochroneError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Degrees of reach per minute used by [`Containment::DegreeBudget`].
pub const DEFAULT_DEGREES_PER_MINUTE: f64 = 0.002;

/// How membership in a ring is decided.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Containment {
    /// Exact point-in-polygon against the ring boundary.
    #[default]
    Polygon,
    /// Approximation: km distance from the origin against the speed-model
    /// reach for the set's mode. Ignores the ring's shape bias.
    ReachRadius,
    /// Approximation: raw degree-space distance from the origin against
    /// `minutes * degrees_per_minute`. Ignores mode and latitude.
    DegreeBudget { degrees_per_minute: f64 },
}

impl Containment {
    pub fn degree_budget() -> Self {
        Containment::DegreeBudget {
            degrees_per_minute: DEFAULT_DEGREES_PER_MINUTE,
        }
    }
}

impl FromStr for Containment {
    type Err = IsochroneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polygon" => Ok(Containment::Polygon),
            "reach-radius" | "reach_radius" => Ok(Containment::ReachRadius),
            "degree-budget" | "degree_budget" => Ok(Containment::degree_budget()),
            other => Err(IsochroneError::InvalidConfigValueError {
                field: "containment".to_string(),
                value: other.to_string(),
                reason: "expected one of polygon, reach-radius, degree-budget".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContainmentFilter {
    containment: Containment,
    speeds: SpeedModel,
    min_rating: Option<f64>,
}

impl ContainmentFilter {
    pub fn new(containment: Containment) -> Self {
        Self {
            containment,
            ..Self::default()
        }
    }

    pub fn with_speeds(mut self, speeds: SpeedModel) -> Self {
        self.speeds = speeds;
        self
    }

    /// Unrated POIs are dropped once a minimum is set.
    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn containment(&self) -> Containment {
        self.containment
    }

    /// POIs of a requested category that lie inside the ring for
    /// `selected_minutes`, in input order. A missing ring yields an empty
    /// result.
    pub fn filter_pois<'a>(
        &self,
        pois: &'a [Poi],
        categories: &[PoiCategory],
        set: &IsochroneSet,
        selected_minutes: u32,
    ) -> FilterResult<'a> {
        match self.try_filter_pois(pois, categories, set, selected_minutes) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(minutes = selected_minutes, "{}", e);
                FilterResult::empty(selected_minutes)
            }
        }
    }

    /// Like [`filter_pois`](Self::filter_pois) but reports a missing ring as
    /// `NoMatchingThreshold`.
    pub fn try_filter_pois<'a>(
        &self,
        pois: &'a [Poi],
        categories: &[PoiCategory],
        set: &IsochroneSet,
        selected_minutes: u32,
    ) -> Result<FilterResult<'a>> {
        let ring = set
            .ring_for_minutes(selected_minutes)
            .ok_or(IsochroneError::NoMatchingThreshold {
                minutes: selected_minutes,
            })?;

        let allowed: HashSet<PoiCategory> = categories.iter().copied().collect();
        if allowed.is_empty() {
            return Ok(FilterResult::empty(selected_minutes));
        }

        let matches = pois
            .iter()
            .filter(|poi| allowed.contains(&poi.category))
            .filter(|poi| self.meets_rating(poi))
            .filter(|poi| self.contains(set, ring, poi))
            .collect();

        Ok(FilterResult {
            minutes: selected_minutes,
            pois: matches,
        })
    }

    pub fn contains(&self, set: &IsochroneSet, ring: &Ring, poi: &Poi) -> bool {
        let origin = set.origin();
        let minutes = ring.threshold_minutes();
        match self.containment {
            Containment::Polygon => polygon_contains(&ring.polygon, poi.location()),
            Containment::ReachRadius => {
                local_distance_km(&origin, poi.location()) <= self.speeds.reach_km(set.mode(), minutes)
            }
            Containment::DegreeBudget { degrees_per_minute } => {
                degree_distance(&origin, poi.location()) <= minutes as f64 * degrees_per_minute
            }
        }
    }

    fn meets_rating(&self, poi: &Poi) -> bool {
        match self.min_rating {
            None => true,
            Some(min) => poi.rating.is_some_and(|rating| rating >= min),
        }
    }
}
