//! Deterministic isochrone approximation.
//!
//! Each ring is an ellipse in degree space (corrected for longitude
//! convergence) whose radius is modulated by a per-mode shape bias. There is
//! no randomness: identical inputs always yield identical polygons.

use crate::core::geometry::degree_deltas;
use crate::core::speed::SpeedModel;
use crate::domain::model::{
    IsochroneRequest, IsochroneSet, Origin, Ring, RingSource, TravelMode, MAX_THRESHOLD_MINUTES,
};
use geo::{Coord, LineString, Polygon};
use std::f64::consts::{FRAC_PI_4, TAU};

pub const VERTEX_COUNT: usize = 48;

/// Rendering opacity for a threshold; smaller rings are drawn darker.
pub fn opacity_for_minutes(minutes: u32) -> f64 {
    match minutes {
        5 => 0.40,
        10 => 0.30,
        15 => 0.20,
        20 => 0.10,
        _ => 0.10,
    }
}

/// Radius multiplier at `angle` (radians, counter-clockwise from east).
pub fn shape_bias(mode: TravelMode, angle: f64) -> f64 {
    match mode {
        TravelMode::Walk => 1.0,
        // Eight-fold star: longest reach midway between each 45° step.
        TravelMode::Transit => {
            let phase = (angle % FRAC_PI_4) / FRAC_PI_4;
            0.85 + 0.30 * (1.0 - (phase - 0.5).abs() * 2.0)
        }
        // Cross along the cardinal axes.
        TravelMode::Taxi => {
            if angle.sin().abs() < 0.3 || angle.cos().abs() < 0.3 {
                1.15
            } else {
                0.95
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticIsochroneGenerator {
    speeds: SpeedModel,
}

impl SyntheticIsochroneGenerator {
    pub fn new(speeds: SpeedModel) -> Self {
        Self { speeds }
    }

    pub fn speeds(&self) -> &SpeedModel {
        &self.speeds
    }

    /// Thresholds past [`MAX_THRESHOLD_MINUTES`] are clamped to it.
    pub fn ring(&self, origin: &Origin, mode: TravelMode, minutes: u32) -> Ring {
        let minutes = minutes.min(MAX_THRESHOLD_MINUTES);
        let speed = self.speeds.speed_kmh(mode);
        let distance = self.speeds.reach_km(mode, minutes);
        let (lat_delta, lng_delta) = degree_deltas(origin, distance);

        let mut coords: Vec<Coord<f64>> = (0..VERTEX_COUNT)
            .map(|i| {
                let angle = i as f64 / VERTEX_COUNT as f64 * TAU;
                let bias = shape_bias(mode, angle);
                Coord {
                    x: origin.lng + lng_delta * angle.cos() * bias,
                    y: origin.lat + lat_delta * angle.sin() * bias,
                }
            })
            .collect();
        coords.push(coords[0]);

        Ring {
            polygon: Polygon::new(LineString::new(coords), vec![]),
            threshold_seconds: minutes * 60,
            mode,
            source: RingSource::Synthetic,
            opacity: opacity_for_minutes(minutes),
            speed_kmh: Some(speed),
            distance_km: Some(distance),
        }
    }

    /// One ring per requested threshold, largest first. Never fails.
    pub fn generate(&self, request: &IsochroneRequest) -> IsochroneSet {
        let rings = request
            .thresholds()
            .iter()
            .map(|&minutes| self.ring(&request.origin, request.mode, minutes))
            .collect();
        IsochroneSet::new(request.origin, request.mode, rings)
    }
}
