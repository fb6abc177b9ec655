use crate::utils::error::IsochroneError;
use geo::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Thresholds requested when the caller does not pick any.
pub const DEFAULT_THRESHOLDS: [u32; 4] = [5, 10, 15, 20];

/// Largest threshold whose length in seconds still fits a `u32`.
pub const MAX_THRESHOLD_MINUTES: u32 = u32::MAX / 60;

/// Seconds in `minutes`, or `None` past [`MAX_THRESHOLD_MINUTES`].
pub fn minutes_to_seconds(minutes: u32) -> Option<u32> {
    minutes.checked_mul(60)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub lat: f64,
    pub lng: f64,
}

impl Origin {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// x = longitude, y = latitude, matching GeoJSON axis order.
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    pub fn lat_radians(&self) -> f64 {
        self.lat.to_radians()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walk,
    Transit,
    Taxi,
}

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Walk, TravelMode::Transit, TravelMode::Taxi];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walk => "walk",
            TravelMode::Transit => "transit",
            TravelMode::Taxi => "taxi",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TravelMode::Walk => "Walking",
            TravelMode::Transit => "Public Transit",
            TravelMode::Taxi => "Taxi/Car",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = IsochroneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" => Ok(TravelMode::Walk),
            "transit" => Ok(TravelMode::Transit),
            "taxi" => Ok(TravelMode::Taxi),
            other => Err(IsochroneError::InvalidConfigValueError {
                field: "mode".to_string(),
                value: other.to_string(),
                reason: "expected one of walk, transit, taxi".to_string(),
            }),
        }
    }
}

/// Preset origins shipped with the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum City {
    Berlin,
    Paris,
}

impl City {
    pub fn default_origin(&self) -> Origin {
        match self {
            City::Berlin => Origin::new(52.5200, 13.4050),
            City::Paris => Origin::new(48.8566, 2.3522),
        }
    }

    pub fn hotel_name(&self) -> &'static str {
        match self {
            City::Berlin => "Hotel Berlin Central",
            City::Paris => "Hotel Paris Opera",
        }
    }
}

impl FromStr for City {
    type Err = IsochroneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "berlin" => Ok(City::Berlin),
            "paris" => Ok(City::Paris),
            other => Err(IsochroneError::InvalidConfigValueError {
                field: "city".to_string(),
                value: other.to_string(),
                reason: "expected one of berlin, paris".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Sights,
    Food,
    Cafe,
    Museum,
    Station,
}

impl PoiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::Sights => "sights",
            PoiCategory::Food => "food",
            PoiCategory::Cafe => "cafe",
            PoiCategory::Museum => "museum",
            PoiCategory::Station => "station",
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoiCategory {
    type Err = IsochroneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sights" => Ok(PoiCategory::Sights),
            "food" => Ok(PoiCategory::Food),
            "cafe" => Ok(PoiCategory::Cafe),
            "museum" => Ok(PoiCategory::Museum),
            "station" => Ok(PoiCategory::Station),
            other => Err(IsochroneError::InvalidConfigValueError {
                field: "categories".to_string(),
                value: other.to_string(),
                reason: "expected one of sights, food, cafe, museum, station".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: PoiCategory,
    pub description: Option<String>,
    pub rating: Option<f64>,
}

impl Poi {
    pub fn location(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingSource {
    Live,
    Synthetic,
}

/// One isochrone polygon for a single (mode, threshold) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub polygon: Polygon<f64>,
    pub threshold_seconds: u32,
    pub mode: TravelMode,
    pub source: RingSource,
    pub opacity: f64,
    /// Only known for synthetic rings.
    pub speed_kmh: Option<f64>,
    pub distance_km: Option<f64>,
}

impl Ring {
    pub fn threshold_minutes(&self) -> u32 {
        self.threshold_seconds / 60
    }

    pub fn boundary(&self) -> &LineString<f64> {
        self.polygon.exterior()
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.polygon.exterior().0
    }
}

/// Rings for one (origin, mode) request, largest threshold first so smaller
/// rings draw on top.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsochroneSet {
    origin: Origin,
    mode: TravelMode,
    rings: Vec<Ring>,
}

impl IsochroneSet {
    pub fn new(origin: Origin, mode: TravelMode, mut rings: Vec<Ring>) -> Self {
        rings.sort_by(|a, b| b.threshold_seconds.cmp(&a.threshold_seconds));
        rings.dedup_by_key(|ring| ring.threshold_seconds);
        Self {
            origin,
            mode,
            rings,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn into_rings(self) -> Vec<Ring> {
        self.rings
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// `Live` only when every ring came from the routing service.
    pub fn source(&self) -> Option<RingSource> {
        if self.rings.is_empty() {
            None
        } else if self.rings.iter().all(|r| r.source == RingSource::Live) {
            Some(RingSource::Live)
        } else {
            Some(RingSource::Synthetic)
        }
    }

    pub fn ring_for_minutes(&self, minutes: u32) -> Option<&Ring> {
        self.rings
            .iter()
            .find(|ring| minutes_to_seconds(minutes) == Some(ring.threshold_seconds))
    }

    pub fn thresholds_minutes(&self) -> Vec<u32> {
        self.rings.iter().map(Ring::threshold_minutes).collect()
    }
}

/// Inputs for one isochrone computation. Thresholds are kept sorted,
/// distinct, positive and no larger than [`MAX_THRESHOLD_MINUTES`].
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneRequest {
    pub origin: Origin,
    pub mode: TravelMode,
    thresholds: Vec<u32>,
}

impl IsochroneRequest {
    pub fn new(origin: Origin, mode: TravelMode, thresholds: &[u32]) -> Self {
        let mut thresholds: Vec<u32> = thresholds
            .iter()
            .copied()
            .filter(|m| (1..=MAX_THRESHOLD_MINUTES).contains(m))
            .collect();
        thresholds.sort_unstable();
        thresholds.dedup();
        Self {
            origin,
            mode,
            thresholds,
        }
    }

    pub fn with_default_thresholds(origin: Origin, mode: TravelMode) -> Self {
        Self::new(origin, mode, &DEFAULT_THRESHOLDS)
    }

    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    pub fn thresholds_seconds(&self) -> Vec<u32> {
        self.thresholds
            .iter()
            .filter_map(|m| minutes_to_seconds(*m))
            .collect()
    }
}

/// POIs selected for one threshold, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult<'a> {
    pub minutes: u32,
    pub pois: Vec<&'a Poi>,
}

impl<'a> FilterResult<'a> {
    pub fn empty(minutes: u32) -> Self {
        Self {
            minutes,
            pois: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Poi> + '_ {
        self.pois.iter().copied()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.pois.iter().map(|poi| poi.id.as_str()).collect()
    }
}
