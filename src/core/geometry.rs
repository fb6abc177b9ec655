use crate::domain::model::Origin;
use geo::{Coord, Intersects, LineString, Point, Polygon};

/// Rough length of one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Latitude and longitude spans, in degrees, of `distance_km` around `origin`.
/// Longitude degrees shrink toward the poles.
pub fn degree_deltas(origin: &Origin, distance_km: f64) -> (f64, f64) {
    let lat_delta = distance_km / KM_PER_DEGREE;
    let lng_delta = distance_km / (KM_PER_DEGREE * origin.lat_radians().cos());
    (lat_delta, lng_delta)
}

/// East/north offset of `point` from `origin` in km on a local flat projection.
pub fn local_offset_km(origin: &Origin, point: Point<f64>) -> (f64, f64) {
    let dx = (point.x() - origin.lng) * KM_PER_DEGREE * origin.lat_radians().cos();
    let dy = (point.y() - origin.lat) * KM_PER_DEGREE;
    (dx, dy)
}

pub fn local_distance_km(origin: &Origin, point: Point<f64>) -> f64 {
    let (dx, dy) = local_offset_km(origin, point);
    dx.hypot(dy)
}

/// Euclidean distance in raw degree space; only meaningful as a coarse
/// approximation near the equator.
pub fn degree_distance(origin: &Origin, point: Point<f64>) -> f64 {
    (point.x() - origin.lng).hypot(point.y() - origin.lat)
}

pub fn is_closed(boundary: &LineString<f64>) -> bool {
    match (boundary.0.first(), boundary.0.last()) {
        (Some(first), Some(last)) => boundary.0.len() > 1 && first == last,
        _ => false,
    }
}

pub fn distinct_vertex_count(boundary: &LineString<f64>) -> usize {
    let mut seen: Vec<Coord<f64>> = Vec::with_capacity(boundary.0.len());
    for coord in &boundary.0 {
        if !seen.contains(coord) {
            seen.push(*coord);
        }
    }
    seen.len()
}

/// A usable ring boundary is closed, finite and has at least three distinct
/// vertices.
pub fn is_valid_ring_boundary(boundary: &LineString<f64>) -> bool {
    is_closed(boundary)
        && boundary.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
        && distinct_vertex_count(boundary) >= 3
}

/// Point-in-polygon test; points on the boundary count as inside.
pub fn polygon_contains(polygon: &Polygon<f64>, point: Point<f64>) -> bool {
    polygon.intersects(&point)
}
