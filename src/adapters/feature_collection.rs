use crate::core::geometry::is_valid_ring_boundary;
use crate::core::synthetic::opacity_for_minutes;
use crate::domain::model::{IsochroneSet, Ring, RingSource, TravelMode};
use crate::utils::error::{IsochroneError, Result};
use geo::{Coord, LineString, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};

fn malformed(message: impl Into<String>) -> IsochroneError {
    IsochroneError::RemoteMalformed {
        message: message.into(),
    }
}

fn to_linestring(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(malformed(format!(
                "position needs at least 2 values, found {}",
                position.len()
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn ring_from_feature(feature: &Feature, mode: TravelMode) -> Result<Ring> {
    let seconds = feature
        .property("value")
        .and_then(JsonValue::as_f64)
        .filter(|v| v.is_finite() && *v >= 60.0)
        .ok_or_else(|| malformed("feature is missing a positive numeric 'value' property"))?;

    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| malformed("feature has no geometry"))?;
    let rings = match &geometry.value {
        geojson::Value::Polygon(rings) => rings,
        _ => return Err(malformed("expected Polygon geometry")),
    };
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| malformed("polygon has no exterior ring"))?;

    let polygon = Polygon::new(
        to_linestring(exterior)?,
        interiors
            .iter()
            .map(|interior| to_linestring(interior))
            .collect::<Result<Vec<_>>>()?,
    );
    if !is_valid_ring_boundary(polygon.exterior()) {
        return Err(malformed(format!(
            "polygon for {}s has fewer than 3 distinct finite vertices",
            seconds
        )));
    }

    let threshold_seconds = seconds.round() as u32;
    Ok(Ring {
        polygon,
        threshold_seconds,
        mode,
        source: RingSource::Live,
        opacity: opacity_for_minutes(threshold_seconds / 60),
        speed_kmh: None,
        distance_km: None,
    })
}

/// Parses a routing-service response body into Live rings. An empty body, an
/// empty collection or any unusable feature rejects the whole payload.
pub fn rings_from_geojson(body: &str, mode: TravelMode) -> Result<Vec<Ring>> {
    if body.trim().is_empty() {
        return Err(malformed("empty response body"));
    }
    let collection = match body.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => collection,
        Ok(_) => return Err(malformed("expected a FeatureCollection")),
        Err(e) => return Err(malformed(format!("failure parsing GeoJSON: {}", e))),
    };
    if collection.features.is_empty() {
        return Err(malformed("FeatureCollection has no features"));
    }

    collection
        .features
        .iter()
        .map(|feature| ring_from_feature(feature, mode))
        .collect()
}

fn ring_properties(ring: &Ring) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("value".to_string(), ring.threshold_seconds.into());
    properties.insert("time".to_string(), ring.threshold_seconds.into());
    properties.insert("mode".to_string(), ring.mode.as_str().into());
    properties.insert(
        "source".to_string(),
        match ring.source {
            RingSource::Live => "live",
            RingSource::Synthetic => "synthetic",
        }
        .into(),
    );
    properties.insert("opacity".to_string(), ring.opacity.into());
    if let Some(speed) = ring.speed_kmh {
        properties.insert("speed".to_string(), speed.into());
    }
    if let Some(distance) = ring.distance_km {
        properties.insert("distance".to_string(), distance.into());
    }
    properties
}

/// One Polygon feature per ring, in the set's draw order.
pub fn to_feature_collection(set: &IsochroneSet) -> FeatureCollection {
    let features = set
        .rings()
        .iter()
        .map(|ring| Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::from(&geo::Geometry::Polygon(
                ring.polygon.clone(),
            ))),
            id: None,
            properties: Some(ring_properties(ring)),
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
