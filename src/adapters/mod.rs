// Adapters layer: concrete implementations for external systems (routing
// service, GeoJSON, POI files).

pub mod feature_collection;
pub mod openroute;
pub mod poi_file;
