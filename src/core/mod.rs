pub mod containment;
pub mod geometry;
pub mod provider;
pub mod speed;
pub mod synthetic;

pub use crate::domain::model::{
    FilterResult, IsochroneRequest, IsochroneSet, Origin, Poi, PoiCategory, Ring, RingSource,
    TravelMode,
};
pub use crate::domain::ports::{IsochroneSource, RoutingConfig};
pub use crate::utils::error::Result;
