pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::openroute::OpenRouteClient;
pub use config::{toml_config::TomlConfig, Settings};
pub use crate::core::{
    containment::{Containment, ContainmentFilter},
    provider::{IsochroneProvider, RequestState},
    speed::{SpeedModel, SpeedTable},
    synthetic::SyntheticIsochroneGenerator,
};
pub use domain::model::{
    City, FilterResult, IsochroneRequest, IsochroneSet, Origin, Poi, PoiCategory, Ring, RingSource,
    TravelMode,
};
pub use utils::error::{IsochroneError, Result};
