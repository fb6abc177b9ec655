#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::core::containment::{Containment, ContainmentFilter};
use crate::domain::model::{
    IsochroneRequest, Origin, PoiCategory, TravelMode, MAX_THRESHOLD_MINUTES,
};
use crate::domain::ports::RoutingConfig;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub origin: Origin,
    pub origin_name: String,
    pub mode: TravelMode,
    pub thresholds: Vec<u32>,
    pub selected_minutes: u32,
    pub categories: Vec<PoiCategory>,
    pub containment: Containment,
    pub min_rating: Option<f64>,
    pub pois: Option<String>,
    pub geojson_out: Option<String>,
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

impl Settings {
    pub fn request(&self) -> IsochroneRequest {
        IsochroneRequest::new(self.origin, self.mode, &self.thresholds)
    }

    pub fn filter(&self) -> ContainmentFilter {
        let filter = ContainmentFilter::new(self.containment);
        match self.min_rating {
            Some(min) => filter.with_min_rating(min),
            None => filter,
        }
    }
}

impl RoutingConfig for Settings {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn credential(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_range("lat", self.origin.lat, -90.0, 90.0)?;
        validation::validate_range("lng", self.origin.lng, -180.0, 180.0)?;
        validation::validate_url("endpoint", &self.endpoint)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validation::validate_positive_number("times", self.thresholds.len() as u64, 1)?;
        for minutes in &self.thresholds {
            validation::validate_range("times", *minutes, 1, MAX_THRESHOLD_MINUTES)?;
        }
        validation::validate_range("time", self.selected_minutes, 1, MAX_THRESHOLD_MINUTES)?;
        if let Some(rating) = self.min_rating {
            validation::validate_range("min_rating", rating, 0.0, 5.0)?;
        }
        if let Some(path) = &self.pois {
            validation::validate_path("pois", path)?;
            validation::validate_file_extension(
                "pois",
                path,
                &crate::adapters::poi_file::POI_FILE_EXTENSIONS,
            )?;
        }
        if let Some(path) = &self.geojson_out {
            validation::validate_path("geojson_out", path)?;
        }
        Ok(())
    }
}
