use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::core::containment::Containment;
use crate::domain::model::{City, Origin, PoiCategory, TravelMode, DEFAULT_THRESHOLDS};
use crate::domain::ports::RoutingConfig;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use clap::Parser;

pub const DEFAULT_SELECTED_MINUTES: u32 = 10;
pub const DEFAULT_CATEGORIES: [PoiCategory; 2] = [PoiCategory::Sights, PoiCategory::Station];

/// Values left unset fall back to the `--config` file, then to built-in
/// defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "isoreach")]
#[command(about = "Compute isochrones around an origin and list reachable points of interest")]
pub struct CliConfig {
    /// Preset origin (berlin, paris); ignored when --lat/--lng are given
    #[arg(long)]
    pub city: Option<City>,

    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// walk, transit or taxi
    #[arg(long)]
    pub mode: Option<TravelMode>,

    /// Time thresholds in minutes
    #[arg(long, value_delimiter = ',')]
    pub times: Vec<u32>,

    /// Threshold used to filter POIs
    #[arg(long)]
    pub time: Option<u32>,

    #[arg(long, value_delimiter = ',')]
    pub categories: Vec<PoiCategory>,

    /// POI catalog (.json or .csv)
    #[arg(long)]
    pub pois: Option<String>,

    /// polygon, reach-radius or degree-budget
    #[arg(long)]
    pub containment: Option<Containment>,

    #[arg(long)]
    pub min_rating: Option<f64>,

    /// OpenRouteService API key; falls back to ORS_API_KEY
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Write the isochrones as a GeoJSON FeatureCollection
    #[arg(long)]
    pub geojson_out: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// Merges command-line values over `file` and fills in defaults.
    pub fn resolve(&self, file: Option<&TomlConfig>) -> Result<Settings> {
        let defaults = TomlConfig::default();
        let file = file.unwrap_or(&defaults);
        let request = &file.request;

        let (origin, origin_name) = self.resolve_origin(file)?;

        let thresholds = if !self.times.is_empty() {
            self.times.clone()
        } else {
            request
                .thresholds
                .clone()
                .unwrap_or_else(|| DEFAULT_THRESHOLDS.to_vec())
        };
        let categories = if !self.categories.is_empty() {
            self.categories.clone()
        } else {
            request
                .categories
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORIES.to_vec())
        };

        let api_key = self
            .api_key
            .clone()
            .or_else(|| file.credential().map(str::to_string))
            .or_else(|| std::env::var("ORS_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        Ok(Settings {
            origin,
            origin_name,
            mode: self.mode.or(request.mode).unwrap_or(TravelMode::Walk),
            thresholds,
            selected_minutes: self
                .time
                .or(request.selected_minutes)
                .unwrap_or(DEFAULT_SELECTED_MINUTES),
            categories,
            containment: self.containment.or(request.containment).unwrap_or_default(),
            min_rating: self.min_rating.or(request.min_rating),
            pois: self.pois.clone(),
            geojson_out: self.geojson_out.clone(),
            endpoint: self
                .endpoint
                .clone()
                .unwrap_or_else(|| file.routing.endpoint.clone()),
            timeout_seconds: self.timeout_seconds.unwrap_or(file.routing.timeout_seconds),
            api_key,
        })
    }

    fn resolve_origin(&self, file: &TomlConfig) -> Result<(Origin, String)> {
        let request = &file.request;
        let lat = self.lat.or(request.lat);
        let lng = self.lng.or(request.lng);

        if lat.is_some() || lng.is_some() {
            let lat = *validate_required_field("lat", &lat)?;
            let lng = *validate_required_field("lng", &lng)?;
            return Ok((Origin::new(lat, lng), "Custom origin".to_string()));
        }

        let city = match (self.city, &request.city) {
            (Some(city), _) => city,
            (None, Some(name)) => name.parse()?,
            (None, None) => City::Berlin,
        };
        Ok((city.default_origin(), city.hotel_name().to_string()))
    }
}
