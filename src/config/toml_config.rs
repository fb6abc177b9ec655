use crate::core::containment::Containment;
use crate::domain::model::{PoiCategory, TravelMode};
use crate::domain::ports::{RoutingConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECONDS};
use crate::utils::error::{IsochroneError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub routing: RoutingSettings,
    #[serde(default)]
    pub request: RequestSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSettings {
    pub api_key: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSettings {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub mode: Option<TravelMode>,
    pub thresholds: Option<Vec<u32>>,
    pub selected_minutes: Option<u32>,
    pub categories: Option<Vec<PoiCategory>>,
    pub containment: Option<Containment>,
    pub min_rating: Option<f64>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(IsochroneError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| IsochroneError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left
    /// as written.
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("routing.endpoint", &self.routing.endpoint)?;
        validation::validate_positive_number("routing.timeout_seconds", self.routing.timeout_seconds, 1)?;

        if let Some(thresholds) = &self.request.thresholds {
            if thresholds.is_empty() {
                return Err(IsochroneError::InvalidConfigValueError {
                    field: "request.thresholds".to_string(),
                    value: "[]".to_string(),
                    reason: "At least one threshold is required".to_string(),
                });
            }
            for minutes in thresholds {
                validation::validate_positive_number("request.thresholds", u64::from(*minutes), 1)?;
            }
        }
        if let Some(lat) = self.request.lat {
            validation::validate_range("request.lat", lat, -90.0, 90.0)?;
        }
        if let Some(lng) = self.request.lng {
            validation::validate_range("request.lng", lng, -180.0, 180.0)?;
        }
        if let Some(city) = &self.request.city {
            city.parse::<crate::domain::model::City>()?;
        }

        Ok(())
    }
}

impl RoutingConfig for TomlConfig {
    fn endpoint(&self) -> &str {
        &self.routing.endpoint
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.routing.timeout_seconds)
    }

    /// Blank keys and unresolved `${VAR}` placeholders count as absent.
    fn credential(&self) -> Option<&str> {
        self.routing
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.contains("${"))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
