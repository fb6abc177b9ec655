use crate::adapters::feature_collection::rings_from_geojson;
use crate::domain::model::{IsochroneRequest, IsochroneSet, TravelMode};
use crate::domain::ports::{IsochroneSource, RoutingConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECONDS};
use crate::utils::error::{IsochroneError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Smoothing factor sent with every request; keeps returned polygons from
/// being jagged.
pub const SMOOTHING: f64 = 0.9;

/// OpenRouteService has no public-transit profile, so transit borrows the car
/// profile. Transit results from the live service are therefore an
/// approximation.
pub fn profile_for(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walk => "foot-walking",
        TravelMode::Transit => "driving-car",
        TravelMode::Taxi => "driving-car",
    }
}

#[derive(Debug, Serialize)]
struct IsochroneBody {
    locations: Vec<[f64; 2]>,
    range: Vec<u32>,
    range_type: &'static str,
    smoothing: f64,
}

impl From<&IsochroneRequest> for IsochroneBody {
    fn from(request: &IsochroneRequest) -> Self {
        Self {
            locations: vec![[request.origin.lng, request.origin.lat]],
            range: request.thresholds_seconds(),
            range_type: "time",
            smoothing: SMOOTHING,
        }
    }
}

/// Client for the OpenRouteService isochrones endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouteClient {
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl OpenRouteClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            client: Client::new(),
        }
    }

    pub fn from_config<C: RoutingConfig>(config: &C) -> Self {
        Self::new(config.endpoint(), config.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url_for(&self, mode: TravelMode) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), profile_for(mode))
    }

    fn transport_error(&self, e: reqwest::Error) -> IsochroneError {
        if e.is_builder() {
            IsochroneError::CredentialInvalid {
                reason: format!("request could not be built: {}", e),
            }
        } else if e.is_timeout() {
            IsochroneError::RemoteUnavailable {
                message: format!("no response within {:?}", self.timeout),
            }
        } else {
            IsochroneError::RemoteUnavailable {
                message: e.to_string(),
            }
        }
    }
}

impl Default for OpenRouteClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }
}

#[async_trait]
impl IsochroneSource for OpenRouteClient {
    async fn fetch(&self, request: &IsochroneRequest, credential: &str) -> Result<IsochroneSet> {
        let url = self.url_for(request.mode);
        let body = IsochroneBody::from(request);
        tracing::debug!(
            url = %url,
            range = ?body.range,
            "requesting isochrones from routing service"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, credential)
            .header(ACCEPT, "application/json, application/geo+json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        tracing::debug!("routing service response status: {}", status);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(IsochroneError::RemoteRejected {
                    status: status.as_u16(),
                });
            }
            s if !s.is_success() => {
                return Err(IsochroneError::RemoteUnavailable {
                    message: format!("routing service answered with status {}", s),
                });
            }
            _ => {}
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let rings = rings_from_geojson(&text, request.mode)?;
        Ok(IsochroneSet::new(request.origin, request.mode, rings))
    }
}
