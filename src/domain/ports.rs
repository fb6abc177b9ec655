use crate::domain::model::{IsochroneRequest, IsochroneSet};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openrouteservice.org/v2/isochrones";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

/// An authoritative isochrone backend. Implementations report every failure
/// as an error and never substitute data of their own.
#[async_trait]
pub trait IsochroneSource: Send + Sync {
    async fn fetch(&self, request: &IsochroneRequest, credential: &str) -> Result<IsochroneSet>;
}

pub trait RoutingConfig: Send + Sync {
    fn endpoint(&self) -> &str;
    fn timeout(&self) -> Duration;
    fn credential(&self) -> Option<&str>;
}
