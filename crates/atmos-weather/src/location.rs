//! Device location.
//!
//! There is no browser prompt on a terminal, so the position comes from an
//! IP lookup, fixed coordinates in the config, or nowhere at all.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atmos_core::{GeolocationConfig, GeolocationMode};
use reqwest::Client;
use serde::Deserialize;

use crate::http;
use crate::types::{Coordinates, LocationError, WeatherError};

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Build the locator selected in the configuration.
pub fn from_config(
    config: &GeolocationConfig,
    timeout: Duration,
) -> Result<Arc<dyn Geolocator>, WeatherError> {
    let locator: Arc<dyn Geolocator> = match config.mode {
        GeolocationMode::Ip => Arc::new(IpGeolocator::new(&config.ip_lookup_url, timeout)?),
        GeolocationMode::Fixed => match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => Arc::new(FixedGeolocator(Coordinates::new(lat, lon))),
            _ => {
                tracing::warn!("Fixed geolocation without coordinates, treating as disabled");
                Arc::new(DisabledGeolocator)
            }
        },
        GeolocationMode::Disabled => Arc::new(DisabledGeolocator),
    };
    Ok(locator)
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position of the public IP address (ip-api.com format).
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Arc<Client>,
    url: String,
}

impl IpGeolocator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        Ok(Self {
            client: Arc::new(http::build_client(timeout)?),
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| LocationError::Other(format!("invalid lookup URL: {}", e)))?;

        let body: IpLookupResponse = http::get_json(&self.client, url).await.map_err(|e| {
            tracing::debug!("IP lookup failed: {}", e);
            match e {
                WeatherError::Network(atmos_core::NetworkError::Timeout) => LocationError::Timeout,
                _ => LocationError::ServiceUnavailable,
            }
        })?;

        if body.status.as_deref().is_some_and(|s| s != "success") {
            return Err(LocationError::ServiceUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                tracing::info!("Got location: {}, {}", lat, lon);
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(LocationError::Other("lookup returned no coordinates".to_string())),
        }
    }
}

/// Always reports the configured coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Behaves like a denied permission prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeolocator;

#[async_trait]
impl Geolocator for DisabledGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}
