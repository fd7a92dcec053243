//! Direct geocoding: convert a place name into candidate locations.
//! Uses the OpenWeatherMap geocoding API (`/geo/1.0/direct`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::http;
use crate::types::{CandidateLocation, WeatherError};

/// Geocoding capability used by the resolver and the type-ahead.
#[async_trait]
pub trait GeocodingApi: Send + Sync {
    /// Up to `limit` candidates for `query`, best match first.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateLocation>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct DirectGeocodeResult {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}

impl From<DirectGeocodeResult> for CandidateLocation {
    fn from(r: DirectGeocodeResult) -> Self {
        Self {
            name: r.name,
            state: r.state.filter(|s| !s.trim().is_empty()),
            country: r.country.unwrap_or_default(),
            latitude: r.lat,
            longitude: r.lon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl OpenWeatherGeocoder {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        Ok(Self {
            client: Arc::new(http::build_client(timeout)?),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl GeocodingApi for OpenWeatherGeocoder {
    #[instrument(skip(self), level = "debug")]
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateLocation>, WeatherError> {
        let limit = limit.to_string();
        let url = http::endpoint(
            &self.base_url,
            "direct",
            &[("q", query), ("limit", &limit), ("appid", &self.api_key)],
        )?;

        let results: Vec<DirectGeocodeResult> = http::get_json(&self.client, url).await?;
        tracing::debug!("Geocoder returned {} candidates", results.len());

        Ok(results.into_iter().map(CandidateLocation::from).collect())
    }
}
