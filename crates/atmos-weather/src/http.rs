//! Shared HTTP plumbing for the OpenWeatherMap and IP lookup clients.

use std::time::Duration;

use atmos_core::NetworkError;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::types::WeatherError;

const USER_AGENT: &str = concat!("atmos/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout: Duration) -> Result<Client, WeatherError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Join `segment` onto `base` and append query pairs.
pub(crate) fn endpoint(
    base: &str,
    segment: &str,
    query: &[(&str, &str)],
) -> Result<Url, WeatherError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), segment);
    let mut url = Url::parse(&joined)
        .map_err(|e| WeatherError::Parse(format!("invalid endpoint {}: {}", joined, e)))?;
    url.query_pairs_mut().extend_pairs(query);
    Ok(url)
}

/// Send a GET and decode a 2xx JSON body; any other status is an error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
) -> Result<T, WeatherError> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(NetworkError::ServerError {
            status: status.as_u16(),
            message,
        }
        .into());
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))
}
