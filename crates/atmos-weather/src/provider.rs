//! Current conditions and 5-day / 3-hour forecast from OpenWeatherMap
//! (`/data/2.5/weather` and `/data/2.5/forecast`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::http;
use crate::types::{
    Conditions, Coordinates, Forecast, ForecastEntry, WeatherCondition, WeatherError,
    WeatherSnapshot,
};

/// Weather-data capability.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError>;

    async fn forecast(&self, coordinates: Coordinates) -> Result<Forecast, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct OwmCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OwmSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    coord: OwmCoord,
    weather: Vec<OwmCondition>,
    main: OwmMain,
    #[serde(default)]
    wind: OwmWind,
    rain: Option<OwmRain>,
    dt: i64,
    #[serde(default)]
    sys: OwmSys,
    #[serde(default)]
    timezone: i32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    #[serde(default)]
    wind: OwmWind,
}

#[derive(Debug, Deserialize, Default)]
struct OwmCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    #[serde(default)]
    city: OwmCity,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WeatherError::Parse(format!("timestamp out of range: {}", secs)))
}

fn first_conditions(weather: Vec<OwmCondition>) -> Result<Conditions, WeatherError> {
    let condition = weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Parse("response has no weather conditions".to_string()))?;

    Ok(Conditions {
        kind: WeatherCondition::from_main(&condition.main),
        description: condition.description,
        icon: condition.icon,
    })
}

impl TryFrom<OwmCurrentResponse> for WeatherSnapshot {
    type Error = WeatherError;

    fn try_from(r: OwmCurrentResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            place_name: r.name,
            country: r.sys.country.filter(|c| !c.is_empty()),
            coordinates: Coordinates::new(r.coord.lat, r.coord.lon),
            observed_at: timestamp(r.dt)?,
            timezone_offset_secs: r.timezone,
            temperature: r.main.temp,
            feels_like: r.main.feels_like.unwrap_or(r.main.temp),
            humidity: r.main.humidity.unwrap_or_default(),
            wind_speed: r.wind.speed,
            rain_last_hour: r.rain.and_then(|rain| rain.one_hour),
            conditions: first_conditions(r.weather)?,
            sunrise: r.sys.sunrise.map(timestamp).transpose()?,
            sunset: r.sys.sunset.map(timestamp).transpose()?,
        })
    }
}

impl TryFrom<OwmForecastItem> for ForecastEntry {
    type Error = WeatherError;

    fn try_from(item: OwmForecastItem) -> Result<Self, Self::Error> {
        Ok(Self {
            time: timestamp(item.dt)?,
            temperature: item.main.temp,
            wind_speed: item.wind.speed,
            conditions: first_conditions(item.weather)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        Ok(Self {
            client: Arc::new(http::build_client(timeout)?),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        })
    }

    fn url(&self, segment: &str, coordinates: Coordinates) -> Result<reqwest::Url, WeatherError> {
        let lat = coordinates.latitude.to_string();
        let lon = coordinates.longitude.to_string();
        http::endpoint(
            &self.base_url,
            segment,
            &[("lat", &lat), ("lon", &lon), ("appid", &self.api_key)],
        )
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn current(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        let url = self.url("weather", coordinates)?;
        let response: OwmCurrentResponse = http::get_json(&self.client, url).await?;
        WeatherSnapshot::try_from(response)
    }

    #[instrument(skip(self), level = "debug")]
    async fn forecast(&self, coordinates: Coordinates) -> Result<Forecast, WeatherError> {
        let url = self.url("forecast", coordinates)?;
        let response: OwmForecastResponse = http::get_json(&self.client, url).await?;

        let entries = response
            .list
            .into_iter()
            .map(ForecastEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Forecast has {} entries", entries.len());

        Ok(Forecast {
            timezone_offset_secs: response.city.timezone,
            entries,
        })
    }
}
