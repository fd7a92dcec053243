//! In-memory doubles for the network traits and the sink.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atmos_core::NetworkError;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use crate::display::DisplayUnit;
use crate::geocode::GeocodingApi;
use crate::provider::WeatherApi;
use crate::sink::{PresentationSink, UiState};
use crate::types::{
    CandidateLocation, Conditions, Coordinates, DailyForecast, Forecast, ForecastEntry,
    ResolvedLocation, Theme, WeatherCondition, WeatherError, WeatherSnapshot,
};

fn server_error() -> WeatherError {
    WeatherError::Network(NetworkError::ServerError {
        status: 500,
        message: "upstream unavailable".into(),
    })
}

pub fn tokyo_candidate() -> CandidateLocation {
    CandidateLocation {
        name: "Tokyo".into(),
        state: None,
        country: "JP".into(),
        latitude: 35.68,
        longitude: 139.69,
    }
}

/// Answers from a fixed table keyed by query text; unknown queries yield nothing.
#[derive(Default)]
pub struct FakeGeocoder {
    results: HashMap<String, Vec<CandidateLocation>>,
    fail: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, candidates: Vec<CandidateLocation>) -> Self {
        self.results.insert(query.to_string(), candidates);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Every query text seen, in order
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl GeocodingApi for FakeGeocoder {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateLocation>, WeatherError> {
        self.calls.lock().push(query.to_string());
        if self.fail {
            return Err(server_error());
        }
        Ok(self
            .results
            .get(query)
            .map(|found| found.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Serves one canned snapshot and forecast for any coordinates.
#[derive(Clone)]
pub struct FakeWeather {
    snapshot: WeatherSnapshot,
    forecast: Forecast,
    fail_forecast: bool,
    requests: Arc<Mutex<Vec<Coordinates>>>,
}

impl FakeWeather {
    /// Rainy Tokyo with a forecast spanning two local days
    pub fn tokyo() -> Self {
        let offset = 9 * 3600;
        let rain = Conditions {
            kind: WeatherCondition::Rain,
            description: "light rain".into(),
            icon: "10d".into(),
        };
        let entry = |hour: u32, temperature: f64| ForecastEntry {
            time: Utc.with_ymd_and_hms(2026, 10, 16, hour, 0, 0).unwrap(),
            temperature,
            wind_speed: 4.0,
            conditions: rain.clone(),
        };

        Self {
            snapshot: WeatherSnapshot {
                place_name: "Tokyo".into(),
                country: Some("JP".into()),
                coordinates: Coordinates::new(35.68, 139.69),
                observed_at: Utc.with_ymd_and_hms(2026, 10, 16, 3, 0, 0).unwrap(),
                timezone_offset_secs: offset,
                temperature: 291.15,
                feels_like: 290.5,
                humidity: 82,
                wind_speed: 4.2,
                rain_last_hour: Some(0.8),
                conditions: rain.clone(),
                sunrise: Some(Utc.with_ymd_and_hms(2026, 10, 15, 20, 45, 0).unwrap()),
                sunset: Some(Utc.with_ymd_and_hms(2026, 10, 16, 8, 10, 0).unwrap()),
            },
            forecast: Forecast {
                timezone_offset_secs: offset,
                // 15:00 UTC is midnight in Tokyo
                entries: vec![entry(0, 290.0), entry(3, 291.0), entry(15, 288.0), entry(18, 287.5)],
            },
            fail_forecast: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Current conditions succeed, the forecast request does not
    pub fn failing_forecast() -> Self {
        Self {
            fail_forecast: true,
            ..Self::tokyo()
        }
    }

    pub fn set_country(&mut self, country: &str) {
        self.snapshot.country = Some(country.to_string());
    }

    /// Number of requests of either kind
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_coordinates(&self) -> Option<Coordinates> {
        self.requests.lock().last().copied()
    }
}

#[async_trait]
impl WeatherApi for FakeWeather {
    async fn current(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        self.requests.lock().push(coordinates);
        Ok(WeatherSnapshot {
            coordinates,
            ..self.snapshot.clone()
        })
    }

    async fn forecast(&self, coordinates: Coordinates) -> Result<Forecast, WeatherError> {
        self.requests.lock().push(coordinates);
        if self.fail_forecast {
            return Err(server_error());
        }
        Ok(self.forecast.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    RenderCurrent(String),
    RenderForecast(usize),
    Theme(Theme),
    ClearCurrent,
    ClearForecast,
    State(UiState),
    Status(String),
    ClearStatus,
}

/// Keeps every call plus the resulting page
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
    current: Option<String>,
    forecast: Option<usize>,
    theme: Option<Theme>,
    unit: Option<DisplayUnit>,
    state: UiState,
    status: Option<String>,
}

impl RecordingSink {
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    pub fn current_label(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn forecast_days(&self) -> Option<usize> {
        self.forecast
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn unit(&self) -> Option<DisplayUnit> {
        self.unit
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl PresentationSink for RecordingSink {
    fn render_current(
        &mut self,
        location: &ResolvedLocation,
        _snapshot: &WeatherSnapshot,
        unit: DisplayUnit,
    ) {
        self.events.push(SinkEvent::RenderCurrent(location.label.clone()));
        self.current = Some(location.label.clone());
        self.unit = Some(unit);
    }

    fn render_forecast(&mut self, days: &[DailyForecast], _unit: DisplayUnit) {
        self.events.push(SinkEvent::RenderForecast(days.len()));
        self.forecast = Some(days.len());
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.events.push(SinkEvent::Theme(theme));
        self.theme = Some(theme);
    }

    fn clear_current(&mut self) {
        self.events.push(SinkEvent::ClearCurrent);
        self.current = None;
    }

    fn clear_forecast(&mut self) {
        self.events.push(SinkEvent::ClearForecast);
        self.forecast = None;
    }

    fn set_state(&mut self, state: UiState) {
        self.events.push(SinkEvent::State(state));
        self.state = state;
    }

    fn show_status(&mut self, message: &str) {
        self.events.push(SinkEvent::Status(message.to_string()));
        self.status = Some(message.to_string());
    }

    fn clear_status(&mut self) {
        self.events.push(SinkEvent::ClearStatus);
        self.status = None;
    }
}
