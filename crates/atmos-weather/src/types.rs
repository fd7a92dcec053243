use atmos_core::NetworkError;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One geocoding result, prior to selection.
///
/// Several candidates may share a `name`; `state` and `country` tell them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLocation {
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CandidateLocation {
    /// "name, state, country", or "name, country" when there is no state
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }

    /// Lowercase "name state country" used for query word matching
    pub fn comparison_text(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(state) = &self.state {
            parts.push(state);
        }
        parts.push(&self.country);
        parts.join(" ").to_lowercase()
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// The place a weather view is shown for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub label: String,
    pub coordinates: Coordinates,
    /// The geocoding candidate this came from; `None` on the coordinate path
    pub candidate: Option<CandidateLocation>,
}

impl ResolvedLocation {
    pub fn from_candidate(candidate: CandidateLocation) -> Self {
        Self {
            label: candidate.label(),
            coordinates: candidate.coordinates(),
            candidate: Some(candidate),
        }
    }
}

/// A type-ahead entry: a candidate with its precomputed display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub candidate: CandidateLocation,
}

impl From<CandidateLocation> for Suggestion {
    fn from(candidate: CandidateLocation) -> Self {
        Self {
            label: candidate.label(),
            candidate,
        }
    }
}

/// Weather condition groups as reported by OpenWeatherMap (`weather[].main`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    #[default]
    Clouds,
    Drizzle,
    Rain,
    Thunderstorm,
    Snow,
    /// Mist, fog, haze, smoke, dust, sand and ash
    Fog,
    /// Squalls, tornadoes and anything the API adds later
    Other,
}

impl WeatherCondition {
    /// Convert the API's condition group name
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Drizzle" => Self::Drizzle,
            "Rain" => Self::Rain,
            "Thunderstorm" => Self::Thunderstorm,
            "Snow" => Self::Snow,
            "Mist" | "Fog" | "Haze" | "Smoke" | "Dust" | "Sand" | "Ash" => Self::Fog,
            _ => Self::Other,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
            Self::Fog => "Fog",
            Self::Other => "Unsettled",
        }
    }

    /// Icon asset name
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Clouds | Self::Other => "clouds",
            Self::Drizzle | Self::Rain => "rain",
            Self::Thunderstorm => "thunderstorm",
            Self::Snow => "snow",
            Self::Fog => "fog",
        }
    }

    /// Visual theme for this condition during daylight
    pub fn theme(&self) -> Theme {
        match self {
            Self::Clear => Theme::Sunny,
            Self::Clouds | Self::Other => Theme::Cloudy,
            Self::Drizzle | Self::Rain => Theme::Rainy,
            Self::Thunderstorm => Theme::Stormy,
            Self::Snow => Theme::Snowy,
            Self::Fog => Theme::Foggy,
        }
    }
}

/// Visual theme keys understood by the presentation sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
    Night,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
            Self::Snowy => "snowy",
            Self::Foggy => "foggy",
            Self::Night => "night",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition details attached to observations and forecast entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub kind: WeatherCondition,
    /// Free text from the API, e.g. "light rain"
    pub description: String,
    /// API icon code, e.g. "10d"; the trailing letter marks day or night
    pub icon: String,
}

impl Conditions {
    pub fn is_night_icon(&self) -> bool {
        self.icon.ends_with('n')
    }
}

/// Current conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub place_name: String,
    pub country: Option<String>,
    pub coordinates: Coordinates,
    pub observed_at: DateTime<Utc>,
    /// Shift from UTC in seconds for the observed place
    pub timezone_offset_secs: i32,
    /// Kelvin
    pub temperature: f64,
    /// Kelvin
    pub feels_like: f64,
    pub humidity: u8,
    /// Meters per second
    pub wind_speed: f64,
    /// Millimeters of rain in the last hour
    pub rain_last_hour: Option<f64>,
    pub conditions: Conditions,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    /// Label used when the place came from device location: "name, country"
    pub fn location_label(&self) -> String {
        match &self.country {
            Some(country) if !country.is_empty() => format!("{}, {}", self.place_name, country),
            _ => self.place_name.clone(),
        }
    }

    pub fn is_night(&self) -> bool {
        match (self.sunrise, self.sunset) {
            (Some(sunrise), Some(sunset)) => {
                self.observed_at < sunrise || self.observed_at > sunset
            }
            _ => self.conditions.is_night_icon(),
        }
    }

    /// Theme for the main view; a clear sky after dark is shown as night
    pub fn theme(&self) -> Theme {
        match self.conditions.kind {
            WeatherCondition::Clear if self.is_night() => Theme::Night,
            kind => kind.theme(),
        }
    }

    /// Observation time in the place's own offset
    pub fn local_time(&self) -> DateTime<FixedOffset> {
        with_offset(self.observed_at, self.timezone_offset_secs)
    }
}

/// One 3-hourly forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    /// Kelvin
    pub temperature: f64,
    /// Meters per second
    pub wind_speed: f64,
    pub conditions: Conditions,
}

/// A forecast entry picked to represent a local calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub entry: ForecastEntry,
}

/// The full 5-day / 3-hour forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub timezone_offset_secs: i32,
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// Reduce the 3-hourly list to the first entry of each local day
    pub fn daily(&self, max_days: usize) -> Vec<DailyForecast> {
        let mut days: Vec<DailyForecast> = Vec::new();

        for entry in &self.entries {
            let date = with_offset(entry.time, self.timezone_offset_secs).date_naive();
            if days.iter().any(|d| d.date == date) {
                continue;
            }
            days.push(DailyForecast {
                date,
                entry: entry.clone(),
            });
        }

        days.truncate(max_days);
        days
    }
}

fn with_offset(time: DateTime<Utc>, offset_secs: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or(Utc.fix());
    time.with_timezone(&offset)
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather and geocoding capability errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        use atmos_core::ReqwestErrorExt;
        Self::Network(err.into_network_error())
    }
}

/// Failures of a dashboard operation, as shown to the user
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Invalid query: {0:?}")]
    InvalidQuery(String),
    #[error("No location found for {0:?}")]
    NotFound(String),
    #[error("Weather fetch failed: {0}")]
    FetchFailed(#[from] WeatherError),
    #[error("Geolocation unavailable: {0}")]
    GeolocationDenied(#[source] LocationError),
}

impl DashboardError {
    /// Status-line text, or `None` when the failure stays silent
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::InvalidQuery(_) => Some("Please enter a valid city name"),
            Self::NotFound(_) => Some("City not found. Try a different name."),
            Self::FetchFailed(_) => Some("Unable to fetch weather. Try again."),
            Self::GeolocationDenied(_) => None,
        }
    }
}
