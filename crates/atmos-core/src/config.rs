use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable prefix for overrides, e.g. `ATMOS_WEATHER__API_KEY`.
const ENV_PREFIX: &str = "ATMOS";

/// Conventional OpenWeatherMap key variable, used when the file has no key.
/// Never written back to the config file.
const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory (also holds the state file)
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Device location settings
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Auto-reload budget
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Fahrenheit for US locations, Celsius everywhere else
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    #[serde(default)]
    pub api_key: String,

    /// Base URL for current conditions and forecast (`/weather`, `/forecast`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for direct geocoding (`/direct`)
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,

    /// Temperature unit preference
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl WeatherConfig {
    /// Use `fallback` when no key is configured.
    fn fill_api_key(&mut self, fallback: Option<String>) {
        if !self.api_key.trim().is_empty() {
            return;
        }
        if let Some(key) = fallback.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            self.api_key = key;
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: default_api_base_url(),
            geo_base_url: default_geo_base_url(),
            temperature_unit: TemperatureUnit::Auto,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// How the device location is acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// Look up the public IP's approximate position
    #[default]
    Ip,
    /// Use `latitude`/`longitude` from this section
    Fixed,
    /// Behave like a user who denied the permission prompt
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub mode: GeolocationMode,

    /// IP lookup endpoint returning `{status, lat, lon}` JSON
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Fixed latitude (only for `fixed` mode)
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Fixed longitude (only for `fixed` mode)
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            mode: GeolocationMode::Ip,
            ip_lookup_url: default_ip_lookup_url(),
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Auto-reloads of the last city before the policy changes behavior
    #[serde(default = "default_max_refresh")]
    pub max_refresh: u32,
}

fn default_max_refresh() -> u32 {
    3
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_refresh: default_max_refresh(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("atmos")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            geolocation: GeolocationConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it
    /// doesn't exist. `ATMOS_*` environment variables override file values.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit file path.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
        }

        let mut config: Config = config::Config::builder()
            .add_source(config::File::from(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read config file")?
            .try_deserialize()
            .context("Failed to parse config file")?;
        config.weather.fill_api_key(std::env::var(API_KEY_ENV).ok());

        tracing::debug!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.api_base_url, "weather.api_base_url", &mut result);
        self.validate_url(&self.weather.geo_base_url, "weather.geo_base_url", &mut result);

        if self.weather.api_key.trim().is_empty() {
            result.add_warning(
                "weather.api_key",
                format!("No API key set - export {} or edit the config file", API_KEY_ENV),
            );
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error("weather.request_timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.request_timeout_secs > 120 {
            result.add_warning(
                "weather.request_timeout_secs",
                "Timeout is unusually long (>120s)",
            );
        }

        let geo = &self.geolocation;
        match geo.mode {
            GeolocationMode::Ip => {
                self.validate_url(
                    &self.geolocation.ip_lookup_url,
                    "geolocation.ip_lookup_url",
                    &mut result,
                );
            }
            GeolocationMode::Fixed => match (geo.latitude, geo.longitude) {
                (Some(lat), Some(lon)) => {
                    if !(-90.0..=90.0).contains(&lat) {
                        result.add_error("geolocation.latitude", "Latitude must be within -90..90");
                    }
                    if !(-180.0..=180.0).contains(&lon) {
                        result.add_error(
                            "geolocation.longitude",
                            "Longitude must be within -180..180",
                        );
                    }
                }
                _ => result.add_error(
                    "geolocation",
                    "Fixed mode requires both latitude and longitude",
                ),
            },
            GeolocationMode::Disabled => {}
        }

        if self.refresh.max_refresh == 0 {
            result.add_warning(
                "refresh.max_refresh",
                "Auto-reload budget is 0 - every load takes the exhausted path",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the persisted refresh state
    pub fn state_file(&self) -> PathBuf {
        self.config_dir.join("state.json")
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("atmos");

        Ok(config_dir.join("config.toml"))
    }
}
