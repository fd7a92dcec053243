pub mod config;
pub mod error;

pub use config::{
    Config, GeolocationConfig, GeolocationMode, RefreshConfig, TemperatureUnit, ValidationResult,
    WeatherConfig,
};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, StorageError};

use anyhow::Result;

/// Initialize logging.
///
/// `verbosity` raises the default filter (0 = info, 1 = debug, 2+ = trace);
/// `RUST_LOG` wins when set. Output goes to stderr so rendered weather on
/// stdout stays clean.
pub fn init(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!("Atmos core initialized");
    Ok(())
}
