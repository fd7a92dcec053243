mod terminal;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use atmos_core::{AppError, Config, ConfigError, StorageError};
use atmos_weather::refresh::RefreshPolicy;
use atmos_weather::{
    location, Dashboard, DashboardError, FileStore, KeyValueStore, MemoryStore,
    OpenWeatherGeocoder, OpenWeatherProvider,
};
use clap::{ArgAction, Parser, Subcommand};

use crate::terminal::TerminalSink;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the last city again, or the weather where you are (default)
    Load,
    /// Search for a city by name
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// List matching cities; --pick shows the weather for one of them
    Suggest {
        #[arg(required = true)]
        query: Vec<String>,
        /// 1-based index into the list
        #[arg(long)]
        pick: Option<usize>,
    },
    /// Show the weather at your current location
    Locate,
    /// Forget the last city and the reload counter
    Reset,
    /// Print the config file location and check it
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = atmos_core::init(cli.verbose) {
        eprintln!("{:#}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AppError>() {
        Some(app) => app.user_message().to_string(),
        None => format!("{:#}", err),
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load().map_err(AppError::Other)?;
    let command = cli.command.unwrap_or(Commands::Load);

    match command {
        Commands::Config => return print_config(&config),
        Commands::Reset => {
            let store = reset_store(&config.state_file()).map_err(AppError::from)?;
            let mut dashboard = assemble_dashboard(&config, Box::new(store))?;
            dashboard.reset().map_err(AppError::from)?;
            println!("Cleared saved city and reload counter.");
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let mut dashboard = build_dashboard(&config)?;

    let result = match command {
        Commands::Load => {
            let outcome = dashboard.load().await;
            tracing::debug!("Load action: {:?}", outcome.action);
            outcome.result.map(|_| ())
        }
        Commands::Search { query } => dashboard.search(&query.join(" ")).await.map(|_| ()),
        Commands::Suggest { query, pick } => {
            let suggestions = dashboard.suggest(&query.join(" ")).await;
            match pick {
                None => {
                    if suggestions.is_empty() {
                        println!("No suggestions.");
                    }
                    for (i, suggestion) in suggestions.iter().enumerate() {
                        println!("{:>2}. {}", i + 1, suggestion.label);
                    }
                    return Ok(ExitCode::SUCCESS);
                }
                Some(index) => {
                    let suggestion = index
                        .checked_sub(1)
                        .and_then(|i| suggestions.get(i))
                        .with_context(|| {
                            format!("No suggestion #{} ({} available)", index, suggestions.len())
                        })?;
                    dashboard.select_suggestion(suggestion).await.map(|_| ())
                }
            }
        }
        Commands::Locate => dashboard.locate().await.map(|_| ()),
        Commands::Reset | Commands::Config => Ok(()),
    };

    let mut stdout = std::io::stdout().lock();
    dashboard.sink().write_to(&mut stdout).map_err(AppError::from)?;
    stdout.flush().map_err(AppError::from)?;

    tracing::debug!("Page state: {:?}", dashboard.sink().state());

    // Dashboard errors are already on the page
    match result {
        Err(DashboardError::GeolocationDenied(e)) => {
            tracing::info!("No location available ({}); try `atmos search <city>`", e);
        }
        Err(e) => tracing::debug!("Command finished with: {}", e),
        Ok(()) => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn build_dashboard(config: &Config) -> Result<Dashboard<TerminalSink>> {
    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }
    if !validation.is_valid() {
        return Err(AppError::Config(ConfigError::Invalid(validation.error_summary())).into());
    }
    if config.weather.api_key.trim().is_empty() {
        return Err(AppError::Config(ConfigError::MissingSetting(
            "weather.api_key (or OPENWEATHER_API_KEY)".to_string(),
        ))
        .into());
    }

    assemble_dashboard(config, open_store(config)?)
}

/// Wire the dashboard from config without checking it.
fn assemble_dashboard(
    config: &Config,
    store: Box<dyn KeyValueStore>,
) -> Result<Dashboard<TerminalSink>> {
    let timeout = Duration::from_secs(config.weather.request_timeout_secs);
    let geocoder = OpenWeatherGeocoder::new(
        &config.weather.api_key,
        &config.weather.geo_base_url,
        timeout,
    )?;
    let weather = OpenWeatherProvider::new(
        &config.weather.api_key,
        &config.weather.api_base_url,
        timeout,
    )?;
    let geolocator = location::from_config(&config.geolocation, timeout)?;

    Ok(Dashboard::new(
        Arc::new(geocoder),
        Arc::new(weather),
        geolocator,
        store,
        TerminalSink::new(),
    )
    .with_policy(RefreshPolicy::new(config.refresh.max_refresh))
    .with_temperature_unit(config.weather.temperature_unit))
}

/// A corrupt state file is reported; anything else falls back to memory.
fn open_store(config: &Config) -> Result<Box<dyn KeyValueStore>> {
    let path = config.state_file();
    match FileStore::open(&path) {
        Ok(store) => Ok(Box::new(store)),
        Err(e @ StorageError::Corruption(_)) => Err(AppError::from(e).into()),
        Err(e) => {
            tracing::warn!("State file unavailable, nothing will be remembered: {}", e);
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

/// Open the state file for a reset; a corrupt file is removed first.
fn reset_store(path: &Path) -> Result<FileStore, StorageError> {
    match FileStore::open(path) {
        Err(StorageError::Corruption(e)) => {
            tracing::warn!("Discarding corrupt state file: {}", e);
            FileStore::destroy(path)?;
            FileStore::open(path)
        }
        other => other,
    }
}

fn print_config(config: &Config) -> Result<ExitCode> {
    let path = Config::config_path().map_err(AppError::Other)?;
    println!("Config file: {}", path.display());
    println!("State file:  {}", config.state_file().display());
    println!(
        "API key:     {}",
        if config.weather.api_key.is_empty() { "not set" } else { "set" }
    );

    let validation = config.validate();
    for warning in &validation.warnings {
        println!("warning: {}", warning);
    }
    for error in &validation.errors {
        println!("error: {}", error);
    }

    if validation.is_valid() {
        println!("Configuration OK");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
