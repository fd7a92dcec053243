//! Weather dashboard core for Atmos
//!
//! Resolves free-text city queries through OpenWeatherMap geocoding, fetches
//! current conditions and the 5-day forecast, and decides what a page load
//! shows from a small persisted reload budget. Rendering is left to a
//! [`PresentationSink`].

pub mod dashboard;
pub mod display;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod query;
pub mod refresh;
pub mod resolver;
pub mod sink;
pub mod store;
pub mod suggest;
pub mod types;

mod http;

#[cfg(test)]
mod testing;

pub use dashboard::{Dashboard, LoadOutcome};
pub use display::DisplayUnit;
pub use geocode::{GeocodingApi, OpenWeatherGeocoder};
pub use location::Geolocator;
pub use provider::{OpenWeatherProvider, WeatherApi};
pub use refresh::{RefreshAction, RefreshPolicy, RefreshState};
pub use resolver::LocationResolver;
pub use sink::{PresentationSink, UiState};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use suggest::{SuggestionFeed, SuggestionTicket};
pub use types::*;
