//! Command handlers tying resolution, refresh policy, weather fetching and
//! rendering together.
//!
//! Every handler clears the status line and both weather sections before it
//! touches the network, so a failure never leaves a half-drawn page. Errors
//! end the current operation: they are shown through the sink and returned,
//! never retried.

use std::sync::Arc;

use atmos_core::TemperatureUnit;

use crate::display::DisplayUnit;
use crate::geocode::GeocodingApi;
use crate::location::Geolocator;
use crate::provider::WeatherApi;
use crate::query;
use crate::refresh::{RefreshAction, RefreshPolicy, RefreshState};
use crate::resolver::LocationResolver;
use crate::sink::{PresentationSink, UiState};
use crate::store::KeyValueStore;
use crate::suggest;
use crate::types::{
    Coordinates, DashboardError, Forecast, ResolvedLocation, Suggestion, WeatherSnapshot,
};

/// Days shown in the forecast strip
pub const FORECAST_DAYS: usize = 5;

const LOCATION_FETCH_FAILED: &str = "Unable to fetch your location weather";

/// Who asked for the view; decides what gets persisted afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Search,
    Suggestion,
    Geolocation,
    AutoReload,
}

/// Result of a load: the policy's decision and how running it went
#[derive(Debug)]
pub struct LoadOutcome {
    pub action: RefreshAction,
    pub result: Result<ResolvedLocation, DashboardError>,
}

pub struct Dashboard<S: PresentationSink> {
    geocoder: Arc<dyn GeocodingApi>,
    resolver: LocationResolver,
    weather: Arc<dyn WeatherApi>,
    geolocator: Arc<dyn Geolocator>,
    store: Box<dyn KeyValueStore>,
    sink: S,
    policy: RefreshPolicy,
    temperature_unit: TemperatureUnit,
}

impl<S: PresentationSink> Dashboard<S> {
    pub fn new(
        geocoder: Arc<dyn GeocodingApi>,
        weather: Arc<dyn WeatherApi>,
        geolocator: Arc<dyn Geolocator>,
        store: Box<dyn KeyValueStore>,
        sink: S,
    ) -> Self {
        Self {
            resolver: LocationResolver::new(geocoder.clone()),
            geocoder,
            weather,
            geolocator,
            store,
            sink,
            policy: RefreshPolicy::default(),
            temperature_unit: TemperatureUnit::Auto,
        }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.temperature_unit = unit;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn refresh_state(&self) -> RefreshState {
        RefreshState::load(self.store.as_ref())
    }

    /// Manual search for free text.
    pub async fn search(&mut self, raw: &str) -> Result<ResolvedLocation, DashboardError> {
        self.search_as(raw, Origin::Search).await
    }

    /// Show a type-ahead entry by its exact coordinates.
    pub async fn select_suggestion(
        &mut self,
        suggestion: &Suggestion,
    ) -> Result<ResolvedLocation, DashboardError> {
        self.clear_page();
        let location = LocationResolver::resolve_coordinates(
            suggestion.candidate.coordinates(),
            &suggestion.label,
        );
        self.show_location(location, Origin::Suggestion).await
    }

    /// Show the weather at the device's position.
    ///
    /// A refused or unavailable position leaves the page idle without a message.
    pub async fn locate(&mut self) -> Result<ResolvedLocation, DashboardError> {
        self.clear_page();

        let coordinates = match self.geolocator.locate().await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                tracing::info!("Geolocation unavailable: {}", e);
                self.sink.set_state(UiState::Idle);
                return Err(DashboardError::GeolocationDenied(e));
            }
        };

        self.sink.set_state(UiState::Loading);
        let (snapshot, forecast) = match self.fetch(coordinates).await {
            Ok(data) => data,
            Err(e) => {
                self.fail_with(LOCATION_FETCH_FAILED);
                return Err(e);
            }
        };

        let location =
            LocationResolver::resolve_coordinates(coordinates, &snapshot.location_label());
        self.render(&location, &snapshot, &forecast);
        self.remember(&location, Origin::Geolocation);
        Ok(location)
    }

    /// Page (re)load: let the refresh policy pick what to show.
    pub async fn load(&mut self) -> LoadOutcome {
        self.clear_page();

        let state = self.refresh_state();
        let action = self.policy.evaluate(&state);
        tracing::debug!("Refresh state {:?} -> {:?}", state, action);

        let result = match &action {
            RefreshAction::Geolocate => self.locate().await,
            RefreshAction::Reload { label, next_count } => {
                if let Err(e) = RefreshState::set_refresh_count(self.store.as_mut(), *next_count) {
                    tracing::warn!("Failed to save refresh count: {}", e);
                }
                self.search_as(label, Origin::AutoReload).await
            }
            RefreshAction::ResetAndGeolocate => {
                if let Err(e) = RefreshState::clear_all(self.store.as_mut()) {
                    tracing::warn!("Failed to clear refresh state: {}", e);
                }
                self.locate().await
            }
            RefreshAction::ReloadFinal { label } => {
                if let Err(e) = RefreshState::clear_refresh_count(self.store.as_mut()) {
                    tracing::warn!("Failed to clear refresh count: {}", e);
                }
                self.search_as(label, Origin::AutoReload).await
            }
        };

        LoadOutcome { action, result }
    }

    /// Type-ahead candidates for partial input.
    pub async fn suggest(&self, raw: &str) -> Vec<Suggestion> {
        suggest::suggest(self.geocoder.as_ref(), raw).await
    }

    /// Forget the last city and the reload counter.
    pub fn reset(&mut self) -> Result<(), atmos_core::StorageError> {
        RefreshState::clear_all(self.store.as_mut())?;
        tracing::info!("Cleared saved dashboard state");
        Ok(())
    }

    async fn search_as(
        &mut self,
        raw: &str,
        origin: Origin,
    ) -> Result<ResolvedLocation, DashboardError> {
        self.clear_page();

        if !query::validate(raw) {
            let err = DashboardError::InvalidQuery(raw.to_string());
            self.fail(&err);
            return Err(err);
        }

        self.sink.set_state(UiState::Loading);
        let normalized = query::normalize(raw);

        let location = match self.resolver.resolve(&normalized).await {
            Ok(location) => location,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        self.show_location(location, origin).await
    }

    async fn show_location(
        &mut self,
        location: ResolvedLocation,
        origin: Origin,
    ) -> Result<ResolvedLocation, DashboardError> {
        self.sink.set_state(UiState::Loading);

        match self.fetch(location.coordinates).await {
            Ok((snapshot, forecast)) => {
                self.render(&location, &snapshot, &forecast);
                self.remember(&location, origin);
                Ok(location)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Both requests must succeed before anything is drawn.
    async fn fetch(
        &self,
        coordinates: Coordinates,
    ) -> Result<(WeatherSnapshot, Forecast), DashboardError> {
        let (snapshot, forecast) = tokio::try_join!(
            self.weather.current(coordinates),
            self.weather.forecast(coordinates)
        )?;
        Ok((snapshot, forecast))
    }

    fn render(
        &mut self,
        location: &ResolvedLocation,
        snapshot: &WeatherSnapshot,
        forecast: &Forecast,
    ) {
        let unit = DisplayUnit::resolve(self.temperature_unit, snapshot.country.as_deref());

        self.sink.render_current(location, snapshot, unit);
        self.sink.apply_theme(snapshot.theme());
        self.sink.render_forecast(&forecast.daily(FORECAST_DAYS), unit);
        self.sink.set_state(UiState::Ready);

        tracing::info!("Showing weather for {}", location.label);
    }

    fn remember(&mut self, location: &ResolvedLocation, origin: Origin) {
        let location_based = match origin {
            Origin::AutoReload => return,
            Origin::Geolocation => true,
            Origin::Search | Origin::Suggestion => false,
        };

        if let Err(e) =
            RefreshState::record_view(self.store.as_mut(), &location.label, location_based)
        {
            tracing::warn!("Failed to save last city: {}", e);
        }
    }

    fn clear_page(&mut self) {
        self.sink.clear_status();
        self.sink.clear_current();
        self.sink.clear_forecast();
    }

    fn fail(&mut self, err: &DashboardError) {
        tracing::warn!("Dashboard operation failed: {}", err);
        match err.user_message() {
            Some(message) => self.fail_with(message),
            None => self.sink.set_state(UiState::Idle),
        }
    }

    fn fail_with(&mut self, message: &str) {
        self.sink.set_state(UiState::Idle);
        self.sink.show_status(message);
    }
}
