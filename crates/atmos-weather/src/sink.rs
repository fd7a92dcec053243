//! The rendering side of the dashboard.

use crate::display::DisplayUnit;
use crate::types::{DailyForecast, ResolvedLocation, Theme, WeatherSnapshot};

/// Coarse page state, mirrored by whatever draws the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Receives structured weather data and redraws itself.
///
/// The dashboard never formats output; it only tells the sink what to show
/// and what to clear.
pub trait PresentationSink {
    fn render_current(
        &mut self,
        location: &ResolvedLocation,
        snapshot: &WeatherSnapshot,
        unit: DisplayUnit,
    );

    fn render_forecast(&mut self, days: &[DailyForecast], unit: DisplayUnit);

    fn apply_theme(&mut self, theme: Theme);

    fn clear_current(&mut self);

    fn clear_forecast(&mut self);

    fn set_state(&mut self, state: UiState);

    fn show_status(&mut self, message: &str);

    fn clear_status(&mut self);
}
