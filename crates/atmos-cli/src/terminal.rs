//! Plain-text page for the terminal.
//!
//! The sink keeps a small page model that the dashboard fills in and clears;
//! `write_to` prints whatever is on the page once a command finishes.

use std::io::{self, Write};

use atmos_weather::display::{
    format_long_date, format_precipitation, format_temperature, format_weekday, format_wind,
};
use atmos_weather::{
    DailyForecast, DisplayUnit, PresentationSink, ResolvedLocation, Theme, UiState, WeatherSnapshot,
};

#[derive(Debug, Clone, PartialEq)]
struct CurrentView {
    label: String,
    date: String,
    temperature: String,
    description: String,
    feels_like: String,
    humidity: u8,
    wind: String,
    precipitation: String,
}

#[derive(Debug, Clone, PartialEq)]
struct DayView {
    weekday: String,
    temperature: String,
    description: String,
    icon: &'static str,
}

#[derive(Debug, Default)]
pub struct TerminalSink {
    current: Option<CurrentView>,
    forecast: Vec<DayView>,
    theme: Option<Theme>,
    state: UiState,
    status: Option<String>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Some(status) = &self.status {
            writeln!(out, "! {}", status)?;
        }

        if let Some(current) = &self.current {
            writeln!(out, "{}", current.label)?;
            writeln!(out, "{}", current.date)?;
            writeln!(out)?;
            writeln!(out, "  {}  {}", current.temperature, current.description)?;
            writeln!(out, "  Feels like  {}", current.feels_like)?;
            writeln!(out, "  Humidity    {}%", current.humidity)?;
            writeln!(out, "  Wind        {}", current.wind)?;
            writeln!(out, "  Rain (1h)   {}", current.precipitation)?;
            if let Some(theme) = self.theme {
                writeln!(out, "  Theme       {}", theme)?;
            }
        }

        if !self.forecast.is_empty() {
            writeln!(out)?;
            for day in &self.forecast {
                writeln!(
                    out,
                    "  {:<4} {:>6}  {:<13} [{}]",
                    day.weekday, day.temperature, day.description, day.icon
                )?;
            }
        }

        Ok(())
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl PresentationSink for TerminalSink {
    fn render_current(
        &mut self,
        location: &ResolvedLocation,
        snapshot: &WeatherSnapshot,
        unit: DisplayUnit,
    ) {
        let description = if snapshot.conditions.description.is_empty() {
            snapshot.conditions.kind.description().to_string()
        } else {
            capitalize(&snapshot.conditions.description)
        };

        self.current = Some(CurrentView {
            label: location.label.clone(),
            date: format_long_date(snapshot.local_time()),
            temperature: format_temperature(snapshot.temperature, unit),
            description,
            feels_like: format_temperature(snapshot.feels_like, unit),
            humidity: snapshot.humidity,
            wind: format_wind(snapshot.wind_speed),
            precipitation: format_precipitation(snapshot.rain_last_hour),
        });
    }

    fn render_forecast(&mut self, days: &[DailyForecast], unit: DisplayUnit) {
        self.forecast = days
            .iter()
            .map(|day| DayView {
                weekday: format_weekday(day.date),
                temperature: format_temperature(day.entry.temperature, unit),
                description: day.entry.conditions.kind.description().to_string(),
                icon: day.entry.conditions.kind.icon_name(),
            })
            .collect();
    }

    fn apply_theme(&mut self, theme: Theme) {
        tracing::debug!("Theme: {}", theme);
        self.theme = Some(theme);
    }

    fn clear_current(&mut self) {
        self.current = None;
    }

    fn clear_forecast(&mut self) {
        self.forecast.clear();
    }

    fn set_state(&mut self, state: UiState) {
        tracing::debug!("UI state: {:?}", state);
        self.state = state;
    }

    fn show_status(&mut self, message: &str) {
        self.status = Some(message.to_string());
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
