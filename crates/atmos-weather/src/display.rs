//! Unit conversion and text formatting shared by presentation sinks.

use atmos_core::TemperatureUnit;
use chrono::{DateTime, FixedOffset, NaiveDate};

/// Concrete unit to render temperatures in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayUnit {
    Celsius,
    Fahrenheit,
}

impl DisplayUnit {
    /// `Auto` picks Fahrenheit for US locations.
    pub fn resolve(preference: TemperatureUnit, country: Option<&str>) -> Self {
        match preference {
            TemperatureUnit::Celsius => Self::Celsius,
            TemperatureUnit::Fahrenheit => Self::Fahrenheit,
            TemperatureUnit::Auto => match country {
                Some(c) if c.eq_ignore_ascii_case("US") => Self::Fahrenheit,
                _ => Self::Celsius,
            },
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Convert Kelvin and round to whole degrees
    pub fn from_kelvin(&self, kelvin: f64) -> i64 {
        let celsius = kelvin - 273.15;
        let value = match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        };
        value.round() as i64
    }
}

pub fn format_temperature(kelvin: f64, unit: DisplayUnit) -> String {
    format!("{}{}", unit.from_kelvin(kelvin), unit.symbol())
}

/// m/s to rounded km/h
pub fn format_wind(meters_per_second: f64) -> String {
    format!("{} km/h", (meters_per_second * 3.6).round() as i64)
}

pub fn format_precipitation(last_hour_mm: Option<f64>) -> String {
    match last_hour_mm {
        Some(mm) if mm > 0.0 => format!("{} mm", mm),
        _ => "0 mm".to_string(),
    }
}

/// "Friday, Oct 16"
pub fn format_long_date(time: DateTime<FixedOffset>) -> String {
    time.format("%A, %b %-d").to_string()
}

/// "Fri"
pub fn format_weekday(date: NaiveDate) -> String {
    date.format("%a").to_string()
}
