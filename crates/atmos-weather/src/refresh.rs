//! Auto-reload budget.
//!
//! On every load the dashboard either re-shows the last city or falls back
//! to device location. The counter only grows on automatic reloads, never on
//! user-initiated searches, so it measures one session of reloads.

use atmos_core::StorageError;
use serde::Serialize;

use crate::store::KeyValueStore;

/// Default number of auto-reloads before the policy changes behavior
pub const MAX_REFRESH: u32 = 3;

pub const LAST_CITY_KEY: &str = "lastCity";
pub const REFRESH_COUNT_KEY: &str = "refreshCount";
pub const IS_LOCATION_BASED_KEY: &str = "isLocationBased";

/// What the store remembers between loads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshState {
    pub last_city: Option<String>,
    pub refresh_count: u32,
    pub is_location_based: bool,
}

impl RefreshState {
    /// Read the state; missing or unreadable values take their defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let last_city = store
            .get(LAST_CITY_KEY)
            .filter(|label| !label.trim().is_empty());

        let refresh_count = match store.get(REFRESH_COUNT_KEY) {
            None => 0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring unreadable refresh count {:?}", raw);
                0
            }),
        };

        let is_location_based = store.get(IS_LOCATION_BASED_KEY).as_deref() == Some("true");

        Self {
            last_city,
            refresh_count,
            is_location_based,
        }
    }

    /// Remember a successful user-initiated view and restart the budget.
    pub fn record_view(
        store: &mut dyn KeyValueStore,
        label: &str,
        location_based: bool,
    ) -> Result<(), StorageError> {
        store.set(LAST_CITY_KEY, label)?;
        store.set(REFRESH_COUNT_KEY, "0")?;
        store.set(IS_LOCATION_BASED_KEY, if location_based { "true" } else { "false" })
    }

    pub fn set_refresh_count(
        store: &mut dyn KeyValueStore,
        count: u32,
    ) -> Result<(), StorageError> {
        store.set(REFRESH_COUNT_KEY, &count.to_string())
    }

    pub fn clear_refresh_count(store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        store.remove(REFRESH_COUNT_KEY)
    }

    pub fn clear_all(store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        store.remove(REFRESH_COUNT_KEY)?;
        store.remove(LAST_CITY_KEY)?;
        store.remove(IS_LOCATION_BASED_KEY)
    }
}

/// What a load should do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RefreshAction {
    /// Nothing remembered: use device location
    Geolocate,
    /// Re-show the last city and store `next_count`
    Reload { label: String, next_count: u32 },
    /// Location-based budget spent: forget everything, use device location
    ResetAndGeolocate,
    /// Searched-city budget spent: drop the counter, re-show the city once more
    ReloadFinal { label: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    max_refresh: u32,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(MAX_REFRESH)
    }
}

impl RefreshPolicy {
    pub fn new(max_refresh: u32) -> Self {
        Self { max_refresh }
    }

    pub fn max_refresh(&self) -> u32 {
        self.max_refresh
    }

    pub fn evaluate(&self, state: &RefreshState) -> RefreshAction {
        let Some(label) = &state.last_city else {
            return RefreshAction::Geolocate;
        };

        if state.refresh_count < self.max_refresh {
            RefreshAction::Reload {
                label: label.clone(),
                next_count: state.refresh_count + 1,
            }
        } else if state.is_location_based {
            RefreshAction::ResetAndGeolocate
        } else {
            RefreshAction::ReloadFinal {
                label: label.clone(),
            }
        }
    }
}
