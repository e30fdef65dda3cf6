use cirrus_weather::ForecastBundle;
use serde::{Deserialize, Serialize};

/// Store-assigned identifier. Never reused after deletion.
pub type LocationId = i64;

/// A city the user tracks, with its last-known forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedLocation {
    /// `None` until the location has been persisted once.
    #[serde(default)]
    pub id: Option<LocationId>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub is_current_location: bool,
    pub forecast: ForecastBundle,
    /// Epoch millis of the last successful fetch; 0 before the first one.
    #[serde(default)]
    pub last_updated_at: i64,
}

impl TrackedLocation {
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        forecast: ForecastBundle,
        last_updated_at: i64,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            latitude,
            longitude,
            is_current_location: false,
            forecast,
            last_updated_at,
        }
    }

    pub fn with_current_location(mut self, flag: bool) -> Self {
        self.is_current_location = flag;
        self
    }

    /// True when the last fetch happened less than `ttl_ms` before `now_ms`.
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.last_updated_at) < ttl_ms
    }

    /// Case-insensitive name comparison used for name-based dedup.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}
