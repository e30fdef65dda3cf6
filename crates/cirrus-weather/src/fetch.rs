//! Capability traits the synchronization core needs from the outside world.
//!
//! Production implementations are [`crate::OpenMeteoClient`] and
//! [`crate::NominatimGeocoder`]; tests substitute scripted fakes.

use async_trait::async_trait;
use cirrus_core::FetchError;

use crate::types::{CityCoordinates, ForecastBundle};

/// Forward geocoding and forecast retrieval.
///
/// Implementations must not retry; every failure is reported once.
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    /// Resolve a free-text city name to its best match.
    ///
    /// # Errors
    /// `FetchError::NotFound` when nothing matches, a transport or upstream
    /// error otherwise.
    async fn resolve_city(&self, name: &str) -> Result<CityCoordinates, FetchError>;

    /// Fetch current, hourly and daily weather for a coordinate pair.
    ///
    /// # Errors
    /// `FetchError::InvalidArgument` for out-of-range or non-finite
    /// coordinates (checked before any request), `FetchError::Upstream` for
    /// non-2xx responses, `FetchError::Transport` for connectivity or timeout.
    async fn fetch_forecast(&self, latitude: f64, longitude: f64)
        -> Result<ForecastBundle, FetchError>;
}

/// Reverse geocoding for device coordinates.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` means the service answered but named no place.
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, FetchError>;
}

/// Reject coordinates outside the valid range or not finite.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), FetchError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(FetchError::InvalidArgument(format!(
            "Latitude must be a valid number between -90 and 90, got {}",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(FetchError::InvalidArgument(format!(
            "Longitude must be a valid number between -180 and 180, got {}",
            longitude
        )));
    }
    Ok(())
}
