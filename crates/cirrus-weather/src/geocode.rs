//! Reverse geocoding: convert coordinates to human-readable place names.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cirrus_core::{FetchError, ReqwestErrorExt, WeatherConfig};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::fetch::{validate_coordinates, ReverseGeocoder};

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// "Seattle, Washington" style label, or `None` when no field is usable.
    fn label(self) -> Option<String> {
        let state = self.state.clone();
        let country = self.country.clone();

        // city > town > village > municipality, then progressively coarser
        let place = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .or(self.state)
            .or(self.country)
            .filter(|p| !p.trim().is_empty())?;

        let suffix = state
            .filter(|s| !s.is_empty() && *s != place)
            .or_else(|| country.filter(|c| !c.is_empty() && *c != place));

        Some(match suffix {
            Some(s) => format!("{}, {}", place, s),
            None => place,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Arc<Client>,
    base_url: String,
}

impl NominatimGeocoder {
    /// # Errors
    /// Returns `FetchError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ReqwestErrorExt::into_fetch_error)?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.reverse_geocode_url.clone(),
        })
    }

    #[instrument(skip(self), level = "info")]
    pub async fn place_name(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, FetchError> {
        validate_coordinates(latitude, longitude)?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("layer", "address".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Reverse geocode returned status {}", status);
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;

        let name = body.address.and_then(NominatimAddress::label);
        match &name {
            Some(n) => tracing::info!("Reverse geocoded to: {}", n),
            None => tracing::debug!("Reverse geocode returned no usable address"),
        }
        Ok(name)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, FetchError> {
        self.place_name(latitude, longitude).await
    }
}
