//! Open-Meteo client: forward geocoding and forecasts.
//! Free, no API key required.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cirrus_core::{FetchError, ReqwestErrorExt, WeatherConfig};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::fetch::{validate_coordinates, WeatherFetcher};
use crate::types::{
    CityCoordinates, CurrentConditions, DailySeries, ForecastBundle, HourlySeries,
};

const CURRENT_VARIABLES: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,pressure_msl,is_day,weathercode";
const HOURLY_VARIABLES: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";
const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,wind_speed_10m_max";

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: i32,
    apparent_temperature: f64,
    wind_speed_10m: f64,
    is_day: i32,
    #[serde(alias = "weather_code")]
    weathercode: i32,
    pressure_msl: f64,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    relative_humidity_2m: Vec<i32>,
    wind_speed_10m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    wind_speed_10m_max: Vec<f64>,
}

impl From<ForecastResponse> for ForecastBundle {
    fn from(resp: ForecastResponse) -> Self {
        Self {
            current: CurrentConditions {
                temperature: resp.current.temperature_2m,
                humidity: resp.current.relative_humidity_2m,
                apparent_temperature: resp.current.apparent_temperature,
                wind_speed: resp.current.wind_speed_10m,
                is_day: resp.current.is_day != 0,
                weather_code: resp.current.weathercode,
                pressure_msl: resp.current.pressure_msl,
            },
            hourly: HourlySeries {
                time: resp.hourly.time,
                temperature: resp.hourly.temperature_2m,
                humidity: resp.hourly.relative_humidity_2m,
                wind_speed: resp.hourly.wind_speed_10m,
            },
            daily: DailySeries {
                time: resp.daily.time,
                temperature_max: resp.daily.temperature_2m_max,
                temperature_min: resp.daily.temperature_2m_min,
                wind_speed_max: resp.daily.wind_speed_10m_max,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Arc<Client>,
    forecast_url: String,
    geocoding_url: String,
    forecast_days: u32,
    forecast_hours: u32,
}

impl OpenMeteoClient {
    /// Build a client with the configured endpoints and timeout.
    ///
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
            forecast_url: config.forecast_url.clone(),
            geocoding_url: config.geocoding_url.clone(),
            forecast_days: config.forecast_days,
            forecast_hours: config.forecast_hours,
        })
    }

    /// Best match for a city name.
    #[instrument(skip(self), level = "info")]
    pub async fn search_city(&self, name: &str) -> Result<CityCoordinates, FetchError> {
        let query = name.trim();
        if query.is_empty() {
            return Err(FetchError::InvalidArgument(
                "City name cannot be empty".to_string(),
            ));
        }

        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[("name", query), ("count", "1")])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;

        let body: GeocodingResponse = Self::handle_response(response).await?;
        let city = body
            .results
            .and_then(|results| results.into_iter().next())
            .map(|r| CityCoordinates {
                name: r.name,
                latitude: r.latitude,
                longitude: r.longitude,
            })
            .ok_or_else(|| FetchError::NotFound(query.to_string()))?;

        tracing::debug!("Fetched coordinates for {}: {:?}", query, city);
        Ok(city)
    }

    /// Current conditions plus hourly and daily series for a coordinate pair.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastBundle, FetchError> {
        validate_coordinates(latitude, longitude)?;

        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_VARIABLES.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("daily", DAILY_VARIABLES.to_string()),
                ("forecast_days", self.forecast_days.to_string()),
                ("forecast_hours", self.forecast_hours.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;

        let body: ForecastResponse = Self::handle_response(response).await?;
        let bundle = ForecastBundle::from(body);

        bundle
            .validate()
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        Ok(bundle)
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(ReqwestErrorExt::into_fetch_error)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("API request failed with status {}: {}", status, body);
            Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl WeatherFetcher for OpenMeteoClient {
    async fn resolve_city(&self, name: &str) -> Result<CityCoordinates, FetchError> {
        self.search_city(name).await
    }

    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastBundle, FetchError> {
        self.forecast(latitude, longitude).await
    }
}
