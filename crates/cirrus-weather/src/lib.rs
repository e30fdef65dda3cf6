//! Weather data for Cirrus
//!
//! Forecasts and forward geocoding via the Open-Meteo API, reverse geocoding
//! via Nominatim, and the capability traits the sync core is written against.

pub mod fetch;
pub mod geocode;
pub mod provider;
pub mod series;
pub mod types;

pub use fetch::{validate_coordinates, ReverseGeocoder, WeatherFetcher};
pub use geocode::NominatimGeocoder;
pub use provider::OpenMeteoClient;
pub use series::{DailyPoint, HourlyPoint};
pub use types::*;
