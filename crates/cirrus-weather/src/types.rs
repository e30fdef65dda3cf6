use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Showers,
    SnowShowers,
    Thunderstorm,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 | 56 | 57 => Self::Drizzle,
            61 | 63 | 65 | 66 | 67 => Self::Rain,
            71 | 73 | 75 | 77 => Self::Snow,
            80..=82 => Self::Showers,
            85 | 86 => Self::SnowShowers,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Showers => "Showers",
            Self::SnowShowers => "Snow Showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

/// Best geocoder match for a free-text city query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCoordinates {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: i32,
    pub apparent_temperature: f64,
    pub wind_speed: f64,
    pub is_day: bool,
    pub weather_code: i32,
    pub pressure_msl: f64,
}

impl CurrentConditions {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// Hourly series as parallel arrays; index `i` of every array describes the same hour.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<i32>,
    pub wind_speed: Vec<f64>,
}

/// Daily series as parallel arrays; index `i` of every array describes the same day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub temperature_max: Vec<f64>,
    pub temperature_min: Vec<f64>,
    pub wind_speed_max: Vec<f64>,
}

/// Last-known weather snapshot for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

impl ForecastBundle {
    /// Check the equal-length invariant of both series.
    pub fn validate(&self) -> Result<(), SeriesLengthMismatch> {
        self.hourly.validate()?;
        self.daily.validate()
    }
}

/// A series whose parallel arrays disagree on length
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{series} series has mismatched lengths: {lengths:?}")]
pub struct SeriesLengthMismatch {
    pub series: &'static str,
    pub lengths: Vec<(&'static str, usize)>,
}

pub(crate) fn check_lengths(
    series: &'static str,
    lengths: Vec<(&'static str, usize)>,
) -> Result<(), SeriesLengthMismatch> {
    let first = lengths.first().map(|(_, len)| *len).unwrap_or(0);
    if lengths.iter().all(|(_, len)| *len == first) {
        Ok(())
    } else {
        Err(SeriesLengthMismatch { series, lengths })
    }
}
