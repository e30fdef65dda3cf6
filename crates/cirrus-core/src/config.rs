use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the location database and any legacy file
    pub data_dir: PathBuf,

    /// Forecast and geocoding endpoints
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Staleness and dedup tuning
    #[serde(default)]
    pub sync: SyncConfig,

    /// Persistence file names, relative to `data_dir`
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub forecast_url: String,
    pub geocoding_url: String,
    pub reverse_geocode_url: String,

    /// Applied to connect, read and whole-request timeouts
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    #[serde(default = "default_forecast_hours")]
    pub forecast_hours: u32,
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("Cirrus/{}", env!("CARGO_PKG_VERSION"))
}

fn default_forecast_days() -> u32 {
    7
}

fn default_forecast_hours() -> u32 {
    24
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            reverse_geocode_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            forecast_days: default_forecast_days(),
            forecast_hours: default_forecast_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// A forecast younger than this is not refetched
    #[serde(default = "default_freshness_ttl_secs")]
    pub freshness_ttl_secs: u64,

    /// Coordinates closer than this are treated as the same place
    #[serde(default = "default_nearby_threshold_km")]
    pub nearby_threshold_km: f64,
}

fn default_freshness_ttl_secs() -> u64 {
    120
}

fn default_nearby_threshold_km() -> f64 {
    10.0
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            freshness_ttl_secs: default_freshness_ttl_secs(),
            nearby_threshold_km: default_nearby_threshold_km(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Flat JSON document from older releases; migrated on startup when present
    #[serde(default = "default_legacy_file")]
    pub legacy_file: String,
}

fn default_database_file() -> String {
    "locations.db".to_string()
}

fn default_legacy_file() -> String {
    "locations.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            legacy_file: default_legacy_file(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cirrus");

        Self {
            data_dir,
            weather: WeatherConfig::default(),
            sync: SyncConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors; warnings are logged.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        self.validate_url(&self.weather.geocoding_url, "weather.geocoding_url", &mut result);
        self.validate_url(
            &self.weather.reverse_geocode_url,
            "weather.reverse_geocode_url",
            &mut result,
        );

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.weather.request_timeout_secs > 120 {
            result.add_warning(
                "weather.request_timeout_secs",
                "Request timeout is unusually long (>120s)",
            );
        }

        if self.weather.forecast_days == 0 || self.weather.forecast_days > 16 {
            result.add_error("weather.forecast_days", "Forecast days must be between 1 and 16");
        }

        if self.weather.forecast_hours == 0 {
            result.add_error("weather.forecast_hours", "Forecast hours must be greater than 0");
        }

        if self.sync.freshness_ttl_secs == 0 {
            result.add_warning(
                "sync.freshness_ttl_secs",
                "Freshness window disabled - every page view refetches",
            );
        }

        let threshold = self.sync.nearby_threshold_km;
        if !threshold.is_finite() || threshold <= 0.0 {
            result.add_error(
                "sync.nearby_threshold_km",
                "Nearby threshold must be a positive distance",
            );
        }

        if self.storage.database_file.trim().is_empty() {
            result.add_error("storage.database_file", "Database file name cannot be empty");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.database_file)
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.legacy_file)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("cirrus");

        Ok(config_dir.join("config.toml"))
    }
}
