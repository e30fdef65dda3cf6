pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{Config, StorageConfig, SyncConfig, ValidationResult, WeatherConfig};
pub use error::{
    ConfigError, FetchError, ReqwestErrorExt, RusqliteErrorExt, StoreError, TransportKind,
};

use anyhow::Result;

/// Initialize logging
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Cirrus core initialized");
    Ok(())
}
