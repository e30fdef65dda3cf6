use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Config;

/// Process-level wiring: validated configuration plus the data directory it names.
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// Load and validate configuration (from `config_path` when given) and make
    /// sure the data directory exists.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let (config, _) = Config::load_validated(config_path)?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.data_dir.display())
        })?;

        tracing::info!("Using data directory {}", config.data_dir.display());

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path()
    }

    /// Path of the flat-file store, if one is still on disk.
    pub fn pending_legacy_file(&self) -> Option<PathBuf> {
        let path = self.config.legacy_path();
        path.exists().then_some(path)
    }

    pub fn shutdown(&self) {
        tracing::info!("Shutting down");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_from_config_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().join("data"),
            ..Config::default()
        };

        let app = App::from_config(config).unwrap();
        assert!(app.config().data_dir.is_dir());
        assert_eq!(app.database_path(), dir.path().join("data").join("locations.db"));
        assert!(app.pending_legacy_file().is_none());
    }

    #[test]
    fn test_pending_legacy_file_detected() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        std::fs::write(dir.path().join("locations.json"), "[]").unwrap();

        let app = App::from_config(config).unwrap();
        assert_eq!(app.pending_legacy_file(), Some(dir.path().join("locations.json")));
    }
}
