//! Centralized error types for Cirrus.
//!
//! This module provides a typed error hierarchy that:
//! - Separates fetch failures (geocoding, forecast) from storage failures
//! - Provides user-friendly messages suitable for status display
//! - Preserves full error context for logging

use thiserror::Error;

/// Errors raised by the geocoding and forecast clients.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The geocoder had no match for the query.
    #[error("No match for: {0}")]
    NotFound(String),

    /// Rejected locally, before any request was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connectivity failure or client timeout.
    #[error("{kind}: {message}")]
    Transport { kind: TransportKind, message: String },

    /// Non-2xx response from the upstream API.
    #[error("Upstream error: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// 2xx response whose body could not be used.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            kind: TransportKind::Connect,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            kind: TransportKind::Timeout,
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "Location not found. Check and try again.",
            FetchError::InvalidArgument(_) => "The coordinates are not valid.",
            FetchError::Transport {
                kind: TransportKind::Timeout,
                ..
            } => "The request timed out. Please try again.",
            FetchError::Transport { .. } => "Unable to connect. Check your internet connection.",
            FetchError::Upstream { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            FetchError::Upstream { .. } => "The weather request failed. Please try again.",
            FetchError::MalformedResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }

    /// Transport-level failures as opposed to answers from the service.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FetchError::Transport {
                kind: TransportKind::Timeout,
                ..
            }
        )
    }
}

/// What went wrong below the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Connect,
    Timeout,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Connect => write!(f, "Connection failed"),
            TransportKind::Timeout => write!(f, "Request timed out"),
        }
    }
}

/// Location store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Location not found: {0}")]
    NotFound(i64),

    /// Write or read against the backing store failed.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Persisted data could not be decoded.
    #[error("Parse failure: {0}")]
    Parse(String),
}

impl StoreError {
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "That location is no longer saved.",
            StoreError::Persistence(_) => "Saved locations could not be updated.",
            StoreError::Parse(_) => "Saved location data is unreadable and was ignored.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_fetch_error(self) -> FetchError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_fetch_error(self) -> FetchError {
        if self.is_timeout() {
            FetchError::timeout(self.to_string())
        } else if let Some(status) = self.status() {
            FetchError::Upstream {
                status: status.as_u16(),
                body: self.to_string(),
            }
        } else if self.is_decode() {
            FetchError::MalformedResponse(self.to_string())
        } else {
            FetchError::transport(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_store_error(self) -> StoreError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_store_error(self) -> StoreError {
        match &self {
            rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
                StoreError::Parse(self.to_string())
            }
            _ => StoreError::Persistence(self.to_string()),
        }
    }
}
