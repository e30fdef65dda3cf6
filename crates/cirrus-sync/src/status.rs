use std::fmt;

/// Outcome of the most recent operation, shown once and then cleared by the
/// consumer via [`crate::LocationSync::message_shown`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransientStatus {
    #[default]
    Idle,
    Loading,
    Success { message: String },
    Error { message: String },
    NavigateToPage { index: usize },
}

impl TransientStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The message carried by `Success` or `Error`.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message } | Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for TransientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Success { message } => write!(f, "{}", message),
            Self::Error { message } => write!(f, "error: {}", message),
            Self::NavigateToPage { index } => write!(f, "showing page {}", index),
        }
    }
}
