use std::error::Error as StdError;

use chatbridge_common::Platform;

/// Crate-wide result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed adapter errors shared across the outbound trait.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid adapter input: {message}")]
    InvalidInput { message: String },

    /// The target message, channel or reaction does not exist on the platform.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Operation is currently unavailable (not connected, channel closed).
    #[error("adapter operation unavailable on platform {platform}: {message}")]
    Unavailable { platform: Platform, message: String },

    /// Wrapped source error from the platform client library.
    #[error("adapter operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl std::fmt::Display) -> Self {
        Self::NotFound {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(platform: Platform, message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            platform,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the platform reported that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
