use chatbridge_common::Platform;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An outbound call to a platform adapter failed. The event is dropped.
    #[error("{operation} on platform {platform} failed: {source}")]
    Adapter {
        platform: Platform,
        operation: &'static str,
        #[source]
        source: chatbridge_channels::Error,
    },

    /// The bridge cannot be built from the given configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    #[must_use]
    pub fn adapter(
        platform: Platform,
        operation: &'static str,
        source: chatbridge_channels::Error,
    ) -> Self {
        Self::Adapter {
            platform,
            operation,
            source,
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
