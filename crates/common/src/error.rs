use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A native id string could not be interpreted.
    #[error("invalid native id {value:?}: {reason}")]
    InvalidId { value: String, reason: &'static str },

    #[error("{0}")]
    Message(String),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can wrap a plain message. Required by [`impl_context!`].
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Define a crate-local `Context` trait that prefixes any displayable error
/// with a message and converts it into the crate's `Error`.
///
/// The invoking module must define `Error: FromMessage` and a `Result<T>`
/// alias.
///
/// ```ignore
/// chatbridge_common::impl_context!();
///
/// let config = toml::from_str(raw).with_context(|| format!("parsing {path}"))?;
/// ```
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> Result<T>;

            fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T>;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.with_context(|| context)
            }

            fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T> {
                self.map_err(|source| {
                    let context: String = f().into();
                    <Error as $crate::FromMessage>::from_message(format!("{context}: {source}"))
                })
            }
        }
    };
}
