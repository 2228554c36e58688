//! Error types for marginalia.

use thiserror::Error;

/// Result type for marginalia operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for marginalia operations.
///
/// These are boundary errors (parsing producer output, exhausted retries).
/// Failure to locate an individual annotation is *data*, not a fault, and
/// is reported per annotation via [`crate::LocateFailure`] instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Producer payload could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No JSON payload found in producer output.
    #[error("No JSON array found in producer output")]
    NoJsonFound,

    /// Bounded retry gave up.
    #[error("Retry exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Number of attempts made before giving up.
        attempts: usize,
        /// Message from the final failure.
        last: String,
    },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a retry-exhausted error.
    pub fn retry_exhausted(attempts: usize, last: impl Into<String>) -> Self {
        Error::RetryExhausted {
            attempts,
            last: last.into(),
        }
    }
}
