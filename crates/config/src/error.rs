//! Config Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source could not be read or didn't match the expected shape.
    #[display("could not load configuration: {_0}")]
    Load(#[error(not(source))] String),
    /// Every source loaded, but a value is out of range.
    #[display("invalid configuration value for {_0}: {_1}")]
    Invalid(#[error(not(source))] &'static str, #[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
