//! Media Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A media error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Reading the underlying stream failed (truncated, corrupt or unreadable
    /// content). Don't retry with the same input.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The image could not be decoded or encoded.
    #[display("image error: {_0}")]
    Image(image::ImageError),
    /// An image reported a width or height of zero.
    #[display("invalid dimension: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },
    /// A thumbnail was requested with a target size of zero.
    #[display("invalid thumbnail size: {_0}")]
    InvalidSize(#[error(not(source))] u32),
    /// The media type string is not one this crate knows about.
    #[display("unsupported media type: {_0}")]
    UnsupportedMediaType(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Content is either decodable or it isn't; only the transport can be flaky.
        matches!(self, Self::Io(_))
    }
}
