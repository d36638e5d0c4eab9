//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Failures from the archive, cache and
//! media crates end up as children of one of these kinds.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A page matching the hash was found but could not be produced. Another
    /// match is never tried in its place.
    #[display("content unavailable for page hash {_0}")]
    ContentUnavailable(#[error(not(source))] String),
    /// The page hash registry or book catalog could not be queried.
    #[display("page hash registry unavailable")]
    Registry,
    /// A match points at a book page the catalog doesn't know about.
    #[display("page {_1} of book {_0} is not in the catalog")]
    PageNotCataloged(#[error(not(source))] String, #[error(not(source))] u32),
    /// Listing or reading the archive failed.
    #[display("archive error")]
    Archive,
    /// The page could not be re-encoded at the requested size.
    #[display("thumbnail error")]
    Thumbnail,
    /// A blocking task panicked or was cancelled.
    #[display("blocking task failed")]
    Task,
    /// A book could not be analysed at all.
    #[display("could not analyse book at {}", _0.display())]
    Analysis(#[error(not(source))] PathBuf),
    /// Persisting an analysed book failed.
    #[display("could not store book")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Registry | Self::Cache)
    }
}
