//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Per-entry analysis failures are deliberately absent: they never fail a
//! listing and are reported as [`EntryAnalysis::Failed`](crate::EntryAnalysis::Failed).

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The archive is missing, unreadable or not a valid container. Don't
    /// retry until the file on disk changes.
    #[display("archive unreadable: {}", _0.display())]
    ArchiveUnreadable(#[error(not(source))] PathBuf),
    /// The archive is fine, but has no entry with that exact name.
    #[display("entry not found: ({}, {_1})", _0.display())]
    EntryNotFound(#[error(not(source))] PathBuf, String),
    /// No extractor handles this container type.
    #[display("unsupported container: {_0}")]
    UnsupportedContainer(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Whether the caller should surface this as a "not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntryNotFound(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::ArchiveUnreadable(PathBuf::from("/library/comic.cbz")).to_string(),
            "archive unreadable: /library/comic.cbz"
        );
        assert_eq!(
            ErrorKind::EntryNotFound(PathBuf::from("comic.cbz"), "missing.jpg".to_string()).to_string(),
            "entry not found: (comic.cbz, missing.jpg)"
        );
    }

    #[test]
    fn error_kind_not_found() {
        assert!(ErrorKind::EntryNotFound(PathBuf::new(), String::new()).is_not_found());
        assert!(!ErrorKind::ArchiveUnreadable(PathBuf::new()).is_not_found());
    }
}
