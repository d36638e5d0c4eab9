//! Listing and random-access reading of entries inside comic and book
//! containers.
//!
//! - [`Extractors`] dispatches by [`ContainerKind`] to [`ZipExtractor`] or
//!   [`TarExtractor`]
//! - Listings are analysed per entry ([`EntryAnalysis`]) and sorted in
//!   natural order; one unreadable entry never fails the whole listing
//! - Zip handles are kept open in a bounded, expiring [`HandleCache`]
//!
//! All operations are blocking; async callers should move them onto a
//! blocking thread.

mod cache;
mod container;
mod entry;
pub mod error;
#[cfg(test)]
mod fixtures;
mod tar;
mod zip;

pub use crate::cache::{CacheOptions, EvictionCause, HandleCache};
pub use crate::container::{ContainerKind, Extractors};
pub use crate::entry::{EntryAnalysis, MediaContainerEntry};
pub use crate::tar::TarExtractor;
pub use crate::zip::ZipExtractor;
