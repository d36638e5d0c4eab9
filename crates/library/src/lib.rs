//! The parts of the library that tie archives to the page hash database.
//!
//! - [`analyze_book`] / [`index_book`] read a book's pages out of its
//!   archive and fingerprint them
//! - [`PageHashLifecycle`] resolves an unknown page hash to the content of a
//!   page carrying it, optionally as a thumbnail
//! - [`PageHashRegistry`] and [`BookCatalog`] are the seams to storage, both
//!   implemented by [`folio_cache::Repository`]

mod analyze;
mod catalog;
pub mod error;
#[cfg(test)]
mod fixtures;
mod lifecycle;
mod registry;

pub use crate::analyze::{analyze_book, index_book};
pub use crate::catalog::{BookCatalog, PageLocation};
pub use crate::lifecycle::{PageHashLifecycle, TypedBytes};
pub use crate::registry::PageHashRegistry;
