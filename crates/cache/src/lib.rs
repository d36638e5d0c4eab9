//! SQLite database for the library.
//!
//! The archives themselves are the source of truth for books and their
//! pages; those rows can always be rebuilt by indexing the archives again.
//! Decisions about page hashes are the one thing that only lives here.
//!
//! # Architecture
//! - **Books** and their **pages**: every image entry of an archive, in
//!   natural order, with its BLAKE3 content hash.
//! - **Known page hashes**: a hash plus the [`Action`](models::Action) to
//!   take for any page carrying it (scanner credits, ads, blank pages).
//! - **Unknown page hashes** are derived: hashes found on pages that have no
//!   known record yet.

mod db;
pub mod error;
pub mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
