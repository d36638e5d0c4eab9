//! Archives and databases for tests.

use crate::analyze::index_book;
use crate::lifecycle::PageHashLifecycle;
use folio_archive::{CacheOptions, Extractors};
use folio_cache::models::Book;
use folio_cache::{Database, Repository};
use image::{ImageFormat, RgbImage};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub(crate) fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub(crate) fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let mut writer = ZipWriter::new(std::fs::File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
    path.to_path_buf()
}

/// An in-memory repository plus extractors, with books stored as zip files
/// in a temporary directory.
pub(crate) struct Library {
    pub(crate) root: PathBuf,
    pub(crate) repo: Repository,
    pub(crate) extractors: Arc<Extractors>,
    pub(crate) lifecycle: PageHashLifecycle,
}

impl Library {
    pub(crate) async fn new(dir: &TempDir) -> Self {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let extractors = Arc::new(Extractors::new(CacheOptions::default()));
        let lifecycle = PageHashLifecycle::from_repository(extractors.clone(), repo.clone());
        Self { root: dir.path().to_path_buf(), repo, extractors, lifecycle }
    }

    pub(crate) fn book(&self, id: &str) -> Book {
        Book { id: id.to_string(), path: self.root.join(format!("{id}.cbz")), media_type: "application/x-cbz".into() }
    }

    /// Write the archive for a book and index it. Returns the archive path.
    pub(crate) async fn add_book(&self, id: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
        let book = self.book(id);
        write_zip(&book.path, entries);
        index_book(&self.extractors, &self.repo, &book).await.unwrap();
        book.path
    }
}
