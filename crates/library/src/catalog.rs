use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use folio_archive::ContainerKind;
use folio_cache::Repository;
use std::path::{Path, PathBuf};

/// Everything needed to read one page of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// The archive holding the page.
    pub archive: PathBuf,
    /// Declared media type of the archive; empty when unknown.
    pub container: String,
    /// Exact name of the entry inside the archive.
    pub entry: String,
    /// Media type of the page itself.
    pub media_type: String,
}

/// Maps a page of a book to the archive entry it was read from.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// `None` when either the book or the page (1-based) is unknown.
    async fn locate_page(&self, book_id: &str, page_number: u32) -> Result<Option<PageLocation>>;
}

#[async_trait]
impl BookCatalog for Repository {
    async fn locate_page(&self, book_id: &str, page_number: u32) -> Result<Option<PageLocation>> {
        let Some(book) = self.get_book(book_id).await.or_raise(|| ErrorKind::Registry)? else {
            return Ok(None);
        };
        let page = self.get_book_page(book_id, page_number).await.or_raise(|| ErrorKind::Registry)?;
        Ok(page.map(|page| PageLocation {
            archive: book.path,
            container: book.media_type,
            entry: page.file_name,
            media_type: page.media_type,
        }))
    }
}

/// The container kind for an archive: the declared media type when there is
/// one, otherwise whatever the file content says.
pub(crate) fn container_kind(declared: &str, path: &Path) -> folio_archive::error::Result<ContainerKind> {
    match declared.trim().is_empty() {
        true => ContainerKind::sniff(path),
        false => ContainerKind::from_media_type(declared),
    }
}
