use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use folio_media::Dimension;
use std::path::PathBuf;

/// An archive in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: String,
    /// Where the archive lives on disk.
    pub path: PathBuf,
    /// Media type of the archive itself, e.g. `application/zip`.
    pub media_type: String,
}

/// One image entry of a book. The page number is its position in the book,
/// starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPage {
    pub file_name: String,
    pub media_type: String,
    pub dimension: Option<Dimension>,
    /// Hex BLAKE3 digest of the entry content; empty when not computed.
    pub file_hash: String,
    pub file_size: Option<u64>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: String,
    pub(crate) path: String,
    pub(crate) media_type: String,
}
impl TryFrom<&Book> for BookRow {
    type Error = Error;
    fn try_from(book: &Book) -> Result<Self, Self::Error> {
        Ok(Self {
            id: book.id.clone(),
            path: book.path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string(),
            media_type: book.media_type.clone(),
        })
    }
}
impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self { id: row.id, path: PathBuf::from(row.path), media_type: row.media_type }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookPageRow {
    pub(crate) file_name: String,
    pub(crate) media_type: String,
    pub(crate) width: Option<i64>,
    pub(crate) height: Option<i64>,
    pub(crate) file_hash: String,
    pub(crate) file_size: Option<i64>,
}
impl TryFrom<&BookPage> for BookPageRow {
    type Error = Error;
    fn try_from(page: &BookPage) -> Result<Self, Self::Error> {
        Ok(Self {
            file_name: page.file_name.clone(),
            media_type: page.media_type.clone(),
            width: page.dimension.map(|d| i64::from(d.width)),
            height: page.dimension.map(|d| i64::from(d.height)),
            file_hash: page.file_hash.clone(),
            file_size: page
                .file_size
                .map(|size| i64::try_from(size).or_raise(|| ErrorKind::InvalidData("file size")))
                .transpose()?,
        })
    }
}
impl TryFrom<BookPageRow> for BookPage {
    type Error = Error;
    fn try_from(row: BookPageRow) -> Result<Self, Self::Error> {
        let dimension = match (row.width, row.height) {
            (Some(width), Some(height)) => Some(
                Dimension::new(
                    u32::try_from(width).or_raise(|| ErrorKind::InvalidData("width"))?,
                    u32::try_from(height).or_raise(|| ErrorKind::InvalidData("height"))?,
                )
                .or_raise(|| ErrorKind::InvalidData("dimension"))?,
            ),
            _ => None,
        };
        Ok(Self {
            file_name: row.file_name,
            media_type: row.media_type,
            dimension,
            file_hash: row.file_hash,
            file_size: row
                .file_size
                .map(|size| u64::try_from(size).or_raise(|| ErrorKind::InvalidData("file size")))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let row = BookPageRow {
            file_name: "page1.jpg".to_string(),
            media_type: "image/jpeg".to_string(),
            width: Some(500),
            height: Some(800),
            file_hash: String::new(),
            file_size: None,
        };
        let page = BookPage::try_from(row).unwrap();
        assert_eq!(page.dimension, Some(Dimension { width: 500, height: 800 }));
        assert_eq!(page.file_size, None);
    }

    #[test]
    fn test_row_with_invalid_dimension() {
        let row = BookPageRow {
            file_name: "page1.jpg".to_string(),
            media_type: "image/jpeg".to_string(),
            width: Some(0),
            height: Some(800),
            file_hash: String::new(),
            file_size: Some(-1),
        };
        let err = BookPage::try_from(row).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidData("dimension")));
    }

    #[test]
    fn test_model_to_row() {
        let page = BookPage {
            file_name: "page2.png".to_string(),
            media_type: "image/png".to_string(),
            dimension: None,
            file_hash: "af1349b9".to_string(),
            file_size: Some(1024),
        };
        let row = BookPageRow::try_from(&page).unwrap();
        assert_eq!((row.width, row.height), (None, None));
        assert_eq!(row.file_size, Some(1024));
    }
}
