//! Turning an archive on disk into the pages of a [`Book`].

use crate::catalog::container_kind;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_archive::{EntryAnalysis, Extractors, MediaContainerEntry};
use folio_cache::Repository;
use folio_cache::models::{Book, BookPage};
use std::sync::Arc;
use tracing::instrument;

/// List the images of a book, in reading order, with their dimensions and
/// content hash.
///
/// Entries that aren't images, failed analysis, or can't be read are logged
/// and skipped, so page numbers only count the pages that made it.
#[instrument(skip_all, fields(book_id = %book.id, path = %book.path.display(), pages))]
pub async fn analyze_book(extractors: &Arc<Extractors>, book: &Book) -> Result<Vec<BookPage>> {
    let pages = spawn_analysis(extractors, book, false).await?;
    tracing::Span::current().record("pages", pages.len());
    Ok(pages)
}

/// Closing a cached handle waits for its current reader, so `reopen` happens
/// on the blocking pool along with the analysis.
async fn spawn_analysis(extractors: &Arc<Extractors>, book: &Book, reopen: bool) -> Result<Vec<BookPage>> {
    let extractors = Arc::clone(extractors);
    let book = book.clone();
    tokio::task::spawn_blocking(move || {
        if reopen {
            extractors.invalidate(&book.path);
        }
        analyze_blocking(&extractors, &book)
    })
    .await
    .or_raise(|| ErrorKind::Task)?
}

fn analyze_blocking(extractors: &Extractors, book: &Book) -> Result<Vec<BookPage>> {
    let unreadable = || ErrorKind::Analysis(book.path.clone());
    let kind = container_kind(&book.media_type, &book.path).or_raise(unreadable)?;
    let entries = extractors.list_entries(kind, &book.path, true).or_raise(unreadable)?;
    let mut pages = Vec::with_capacity(entries.len());
    for entry in entries {
        let MediaContainerEntry { name, analysis } = entry;
        let (media_type, dimension) = match analysis {
            EntryAnalysis::Analyzed { media_type, dimension, .. } => (media_type, dimension),
            EntryAnalysis::Failed { comment } => {
                tracing::warn!(entry = %name, %comment, "skipping unreadable entry");
                continue;
            },
        };
        if !media_type.is_image() {
            tracing::debug!(entry = %name, %media_type, "skipping non-image entry");
            continue;
        }
        let bytes = match extractors.stream_entry(kind, &book.path, &name) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(entry = %name, error = ?err, "skipping page that could not be read");
                continue;
            },
        };
        pages.push(BookPage {
            file_hash: blake3::hash(&bytes).to_string(),
            file_size: Some(bytes.len() as u64),
            file_name: name,
            media_type: media_type.to_string(),
            dimension,
        });
    }
    Ok(pages)
}

/// Analyse a book and store it with its pages, replacing whatever was stored
/// for it before. Its page hashes immediately take part in matching.
#[instrument(skip_all, fields(book_id = %book.id))]
pub async fn index_book(extractors: &Arc<Extractors>, repository: &Repository, book: &Book) -> Result<Vec<BookPage>> {
    // The archive may have been rewritten since a handle was last opened.
    let pages = spawn_analysis(extractors, book, true).await?;
    repository.upsert_book(book, &pages).await.or_raise(|| ErrorKind::Cache)?;
    tracing::info!(pages = pages.len(), "indexed book");
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, Library};
    use folio_cache::models::{PageHashUnknown, Pageable};
    use folio_media::Dimension;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_analyze_book() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(&dir).await;
        let (first, tenth) = (fixtures::jpeg(500, 800), fixtures::png(30, 20));
        let book = library.book("comic");
        fixtures::write_zip(
            &book.path,
            &[
                ("page10.png", tenth.clone()),
                ("cover.txt", b"Scanned by a friend".to_vec()),
                ("page1.jpg", first.clone()),
            ],
        );

        let pages = analyze_book(&library.extractors, &book).await.unwrap();

        assert_eq!(
            pages,
            vec![
                BookPage {
                    file_name: "page1.jpg".into(),
                    media_type: "image/jpeg".into(),
                    dimension: Some(Dimension { width: 500, height: 800 }),
                    file_hash: blake3::hash(&first).to_string(),
                    file_size: Some(first.len() as u64),
                },
                BookPage {
                    file_name: "page10.png".into(),
                    media_type: "image/png".into(),
                    dimension: Some(Dimension { width: 30, height: 20 }),
                    file_hash: blake3::hash(&tenth).to_string(),
                    file_size: Some(tenth.len() as u64),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_analyze_book_sniffs_undeclared_container() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(&dir).await;
        let mut book = library.book("comic");
        book.media_type = String::new();
        fixtures::write_zip(&book.path, &[("page1.jpg", fixtures::jpeg(8, 8))]);

        assert_eq!(analyze_book(&library.extractors, &book).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_book_unreadable_archive() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(&dir).await;
        let book = library.book("comic");
        std::fs::write(&book.path, b"not an archive").unwrap();

        let err = analyze_book(&library.extractors, &book).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Analysis(path) if *path == book.path));
    }

    #[tokio::test]
    async fn test_index_book_feeds_unknown_hashes() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(&dir).await;
        let credit = fixtures::jpeg(64, 64);
        library.add_book("a", &[("001.jpg", fixtures::jpeg(10, 10)), ("credit.jpg", credit.clone())]).await;
        library.add_book("b", &[("credit.jpg", credit.clone())]).await;

        let unknown = library.repo.find_all_unknown(Pageable::default()).await.unwrap();
        assert_eq!(unknown.total, 2);
        let most_common = &unknown.content[0];
        assert_eq!(most_common.match_count, 2);
        assert_eq!(
            most_common.unknown,
            PageHashUnknown::new(blake3::hash(&credit).to_string(), "image/jpeg", Some(credit.len() as u64))
        );
    }

    #[tokio::test]
    async fn test_reindex_picks_up_rewritten_archive() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(&dir).await;
        let path = library.add_book("a", &[("001.jpg", fixtures::jpeg(10, 10))]).await;
        // Warm the handle cache with the old archive.
        library.extractors.stream_entry(folio_archive::ContainerKind::Zip, &path, "001.jpg").unwrap();

        library.add_book("a", &[("001.jpg", fixtures::jpeg(10, 10)), ("002.jpg", fixtures::jpeg(12, 12))]).await;
        assert_eq!(library.repo.get_book_pages("a").await.unwrap().len(), 2);
    }
}
