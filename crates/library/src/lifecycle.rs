use crate::catalog::{BookCatalog, PageLocation, container_kind};
use crate::error::{ErrorKind, Result};
use crate::registry::PageHashRegistry;
use exn::{OptionExt, ResultExt};
use folio_archive::Extractors;
use folio_cache::Repository;
use folio_cache::models::{PageHashMatch, PageHashUnknown, Pageable};
use folio_media::{MediaType, thumbnail};
use std::sync::Arc;
use tracing::instrument;

/// Raw content together with the media type it should be served as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedBytes {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// Resolves unknown page hashes to a representative page: the content of the
/// first book page that carries the hash.
#[derive(Clone)]
pub struct PageHashLifecycle {
    extractors: Arc<Extractors>,
    registry: Arc<dyn PageHashRegistry>,
    catalog: Arc<dyn BookCatalog>,
}

impl PageHashLifecycle {
    pub fn new(
        extractors: Arc<Extractors>,
        registry: Arc<dyn PageHashRegistry>,
        catalog: Arc<dyn BookCatalog>,
    ) -> Self {
        Self { extractors, registry, catalog }
    }

    /// The repository is both the registry and the catalog.
    pub fn from_repository(extractors: Arc<Extractors>, repository: Repository) -> Self {
        let repository = Arc::new(repository);
        Self::new(extractors, repository.clone(), repository)
    }

    pub fn registry(&self) -> &Arc<dyn PageHashRegistry> {
        &self.registry
    }

    /// Content of the first page matching `unknown`, or `None` when no page
    /// carries the hash.
    ///
    /// With `resize`, image pages are re-encoded as JPEG so that their longest
    /// side is at most that many pixels; other pages are returned untouched.
    /// Once a match is chosen, any failure to produce it is
    /// [`ContentUnavailable`](ErrorKind::ContentUnavailable).
    #[instrument(skip_all, fields(hash = %unknown.hash, resize = ?resize, book_id, page_number))]
    pub async fn get_page(&self, unknown: &PageHashUnknown, resize: Option<u32>) -> Result<Option<TypedBytes>> {
        let matches = self.registry.find_matches(unknown, Pageable::first(1)).await?;
        let Some(first) = matches.content.into_iter().next() else {
            tracing::debug!("no page carries this hash");
            return Ok(None);
        };
        let span = tracing::Span::current();
        span.record("book_id", first.book_id.as_str());
        span.record("page_number", first.page_number);

        let page = self.load(&first, resize).await.or_raise(|| ErrorKind::ContentUnavailable(unknown.hash.clone()))?;
        Ok(Some(page))
    }

    async fn load(&self, page: &PageHashMatch, resize: Option<u32>) -> Result<TypedBytes> {
        let location = self
            .catalog
            .locate_page(&page.book_id, page.page_number)
            .await?
            .ok_or_raise(|| ErrorKind::PageNotCataloged(page.book_id.clone(), page.page_number))?;
        let extractors = Arc::clone(&self.extractors);
        tokio::task::spawn_blocking(move || read_page(&extractors, location, resize))
            .await
            .or_raise(|| ErrorKind::Task)?
    }
}

fn read_page(extractors: &Extractors, location: PageLocation, resize: Option<u32>) -> Result<TypedBytes> {
    let kind = container_kind(&location.container, &location.archive).or_raise(|| ErrorKind::Archive)?;
    let bytes = extractors.stream_entry(kind, &location.archive, &location.entry).or_raise(|| ErrorKind::Archive)?;
    match resize {
        Some(longest_side) if MediaType::is_image_str(&location.media_type) => {
            let thumbnail = thumbnail::resize(&bytes, longest_side).or_raise(|| ErrorKind::Thumbnail)?;
            tracing::debug!(width = thumbnail.dimension.width, height = thumbnail.dimension.height, "resized page");
            Ok(TypedBytes { media_type: thumbnail.media_type().to_string(), bytes: thumbnail.bytes })
        },
        _ => Ok(TypedBytes { bytes, media_type: location.media_type }),
    }
}
