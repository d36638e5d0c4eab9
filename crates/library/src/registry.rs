use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use folio_cache::Repository;
use folio_cache::models::{Action, Page, PageHash, PageHashMatch, PageHashUnknown, Pageable, UnknownHash};

/// Where known page hashes are recorded and unknown ones are matched against
/// book pages.
#[async_trait]
pub trait PageHashRegistry: Send + Sync {
    /// Every book page carrying `unknown`'s hash and media type (and size,
    /// when the unknown has one), ordered by book then page number.
    async fn find_matches(&self, unknown: &PageHashUnknown, pageable: Pageable) -> Result<Page<PageHashMatch>>;

    /// Known hashes, optionally restricted to some actions.
    async fn find_all_known(&self, actions: Option<&[Action]>, pageable: Pageable) -> Result<Page<PageHash>>;

    /// Hashes found on book pages without a recorded decision, most common
    /// first.
    async fn find_all_unknown(&self, pageable: Pageable) -> Result<Page<UnknownHash>>;

    async fn get_known_thumbnail(&self, hash: &str) -> Result<Option<Vec<u8>>>;

    /// Record (or change) the decision for a hash. A `None` thumbnail keeps
    /// whatever was stored before.
    async fn upsert_known(&self, known: &PageHash, thumbnail: Option<&[u8]>) -> Result<()>;
}

#[async_trait]
impl PageHashRegistry for Repository {
    async fn find_matches(&self, unknown: &PageHashUnknown, pageable: Pageable) -> Result<Page<PageHashMatch>> {
        Repository::find_matches(self, unknown, pageable).await.or_raise(|| ErrorKind::Registry)
    }

    async fn find_all_known(&self, actions: Option<&[Action]>, pageable: Pageable) -> Result<Page<PageHash>> {
        Repository::find_all_known(self, actions, pageable).await.or_raise(|| ErrorKind::Registry)
    }

    async fn find_all_unknown(&self, pageable: Pageable) -> Result<Page<UnknownHash>> {
        Repository::find_all_unknown(self, pageable).await.or_raise(|| ErrorKind::Registry)
    }

    async fn get_known_thumbnail(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        Repository::get_known_thumbnail(self, hash).await.or_raise(|| ErrorKind::Registry)
    }

    async fn upsert_known(&self, known: &PageHash, thumbnail: Option<&[u8]>) -> Result<()> {
        Repository::upsert_known(self, known, thumbnail).await.or_raise(|| ErrorKind::Registry)
    }
}
