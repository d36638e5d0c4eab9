//! Repository for books, their pages, and page hashes.
//!
//! Known page hashes and book pages are only loosely coupled: a hash is
//! "unknown" for as long as pages carry it but no decision has been recorded
//! for it, and a known hash stays known even once no page carries it anymore.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{
    Action, Book, BookPage, BookPageRow, BookRow, MatchRow, Page, PageHash, PageHashMatch, PageHashRow,
    PageHashUnknown, Pageable, UnknownHash, UnknownRow, from_size,
};
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use time::UtcDateTime;
use tracing::instrument;

/// Repository for managing books, pages and page hashes in the database.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Insert or replace a book together with all of its pages.
    ///
    /// Pages are numbered by their position in `pages`, starting at 1. Any
    /// pages previously recorded for the book are removed first, all in one
    /// transaction.
    #[instrument(skip_all, fields(book_id = %book.id, pages = pages.len()))]
    pub async fn upsert_book(&self, book: &Book, pages: &[BookPage]) -> Result<()> {
        let row = BookRow::try_from(book)?;
        let page_rows = pages.iter().map(BookPageRow::try_from).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/upsert_book.sql"))
            .bind(&row.id)
            .bind(row.path)
            .bind(row.media_type)
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/delete_book_pages.sql"))
            .bind(&row.id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for (index, page) in page_rows.into_iter().enumerate() {
            let number = i64::try_from(index + 1).or_raise(|| ErrorKind::InvalidData("page number"))?;
            sqlx::query(include_str!("../queries/insert_book_page.sql"))
                .bind(&row.id)
                .bind(number)
                .bind(page.file_name)
                .bind(page.media_type)
                .bind(page.width)
                .bind(page.height)
                .bind(page.file_hash)
                .bind(page.file_size)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    pub async fn get_book(&self, id: &str) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(Book::from))
    }

    /// All pages of a book, in page order.
    pub async fn get_book_pages(&self, id: &str) -> Result<Vec<BookPage>> {
        let rows: Vec<BookPageRow> = sqlx::query_as(include_str!("../queries/get_book_pages.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(BookPage::try_from).collect()
    }

    /// A single page of a book; `number` starts at 1.
    pub async fn get_book_page(&self, id: &str, number: u32) -> Result<Option<BookPage>> {
        let row: Option<BookPageRow> = sqlx::query_as(include_str!("../queries/get_book_page.sql"))
            .bind(id)
            .bind(i64::from(number))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(BookPage::try_from).transpose()
    }

    // =========================================================================
    // Page hashes
    // =========================================================================

    /// Every book page carrying the unknown hash, with the same media type
    /// and, when the unknown has one, the same size. Ordered by book, then
    /// page number.
    #[instrument(skip(self), fields(hash = %unknown.hash))]
    pub async fn find_matches(&self, unknown: &PageHashUnknown, pageable: Pageable) -> Result<Page<PageHashMatch>> {
        let size = from_size(unknown.size)?;
        let rows: Vec<MatchRow> = sqlx::query_as(include_str!("../queries/find_matches.sql"))
            .bind(&unknown.hash)
            .bind(&unknown.media_type)
            .bind(size)
            .bind(pageable.limit())
            .bind(pageable.offset())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let total: i64 = sqlx::query_scalar(include_str!("../queries/count_matches.sql"))
            .bind(&unknown.hash)
            .bind(&unknown.media_type)
            .bind(size)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let content = rows.into_iter().map(PageHashMatch::try_from).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, pageable, to_total(total)?))
    }

    /// Hashes carried by book pages that have no recorded decision, most
    /// widespread first.
    pub async fn find_all_unknown(&self, pageable: Pageable) -> Result<Page<UnknownHash>> {
        let rows: Vec<UnknownRow> = sqlx::query_as(include_str!("../queries/find_all_unknown.sql"))
            .bind(pageable.limit())
            .bind(pageable.offset())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let total: i64 = sqlx::query_scalar(include_str!("../queries/count_all_unknown.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let content = rows.into_iter().map(UnknownHash::try_from).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, pageable, to_total(total)?))
    }

    /// Known hashes, most recently modified first, optionally restricted to
    /// some actions. An empty filter matches nothing.
    pub async fn find_all_known(&self, actions: Option<&[Action]>, pageable: Pageable) -> Result<Page<PageHash>> {
        let mut select = QueryBuilder::<Sqlite>::new(
            "SELECT hash, media_type, size, action, delete_count, created_at, modified_at FROM page_hashes",
        );
        push_action_filter(&mut select, actions);
        select.push(" ORDER BY modified_at DESC, hash LIMIT ");
        select.push_bind(pageable.limit());
        select.push(" OFFSET ");
        select.push_bind(pageable.offset());
        let rows: Vec<PageHashRow> =
            select.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM page_hashes");
        push_action_filter(&mut count, actions);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await.or_raise(|| ErrorKind::Database)?;

        let content = rows.into_iter().map(PageHash::try_from).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, pageable, to_total(total)?))
    }

    pub async fn get_known(&self, hash: &str) -> Result<Option<PageHash>> {
        let row: Option<PageHashRow> = sqlx::query_as(include_str!("../queries/get_known.sql"))
            .bind(hash)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(PageHash::try_from).transpose()
    }

    /// The stored thumbnail of a known hash, if both exist.
    pub async fn get_known_thumbnail(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        let thumbnail: Option<Option<Vec<u8>>> = sqlx::query_scalar(include_str!("../queries/get_known_thumbnail.sql"))
            .bind(hash)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(thumbnail.flatten())
    }

    /// Record (or change) the decision for a hash. Once recorded, the hash no
    /// longer shows up as unknown. An existing thumbnail is kept when
    /// `thumbnail` is `None`.
    #[instrument(skip(self, thumbnail), fields(hash = %known.hash, action = %known.action))]
    pub async fn upsert_known(&self, known: &PageHash, thumbnail: Option<&[u8]>) -> Result<()> {
        let row = PageHashRow::try_from(known)?;
        sqlx::query(include_str!("../queries/upsert_known.sql"))
            .bind(row.hash)
            .bind(row.media_type)
            .bind(row.size)
            .bind(row.action)
            .bind(row.delete_count)
            .bind(thumbnail)
            .bind(row.modified_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

fn push_action_filter(query: &mut QueryBuilder<'_, Sqlite>, actions: Option<&[Action]>) {
    let Some(actions) = actions else { return };
    if actions.is_empty() {
        query.push(" WHERE 0");
        return;
    }
    query.push(" WHERE action IN (");
    let mut separated = query.separated(", ");
    for action in actions {
        separated.push_bind(action.as_str());
    }
    separated.push_unseparated(")");
}

fn to_total(total: i64) -> Result<u64> {
    u64::try_from(total).or_raise(|| ErrorKind::InvalidData("total"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_media::Dimension;
    use std::path::PathBuf;

    fn book(id: &str) -> Book {
        Book { id: id.to_string(), path: PathBuf::from(format!("/library/{id}.cbz")), media_type: "application/zip".into() }
    }

    fn page(name: &str, hash: &str, size: u64) -> BookPage {
        BookPage {
            file_name: name.to_string(),
            media_type: "image/jpeg".to_string(),
            dimension: Some(Dimension { width: 500, height: 800 }),
            file_hash: hash.to_string(),
            file_size: Some(size),
        }
    }

    async fn repository() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    /// Two books sharing a scanner credit page ("credit"), one of them with
    /// an unhashed page.
    async fn seeded() -> Repository {
        let repo = repository().await;
        repo.upsert_book(&book("a"), &[page("001.jpg", "story-a", 100), page("002.jpg", "credit", 50)])
            .await
            .unwrap();
        repo.upsert_book(
            &book("b"),
            &[page("001.jpg", "story-b", 120), page("099.jpg", "credit", 50), page("100.jpg", "", 10)],
        )
        .await
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_upsert_and_get_book() {
        let repo = seeded().await;
        assert_eq!(repo.get_book("a").await.unwrap(), Some(book("a")));
        assert_eq!(repo.get_book("missing").await.unwrap(), None);

        let pages = repo.get_book_pages("b").await.unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].file_name, "099.jpg");
        assert_eq!(repo.get_book_page("b", 2).await.unwrap(), Some(page("099.jpg", "credit", 50)));
        assert_eq!(repo.get_book_page("b", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_book_replaces_pages() {
        let repo = seeded().await;
        repo.upsert_book(&book("b"), &[page("cover.jpg", "story-b", 120)]).await.unwrap();
        let pages = repo.get_book_pages("b").await.unwrap();
        assert_eq!(pages, vec![page("cover.jpg", "story-b", 120)]);
    }

    #[tokio::test]
    async fn test_find_matches() {
        let repo = seeded().await;
        let unknown = PageHashUnknown::new("credit", "image/jpeg", Some(50));

        let matches = repo.find_matches(&unknown, Pageable::default()).await.unwrap();
        assert_eq!(matches.total, 2);
        let locations: Vec<_> =
            matches.content.iter().map(|m| (m.book_id.as_str(), m.page_number, m.file_name.as_str())).collect();
        assert_eq!(locations, vec![("a", 2, "002.jpg"), ("b", 2, "099.jpg")]);

        let first = repo.find_matches(&unknown, Pageable::first(1)).await.unwrap();
        assert_eq!(first.content.len(), 1);
        assert_eq!(first.content[0].book_id, "a");
        assert_eq!(first.total, 2);
    }

    #[tokio::test]
    async fn test_find_matches_size_and_media_type() {
        let repo = seeded().await;
        let any_size = PageHashUnknown::new("credit", "image/jpeg", None);
        assert_eq!(repo.find_matches(&any_size, Pageable::default()).await.unwrap().total, 2);
        let wrong_size = PageHashUnknown::new("credit", "image/jpeg", Some(51));
        assert!(repo.find_matches(&wrong_size, Pageable::default()).await.unwrap().is_empty());
        let wrong_type = PageHashUnknown::new("credit", "image/png", None);
        assert!(repo.find_matches(&wrong_type, Pageable::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_all_unknown() {
        let repo = seeded().await;
        let unknown = repo.find_all_unknown(Pageable::default()).await.unwrap();
        assert_eq!(unknown.total, 3);
        // Most widespread first, then by hash; unhashed pages never show up.
        let hashes: Vec<_> = unknown.content.iter().map(|u| (u.unknown.hash.as_str(), u.match_count)).collect();
        assert_eq!(hashes, vec![("credit", 2), ("story-a", 1), ("story-b", 1)]);
    }

    #[tokio::test]
    async fn test_known_hashes_are_no_longer_unknown() {
        let repo = seeded().await;
        repo.upsert_known(&PageHash::new("credit", "image/jpeg", Some(50), Action::DeleteAuto), Some(b"jpeg"))
            .await
            .unwrap();

        let unknown = repo.find_all_unknown(Pageable::default()).await.unwrap();
        assert_eq!(unknown.total, 2);
        assert!(unknown.content.iter().all(|u| u.unknown.hash != "credit"));
    }

    #[tokio::test]
    async fn test_upsert_known() {
        let repo = repository().await;
        let mut known = PageHash::new("credit", "image/jpeg", Some(50), Action::DeleteManual);
        repo.upsert_known(&known, Some(b"first")).await.unwrap();

        known.action = Action::Ignore;
        known.delete_count = 4;
        repo.upsert_known(&known, None).await.unwrap();

        let stored = repo.get_known("credit").await.unwrap().unwrap();
        assert_eq!(stored.action, Action::Ignore);
        assert_eq!(stored.delete_count, 4);
        // No new thumbnail: the old one stays.
        assert_eq!(repo.get_known_thumbnail("credit").await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(repo.get_known_thumbnail("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_known_without_thumbnail() {
        let repo = repository().await;
        repo.upsert_known(&PageHash::new("credit", "image/jpeg", None, Action::Ignore), None).await.unwrap();
        assert_eq!(repo.get_known_thumbnail("credit").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_all_known_filters() {
        let repo = repository().await;
        for (hash, action) in [("a", Action::DeleteAuto), ("b", Action::DeleteManual), ("c", Action::Ignore)] {
            repo.upsert_known(&PageHash::new(hash, "image/png", None, action), None).await.unwrap();
        }

        assert_eq!(repo.find_all_known(None, Pageable::default()).await.unwrap().total, 3);
        let deletes = repo
            .find_all_known(Some(&[Action::DeleteAuto, Action::DeleteManual]), Pageable::default())
            .await
            .unwrap();
        let mut hashes: Vec<_> = deletes.content.iter().map(|k| k.hash.as_str()).collect();
        hashes.sort();
        assert_eq!(hashes, vec!["a", "b"]);
        assert_eq!(deletes.total, 2);
        assert_eq!(repo.find_all_known(Some(&[]), Pageable::default()).await.unwrap().total, 0);

        let second = repo.find_all_known(None, Pageable::new(1, 2)).await.unwrap();
        assert_eq!(second.content.len(), 1);
        assert_eq!(second.total_pages(), 2);
    }
}
