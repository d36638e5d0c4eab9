//! Opening the library database.
//!
//! Every `folio` invocation opens the file, runs whatever migrations it has
//! not seen yet and closes it again on exit. Several invocations may have the
//! same file open at once: one indexing a book while another lists hashes.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Library tasks run a handful of queries side by side, never more.
const MAX_CONNECTIONS: u32 = 4;
/// Indexing writes a whole book in one transaction. Another process waiting
/// on it should outlast a large book rather than fail.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Pool of connections to the library database, with the schema migrated.
///
/// Queries go through [`Repository::from`](crate::Repository).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file at `path`, along with any missing
    /// parent directories.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
        }
        tracing::debug!(path = %path.display(), "opening library database");
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            // Lets readers in other processes carry on while a book is indexed.
            .journal_mode(SqliteJournalMode::Wal)
            // Known page hash decisions exist nowhere else.
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);
        Self::open(options, MAX_CONNECTIONS).await
    }

    /// A private database that disappears with its connection, for tests in
    /// this and dependent crates.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:").foreign_keys(true);
        // Each connection to ":memory:" would get a database of its own.
        Self::open(options, 1).await
    }

    async fn open(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[tracing::instrument(skip_all)]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for outstanding queries, then close every connection. The last
    /// connection to go folds the write-ahead log back into the database file,
    /// so nothing but the file itself is left behind.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("closed library database");
    }
}
