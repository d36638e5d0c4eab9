use crate::error::{ErrorKind, Result};
use crate::{Command, Container, HashArgs, HashCommand};
use exn::{OptionExt, ResultExt};
use folio_archive::{ContainerKind, Extractors};
use folio_cache::models::{Book, Page, PageHash, PageHashMatch, PageHashUnknown, UnknownHash};
use folio_cache::{Database, Repository};
use folio_config::Config;
use folio_library::{PageHashLifecycle, PageHashRegistry, index_book};
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use time::UtcDateTime;

/// Everything the commands share, built once from the configuration.
pub(crate) struct Context {
    config: Config,
    db: Database,
    repository: Repository,
    extractors: Arc<Extractors>,
    lifecycle: PageHashLifecycle,
}

impl Context {
    pub(crate) async fn load(config_file: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_file).or_raise(|| ErrorKind::Config)?;
        let options = config.cache_options().or_raise(|| ErrorKind::Config)?;
        let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
        let repository = Repository::from(&db);
        let extractors = Arc::new(Extractors::new(options));
        let lifecycle = PageHashLifecycle::from_repository(extractors.clone(), repository.clone());
        Ok(Self { config, db, repository, extractors, lifecycle })
    }

    pub(crate) async fn close(&self) {
        self.db.close().await;
    }

    fn container_kind(&self, archive: &Path, container: &Container) -> Result<ContainerKind> {
        let kind = match &container.media_type {
            Some(media_type) => ContainerKind::from_media_type(media_type),
            None => ContainerKind::sniff(archive),
        };
        kind.or_raise(|| ErrorKind::Archive)
    }
}

pub(crate) async fn run(context: &Context, command: Command) -> Result<()> {
    match command {
        Command::Entries { archive, dimensions, container } => {
            let kind = context.container_kind(&archive, &container)?;
            let extractors = context.extractors.clone();
            let entries = tokio::task::spawn_blocking(move || extractors.list_entries(kind, &archive, dimensions))
                .await
                .or_raise(|| ErrorKind::Archive)?
                .or_raise(|| ErrorKind::Archive)?;
            print_json(&serde_json::to_value(entries).or_raise(|| ErrorKind::Output)?)
        },
        Command::Extract { archive, entry, container, output } => {
            let kind = context.container_kind(&archive, &container)?;
            let extractors = context.extractors.clone();
            let bytes = tokio::task::spawn_blocking(move || extractors.stream_entry(kind, &archive, &entry))
                .await
                .or_raise(|| ErrorKind::Archive)?
                .or_raise(|| ErrorKind::Archive)?;
            write_output(output.as_deref(), &bytes)
        },
        Command::Index { book_id, archive, container } => {
            let kind = context.container_kind(&archive, &container)?;
            let path = std::path::absolute(&archive).or_raise(|| ErrorKind::Archive)?;
            let media_type = container.media_type.unwrap_or_else(|| kind.media_types()[0].to_string());
            let book = Book { id: book_id, path, media_type };
            let pages = index_book(&context.extractors, &context.repository, &book)
                .await
                .or_raise(|| ErrorKind::Library)?;
            print_json(&json!({
                "book_id": book.id,
                "path": book.path,
                "media_type": book.media_type,
                "pages": pages.len(),
            }))
        },
        Command::Hashes(command) => run_hashes(context, command).await,
    }
}

async fn run_hashes(context: &Context, command: HashCommand) -> Result<()> {
    let registry = context.lifecycle.registry();
    match command {
        HashCommand::Known { actions, paging } => {
            let filter = (!actions.is_empty()).then_some(actions.as_slice());
            let known = registry.find_all_known(filter, (&paging).into()).await.or_raise(|| ErrorKind::Library)?;
            print_json(&page_json(known, known_json))
        },
        HashCommand::Unknown { paging } => {
            let unknown = registry.find_all_unknown((&paging).into()).await.or_raise(|| ErrorKind::Library)?;
            print_json(&page_json(unknown, unknown_json))
        },
        HashCommand::Matches { hash, paging } => {
            let unknown = to_unknown(hash);
            let matches = registry.find_matches(&unknown, (&paging).into()).await.or_raise(|| ErrorKind::Library)?;
            print_json(&page_json(matches, match_json))
        },
        HashCommand::Thumbnail { hash, resize, output } => {
            let unknown = to_unknown(hash);
            let resize = resize.or(context.config.thumbnails.default_size);
            let page = context
                .lifecycle
                .get_page(&unknown, resize)
                .await
                .or_raise(|| ErrorKind::Library)?
                .ok_or_raise(|| ErrorKind::NoMatch(unknown.hash.clone()))?;
            tracing::info!(media_type = %page.media_type, size = page.bytes.len(), "writing page");
            write_output(Some(&output), &page.bytes)
        },
        HashCommand::KnownThumbnail { hash, output } => {
            let thumbnail = registry
                .get_known_thumbnail(&hash)
                .await
                .or_raise(|| ErrorKind::Library)?
                .ok_or_raise(|| ErrorKind::NoThumbnail(hash.clone()))?;
            write_output(Some(&output), &thumbnail)
        },
        HashCommand::Mark { hash, action } => {
            let unknown = to_unknown(hash);
            let thumbnail_size = context.config.thumbnails.default_size.unwrap_or(DEFAULT_THUMBNAIL_SIZE);
            let thumbnail = match context.lifecycle.get_page(&unknown, Some(thumbnail_size)).await {
                Ok(page) => page.map(|page| page.bytes),
                Err(err) => {
                    tracing::warn!(error = ?err, "recording decision without a thumbnail");
                    None
                },
            };
            let existing = context.repository.get_known(&unknown.hash).await.or_raise(|| ErrorKind::Database)?;
            let known = match existing {
                Some(known) => PageHash {
                    media_type: unknown.media_type,
                    size: unknown.size,
                    action,
                    modified_at: UtcDateTime::now(),
                    ..known
                },
                None => PageHash::new(unknown.hash, unknown.media_type, unknown.size, action),
            };
            registry.upsert_known(&known, thumbnail.as_deref()).await.or_raise(|| ErrorKind::Library)?;
            print_json(&known_json(known))
        },
    }
}

/// Longest side of stored thumbnails when none is configured.
const DEFAULT_THUMBNAIL_SIZE: u32 = 300;

fn to_unknown(args: HashArgs) -> PageHashUnknown {
    PageHashUnknown::new(args.hash, args.media_type, args.size)
}

fn page_json<T>(page: Page<T>, item: impl FnMut(T) -> Value) -> Value {
    let total_pages = page.total_pages();
    let page = page.map(item);
    json!({
        "content": page.content,
        "page": page.page,
        "size": page.size,
        "total": page.total,
        "total_pages": total_pages,
    })
}

fn known_json(known: PageHash) -> Value {
    json!({
        "hash": known.hash,
        "media_type": known.media_type,
        "size": known.size,
        "action": known.action.as_str(),
        "delete_count": known.delete_count,
        "created_at": known.created_at.unix_timestamp(),
        "modified_at": known.modified_at.unix_timestamp(),
    })
}

fn unknown_json(unknown: UnknownHash) -> Value {
    json!({
        "hash": unknown.unknown.hash,
        "media_type": unknown.unknown.media_type,
        "size": unknown.unknown.size,
        "match_count": unknown.match_count,
    })
}

fn match_json(found: PageHashMatch) -> Value {
    json!({
        "book_id": found.book_id,
        "page_number": found.page_number,
        "file_name": found.file_name,
        "file_size": found.file_size,
        "media_type": found.media_type,
    })
}

fn print_json(value: &Value) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).or_raise(|| ErrorKind::Output)?;
    writeln!(stdout).or_raise(|| ErrorKind::Output)
}

fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, bytes).or_raise(|| ErrorKind::Output),
        None => std::io::stdout().lock().write_all(bytes).or_raise(|| ErrorKind::Output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_cache::models::Action;

    #[test]
    fn test_page_json() {
        let page = Page { content: vec![1u32, 2], page: 1, size: 2, total: 5 };
        let value = page_json(page, |n| json!(n * 10));
        assert_eq!(value, json!({"content": [10, 20], "page": 1, "size": 2, "total": 5, "total_pages": 3}));
    }

    #[test]
    fn test_known_json() {
        let at = UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let known = PageHash {
            hash: "abc".into(),
            media_type: "image/jpeg".into(),
            size: None,
            action: Action::DeleteManual,
            delete_count: 3,
            created_at: at,
            modified_at: at,
        };
        assert_eq!(
            known_json(known),
            json!({
                "hash": "abc",
                "media_type": "image/jpeg",
                "size": null,
                "action": "DELETE_MANUAL",
                "delete_count": 3,
                "created_at": 1_700_000_000,
                "modified_at": 1_700_000_000,
            })
        );
    }
}
