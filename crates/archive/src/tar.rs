use crate::entry::{self, EntryAnalysis, MediaContainerEntry};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::read::GzDecoder;
use folio_media::{MediaType, PeekableReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tar::Archive;
use tracing::instrument;

/// Tar-family containers (`.tar`, `.cbt`), optionally gzip-compressed.
///
/// Tar has no index, so there is nothing worth keeping open: every call scans
/// the archive sequentially from the start.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarExtractor;

impl TarExtractor {
    pub const MEDIA_TYPES: &[&str] = &["application/x-tar", "application/x-cbt", "application/gzip"];

    #[instrument(skip_all, fields(path = %path.display(), dimensions = dimensions, entries))]
    pub fn list_entries(&self, path: &Path, dimensions: bool) -> Result<Vec<MediaContainerEntry>> {
        let unreadable = || ErrorKind::ArchiveUnreadable(path.to_path_buf());
        let mut archive = open(path)?;
        let mut entries = Vec::new();
        let mut seen = 0usize;
        for item in archive.entries().or_raise(unreadable)? {
            // A broken header ends the scan: nothing after it can be located.
            // Only an archive without a single readable header is unreadable.
            let item = match item {
                Ok(item) => item,
                Err(err) if seen > 0 => {
                    tracing::warn!(error = %err, entries = entries.len(), "stopping at damaged entry");
                    break;
                },
                Err(err) => return Err(err).or_raise(unreadable),
            };
            seen += 1;
            if !item.header().entry_type().is_file() {
                continue;
            }
            let name = String::from_utf8_lossy(&item.path_bytes()).into_owned();
            let size = item.header().size().ok();
            let analysis = EntryAnalysis::inspect(&name, item, size, dimensions);
            entries.push(MediaContainerEntry { name, analysis });
        }
        entry::sort(&mut entries);
        tracing::Span::current().record("entries", entries.len());
        Ok(entries)
    }

    #[instrument(skip_all, fields(path = %path.display(), name = name, size))]
    pub fn stream_entry(&self, path: &Path, name: &str) -> Result<Vec<u8>> {
        let unreadable = || ErrorKind::ArchiveUnreadable(path.to_path_buf());
        let mut archive = open(path)?;
        for item in archive.entries().or_raise(unreadable)? {
            let mut item = item.or_raise(unreadable)?;
            if !item.header().entry_type().is_file() || *item.path_bytes() != *name.as_bytes() {
                continue;
            }
            let mut bytes = Vec::new();
            item.read_to_end(&mut bytes).or_raise(unreadable)?;
            tracing::Span::current().record("size", bytes.len());
            return Ok(bytes);
        }
        exn::bail!(ErrorKind::EntryNotFound(path.to_path_buf(), name.to_string()))
    }
}

fn open(path: &Path) -> Result<Archive<Box<dyn Read>>> {
    let unreadable = || ErrorKind::ArchiveUnreadable(path.to_path_buf());
    let file = File::open(path).or_raise(unreadable)?;
    let mut reader = PeekableReader::new(BufReader::new(file));
    let gzipped = MediaType::from_magic_bytes(reader.peek(2).or_raise(unreadable)?) == MediaType::Gzip;
    let reader = reader.into_reader();
    let reader: Box<dyn Read> = match gzipped {
        true => Box::new(GzDecoder::new(reader)),
        false => Box::new(reader),
    };
    Ok(Archive::new(reader))
}
