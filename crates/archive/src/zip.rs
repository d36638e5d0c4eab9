use crate::cache::{CacheOptions, HandleCache};
use crate::entry::{self, EntryAnalysis, MediaContainerEntry};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::instrument;
use zip::ZipArchive;
use zip::result::ZipError;

type ZipHandle = ZipArchive<BufReader<File>>;

/// Zip-family containers (`.zip`, `.cbz`).
///
/// Listing opens the archive afresh and scans it once; streaming goes through
/// a [`HandleCache`] so the central directory is only parsed once per archive
/// while it stays hot.
pub struct ZipExtractor {
    handles: HandleCache<ZipHandle>,
}

impl ZipExtractor {
    pub const MEDIA_TYPES: &[&str] = &["application/zip", "application/x-cbz", "application/vnd.comicbook+zip"];

    pub fn new(options: CacheOptions) -> Self {
        Self { handles: HandleCache::new(options, open) }
    }

    pub fn handles(&self) -> &HandleCache<ZipHandle> {
        &self.handles
    }

    #[instrument(skip_all, fields(path = %path.display(), dimensions = dimensions, entries))]
    pub fn list_entries(&self, path: &Path, dimensions: bool) -> Result<Vec<MediaContainerEntry>> {
        let mut archive = open(path)?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let Some(name) = archive.name_for_index(index).map(str::to_owned) else {
                continue;
            };
            if name.ends_with('/') {
                continue;
            }
            let analysis = match archive.by_index(index) {
                Ok(file) => {
                    let size = file.size();
                    EntryAnalysis::inspect(&name, file, Some(size), dimensions)
                },
                // E.g. an unsupported compression method or encryption.
                Err(err) => EntryAnalysis::failed(&name, &err),
            };
            entries.push(MediaContainerEntry { name, analysis });
        }
        entry::sort(&mut entries);
        tracing::Span::current().record("entries", entries.len());
        Ok(entries)
    }

    #[instrument(skip_all, fields(path = %path.display(), name = name, size))]
    pub fn stream_entry(&self, path: &Path, name: &str) -> Result<Vec<u8>> {
        let bytes = self.handles.acquire(path, |archive| {
            let mut file = match archive.by_name(name) {
                // Directories are never listed, so they can't be streamed either.
                Ok(file) if file.is_dir() => {
                    exn::bail!(ErrorKind::EntryNotFound(path.to_path_buf(), name.to_string()))
                },
                Ok(file) => file,
                Err(ZipError::FileNotFound) => {
                    exn::bail!(ErrorKind::EntryNotFound(path.to_path_buf(), name.to_string()))
                },
                Err(err) => return Err(err).or_raise(|| ErrorKind::ArchiveUnreadable(path.to_path_buf())),
            };
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).or_raise(|| ErrorKind::ArchiveUnreadable(path.to_path_buf()))?;
            Ok(bytes)
        })?;
        tracing::Span::current().record("size", bytes.len());
        Ok(bytes)
    }
}

fn open(path: &Path) -> Result<ZipHandle> {
    let file = File::open(path).or_raise(|| ErrorKind::ArchiveUnreadable(path.to_path_buf()))?;
    ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::ArchiveUnreadable(path.to_path_buf()))
}
