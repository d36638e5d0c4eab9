use crate::cache::CacheOptions;
use crate::entry::MediaContainerEntry;
use crate::error::{ErrorKind, Result};
use crate::tar::TarExtractor;
use crate::zip::ZipExtractor;
use exn::{OptionExt, ResultExt};
use folio_media::{MediaType, PeekableReader, SNIFF_LENGTH};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::instrument;

/// The container families that can be listed and streamed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Zip,
    Tar,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 2] = [ContainerKind::Zip, ContainerKind::Tar];

    /// Every media type string accepted for this container family.
    pub fn media_types(&self) -> &'static [&'static str] {
        match self {
            Self::Zip => ZipExtractor::MEDIA_TYPES,
            Self::Tar => TarExtractor::MEDIA_TYPES,
        }
    }

    /// Resolve a declared media type such as `application/x-cbz`. Parameters
    /// and letter case are ignored.
    pub fn from_media_type(media_type: &str) -> Result<Self> {
        let essence = media_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.media_types().contains(&essence.as_str()))
            .ok_or_raise(|| ErrorKind::UnsupportedContainer(media_type.to_string()))
    }

    /// Work out the container family of a file on disk from its leading
    /// bytes, falling back to its extension when the content is ambiguous.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn sniff(path: &Path) -> Result<Self> {
        let file = File::open(path).or_raise(|| ErrorKind::ArchiveUnreadable(path.to_path_buf()))?;
        let mut reader = PeekableReader::new(file);
        let content = MediaType::from_magic_bytes(
            reader.peek(SNIFF_LENGTH).or_raise(|| ErrorKind::ArchiveUnreadable(path.to_path_buf()))?,
        );
        let media_type = match content {
            MediaType::OctetStream => MediaType::from_path(path),
            known => known,
        };
        match media_type {
            MediaType::Zip => Ok(Self::Zip),
            MediaType::Tar | MediaType::Gzip => Ok(Self::Tar),
            other => exn::bail!(ErrorKind::UnsupportedContainer(other.to_string())),
        }
    }
}

/// Dispatches container operations to the extractor for each family.
pub struct Extractors {
    zip: ZipExtractor,
    tar: TarExtractor,
}

impl Default for Extractors {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl Extractors {
    pub fn new(options: CacheOptions) -> Self {
        Self { zip: ZipExtractor::new(options), tar: TarExtractor }
    }

    /// Every media type string an extractor is registered for.
    pub fn supported_media_types(&self) -> BTreeSet<&'static str> {
        ContainerKind::ALL.iter().flat_map(|kind| kind.media_types().iter().copied()).collect()
    }

    pub fn list_entries(&self, kind: ContainerKind, path: &Path, dimensions: bool) -> Result<Vec<MediaContainerEntry>> {
        match kind {
            ContainerKind::Zip => self.zip.list_entries(path, dimensions),
            ContainerKind::Tar => self.tar.list_entries(path, dimensions),
        }
    }

    pub fn stream_entry(&self, kind: ContainerKind, path: &Path, name: &str) -> Result<Vec<u8>> {
        match kind {
            ContainerKind::Zip => self.zip.stream_entry(path, name),
            ContainerKind::Tar => self.tar.stream_entry(path, name),
        }
    }

    /// Forget any open handle for an archive that changed on disk.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.zip.handles().invalidate(path)
    }

    pub fn evict_expired(&self) -> usize {
        self.zip.handles().evict_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use rstest::rstest;
    use tempfile::TempDir;
    use zip::CompressionMethod;

    #[rstest]
    #[case("application/zip", ContainerKind::Zip)]
    #[case("application/x-cbz", ContainerKind::Zip)]
    #[case("application/vnd.comicbook+zip", ContainerKind::Zip)]
    #[case("Application/X-CBZ; charset=binary", ContainerKind::Zip)]
    #[case("application/x-tar", ContainerKind::Tar)]
    #[case("application/x-cbt", ContainerKind::Tar)]
    #[case("application/gzip", ContainerKind::Tar)]
    fn test_from_media_type(#[case] media_type: &str, #[case] expected: ContainerKind) {
        assert_eq!(ContainerKind::from_media_type(media_type).unwrap(), expected);
    }

    #[rstest]
    #[case("application/x-rar-compressed")]
    #[case("application/pdf")]
    #[case("")]
    fn test_from_media_type_unsupported(#[case] media_type: &str) {
        let err = ContainerKind::from_media_type(media_type).unwrap_err();
        assert!(matches!(*err, ErrorKind::UnsupportedContainer(_)));
    }

    #[test]
    fn test_supported_media_types() {
        let supported = Extractors::default().supported_media_types();
        assert_eq!(supported.len(), 6);
        assert!(supported.contains("application/x-cbz"));
        assert!(supported.contains("application/x-cbt"));
        assert!(!supported.contains("application/x-rar-compressed"));
    }

    #[test]
    fn test_sniff() {
        let dir = TempDir::new().unwrap();
        // Content wins over a misleading extension.
        let zip = fixtures::write_zip(
            &dir.path().join("really-a-zip.cbt"),
            CompressionMethod::Stored,
            &[("page1.jpg", b"x".as_slice())],
        );
        let tar = fixtures::write_tar(&dir.path().join("comic.cbt"), false, &[("page1.jpg", b"x".as_slice())]);
        let tgz = fixtures::write_tar(&dir.path().join("comic.tgz"), true, &[("page1.jpg", b"x".as_slice())]);
        let text = dir.path().join("notes.cbz");
        std::fs::write(&text, b"just some notes").unwrap();

        assert_eq!(ContainerKind::sniff(&zip).unwrap(), ContainerKind::Zip);
        assert_eq!(ContainerKind::sniff(&tar).unwrap(), ContainerKind::Tar);
        assert_eq!(ContainerKind::sniff(&tgz).unwrap(), ContainerKind::Tar);
        assert!(ContainerKind::sniff(&text).is_err());
    }

    #[test]
    fn test_dispatch() {
        let dir = TempDir::new().unwrap();
        let entries = [("page2.jpg", b"two".as_slice()), ("page1.jpg", b"one".as_slice())];
        let zip = fixtures::write_zip(&dir.path().join("comic.cbz"), CompressionMethod::Deflated, &entries);
        let tar = fixtures::write_tar(&dir.path().join("comic.cbt"), false, &entries);
        let extractors = Extractors::default();

        for (kind, path) in [(ContainerKind::Zip, &zip), (ContainerKind::Tar, &tar)] {
            let listed = extractors.list_entries(kind, path, false).unwrap();
            assert_eq!(listed[0].name, "page1.jpg");
            assert_eq!(extractors.stream_entry(kind, path, "page2.jpg").unwrap(), b"two");
        }
        assert!(extractors.invalidate(&zip));
        assert!(!extractors.invalidate(&tar));
    }
}
