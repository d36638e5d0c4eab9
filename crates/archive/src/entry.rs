use folio_media::error::Result as MediaResult;
use folio_media::{Dimension, MediaType, PeekableReader, natural};
use std::fmt::Display;
use std::io::Read;

/// One file inside a container, as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MediaContainerEntry {
    /// Full path of the entry within the archive, exactly as stored.
    pub name: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub analysis: EntryAnalysis,
}

/// What could be learned about an entry's content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(tag = "status", rename_all = "snake_case"))]
pub enum EntryAnalysis {
    Analyzed {
        media_type: MediaType,
        /// Only present for images, and only when dimensions were requested.
        dimension: Option<Dimension>,
        /// Uncompressed size, when the container records one.
        file_size: Option<u64>,
    },
    /// The entry could not be read or classified. Sibling entries are
    /// unaffected.
    Failed { comment: String },
}

impl MediaContainerEntry {
    pub fn media_type(&self) -> Option<MediaType> {
        match &self.analysis {
            EntryAnalysis::Analyzed { media_type, .. } => Some(*media_type),
            EntryAnalysis::Failed { .. } => None,
        }
    }

    pub fn dimension(&self) -> Option<Dimension> {
        match &self.analysis {
            EntryAnalysis::Analyzed { dimension, .. } => *dimension,
            EntryAnalysis::Failed { .. } => None,
        }
    }

    pub fn file_size(&self) -> Option<u64> {
        match &self.analysis {
            EntryAnalysis::Analyzed { file_size, .. } => *file_size,
            EntryAnalysis::Failed { .. } => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match &self.analysis {
            EntryAnalysis::Analyzed { .. } => None,
            EntryAnalysis::Failed { comment } => Some(comment),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type().is_some_and(|media_type| media_type.is_image())
    }
}

impl EntryAnalysis {
    /// Sniff the content of one entry and, for images, optionally measure it.
    ///
    /// Never fails: problems become [`EntryAnalysis::Failed`].
    pub(crate) fn inspect<R: Read>(name: &str, reader: R, file_size: Option<u64>, dimensions: bool) -> Self {
        match classify(reader, dimensions) {
            Ok((media_type, dimension)) => Self::Analyzed { media_type, dimension, file_size },
            Err(err) => Self::failed(name, &*err),
        }
    }

    pub(crate) fn failed(name: &str, reason: &dyn Display) -> Self {
        let comment = reason.to_string();
        tracing::warn!(entry = name, reason = %comment, "Could not analyze archive entry");
        Self::Failed { comment }
    }
}

fn classify<R: Read>(reader: R, dimensions: bool) -> MediaResult<(MediaType, Option<Dimension>)> {
    let mut peekable = PeekableReader::new(reader);
    let media_type = MediaType::sniff(&mut peekable)?;
    let dimension = match dimensions && media_type.is_image() {
        true => Some(Dimension::analyze(&peekable.into_bytes()?)?),
        false => None,
    };
    Ok((media_type, dimension))
}

/// Listings are always returned in natural order of entry name.
pub(crate) fn sort(entries: &mut [MediaContainerEntry]) {
    natural::sort_by_name(entries, |entry| entry.name.as_str());
}
