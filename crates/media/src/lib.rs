//! Content inspection for the files found inside comic and book archives.
//!
//! - **Media type detection** from magic bytes ([`MediaType::from_magic_bytes`]),
//!   file extensions ([`MediaType::from_path`]) or a stream prefix
//!   ([`MediaType::sniff`] with a [`PeekableReader`])
//! - **Image dimensions** without decoding the full image ([`Dimension::analyze`])
//! - **Thumbnails** re-encoded to a single, fixed codec ([`thumbnail::resize`])
//! - **Natural ordering** of entry names ([`natural::compare`])
//!
//! Everything in this crate is a pure function of its input; there is no
//! shared state.

mod construct;
mod dimension;
pub mod error;
pub mod natural;
mod peekable;
pub mod thumbnail;
mod util;

pub use crate::dimension::Dimension;
pub use crate::peekable::{PeekableReader, SNIFF_LENGTH};

/// A media type recognised by content sniffing.
///
/// Anything that can't be identified is [`OctetStream`](Self::OctetStream).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// JPEG image (image/jpeg)
    Jpeg,
    /// PNG image (image/png)
    Png,
    /// GIF image (image/gif)
    Gif,
    /// WebP image (image/webp)
    Webp,
    /// Bitmap image (image/bmp)
    Bmp,
    /// TIFF image (image/tiff)
    Tiff,
    /// PDF document (application/pdf)
    Pdf,
    /// Zip container (application/zip)
    Zip,
    /// RAR container (application/x-rar-compressed)
    Rar,
    /// 7-Zip container (application/x-7z-compressed)
    SevenZip,
    /// Gzip stream (application/gzip)
    Gzip,
    /// Tar container (application/x-tar)
    Tar,
    /// XML document, e.g. ComicInfo.xml (application/xml)
    Xml,
    /// Plain UTF-8 text (text/plain)
    PlainText,
    /// Unidentified binary content (application/octet-stream)
    #[default]
    OctetStream,
}

#[cfg(feature = "serde")]
impl serde::Serialize for MediaType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
