use crate::MediaType;
use crate::error::{Error, ErrorKind};
use std::{path::Path, str::FromStr};

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_MAGIC: &[u8] = b"WEBP";
const BMP_MAGIC: &[u8] = b"BM";
const TIFF_LE_MAGIC: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
const TIFF_BE_MAGIC: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];
const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGICS: [[u8; 4]; 3] = [*b"PK\x03\x04", *b"PK\x05\x06", *b"PK\x07\x08"];
const RAR_MAGIC: &[u8] = b"Rar!\x1A\x07";
const SEVEN_ZIP_MAGIC: [u8; 6] = [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
// POSIX (ustar) tar headers carry their magic at a fixed offset in the first block.
const TAR_MAGIC: &[u8] = b"ustar";
const TAR_MAGIC_OFFSET: usize = 257;
const XML_MAGIC: &[u8] = b"<?xml";
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

impl FromStr for MediaType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Drop parameters: "application/x-rar-compressed; version=5".
        let essence = s.split(';').next().unwrap_or_default().trim().to_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Ok(MediaType::Jpeg),
            "image/png" => Ok(MediaType::Png),
            "image/gif" => Ok(MediaType::Gif),
            "image/webp" => Ok(MediaType::Webp),
            "image/bmp" | "image/x-ms-bmp" => Ok(MediaType::Bmp),
            "image/tiff" => Ok(MediaType::Tiff),
            "application/pdf" => Ok(MediaType::Pdf),
            "application/zip" | "application/x-zip-compressed" => Ok(MediaType::Zip),
            "application/x-rar-compressed" | "application/vnd.rar" => Ok(MediaType::Rar),
            "application/x-7z-compressed" => Ok(MediaType::SevenZip),
            "application/gzip" | "application/x-gzip" => Ok(MediaType::Gzip),
            "application/x-tar" => Ok(MediaType::Tar),
            "application/xml" | "text/xml" => Ok(MediaType::Xml),
            "text/plain" => Ok(MediaType::PlainText),
            "application/octet-stream" => Ok(MediaType::OctetStream),
            _ => exn::bail!(ErrorKind::UnsupportedMediaType(s.to_string())),
        }
    }
}
impl From<&[u8]> for MediaType {
    fn from(value: &[u8]) -> Self {
        MediaType::from_magic_bytes(value)
    }
}
impl MediaType {
    /// Guess the media type from a file extension.
    ///
    /// Comic book archive extensions map to their container format
    /// (`.cbz` is a zip, `.cbt` a tar). Unknown extensions are
    /// [`OctetStream`](MediaType::OctetStream).
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "jpg" | "jpeg" | "jpe" => MediaType::Jpeg,
                "png" => MediaType::Png,
                "gif" => MediaType::Gif,
                "webp" => MediaType::Webp,
                "bmp" => MediaType::Bmp,
                "tif" | "tiff" => MediaType::Tiff,
                "pdf" => MediaType::Pdf,
                "zip" | "cbz" => MediaType::Zip,
                "rar" | "cbr" => MediaType::Rar,
                "7z" | "cb7" => MediaType::SevenZip,
                "gz" | "tgz" => MediaType::Gzip,
                "tar" | "cbt" => MediaType::Tar,
                "xml" => MediaType::Xml,
                "txt" | "nfo" => MediaType::PlainText,
                _ => MediaType::OctetStream,
            })
            .unwrap_or(MediaType::OctetStream)
    }

    /// Detect the media type from the leading bytes of some content.
    ///
    /// Feed at least [`SNIFF_LENGTH`](crate::SNIFF_LENGTH) bytes when
    /// available; shorter prefixes work for everything except tar, whose
    /// magic sits 257 bytes in. Empty input is
    /// [`OctetStream`](MediaType::OctetStream).
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&JPEG_MAGIC) {
            return MediaType::Jpeg;
        }
        if bytes.starts_with(&PNG_MAGIC) {
            return MediaType::Png;
        }
        if bytes.starts_with(GIF87_MAGIC) || bytes.starts_with(GIF89_MAGIC) {
            return MediaType::Gif;
        }
        if bytes.starts_with(RIFF_MAGIC) && bytes.get(8..12) == Some(WEBP_MAGIC) {
            return MediaType::Webp;
        }
        if bytes.starts_with(&TIFF_LE_MAGIC) || bytes.starts_with(&TIFF_BE_MAGIC) {
            return MediaType::Tiff;
        }
        if bytes.starts_with(PDF_MAGIC) {
            return MediaType::Pdf;
        }
        if ZIP_MAGICS.iter().any(|magic| bytes.starts_with(magic)) {
            return MediaType::Zip;
        }
        if bytes.starts_with(RAR_MAGIC) {
            return MediaType::Rar;
        }
        if bytes.starts_with(&SEVEN_ZIP_MAGIC) {
            return MediaType::SevenZip;
        }
        if bytes.starts_with(&GZIP_MAGIC) {
            return MediaType::Gzip;
        }
        if bytes.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()) == Some(TAR_MAGIC) {
            return MediaType::Tar;
        }
        if is_bitmap(bytes) {
            return MediaType::Bmp;
        }
        let text = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
        if text.starts_with(XML_MAGIC) {
            return MediaType::Xml;
        }
        if is_plain_text(text) {
            return MediaType::PlainText;
        }
        MediaType::OctetStream
    }
}

/// "BM" alone is far too weak (any text starting with "BM" would match), so
/// also require the two reserved header words to be zero.
fn is_bitmap(bytes: &[u8]) -> bool {
    bytes.starts_with(BMP_MAGIC) && bytes.len() >= 14 && bytes[6..10].iter().all(|b| *b == 0)
}

fn is_plain_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let valid = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        // The prefix may cut a multibyte character in half.
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&bytes[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };
    valid.chars().all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r' | '\x0C'))
}
