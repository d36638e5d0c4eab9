use crate::MediaType;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for MediaType {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl MediaType {
    /// Returns the MIME string for this media type.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
            MediaType::Bmp => "image/bmp",
            MediaType::Tiff => "image/tiff",
            MediaType::Pdf => "application/pdf",
            MediaType::Zip => "application/zip",
            MediaType::Rar => "application/x-rar-compressed",
            MediaType::SevenZip => "application/x-7z-compressed",
            MediaType::Gzip => "application/gzip",
            MediaType::Tar => "application/x-tar",
            MediaType::Xml => "application/xml",
            MediaType::PlainText => "text/plain",
            MediaType::OctetStream => "application/octet-stream",
        }
    }

    /// Whether this is a raster image type that the dimension analyzer and
    /// thumbnailer can decode.
    #[inline]
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            MediaType::Jpeg | MediaType::Png | MediaType::Gif | MediaType::Webp | MediaType::Bmp | MediaType::Tiff
        )
    }

    /// Whether a MIME string (as stored by a catalog) names an image type.
    ///
    /// Parameters such as `; charset=...` are ignored. Unknown `image/*`
    /// types count as images even if this crate can't decode them.
    #[must_use]
    pub fn is_image_str(media_type: &str) -> bool {
        match media_type.parse::<MediaType>() {
            Ok(parsed) => parsed.is_image(),
            Err(_) => media_type.trim().to_ascii_lowercase().starts_with("image/"),
        }
    }
}
