use crate::error::{ErrorKind, Result};
use image::ImageReader;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Cursor;
use tracing::instrument;

/// Pixel dimensions of an image. Both sides are always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            exn::bail!(ErrorKind::InvalidDimension { width, height });
        }
        Ok(Self { width, height })
    }

    /// Read the dimensions of an encoded image.
    ///
    /// Only the image header is decoded; the format is guessed from the
    /// content, not trusted from any file name.
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn analyze(bytes: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().map_err(ErrorKind::Io)?;
        let (width, height) = reader.into_dimensions().map_err(ErrorKind::Image)?;
        Self::new(width, height)
    }

    #[must_use]
    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use rstest::rstest;

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[rstest]
    #[case(ImageFormat::Jpeg)]
    #[case(ImageFormat::Png)]
    #[case(ImageFormat::Gif)]
    #[case(ImageFormat::Bmp)]
    fn test_analyze(#[case] format: ImageFormat) {
        let bytes = encode(500, 800, format);
        assert_eq!(Dimension::analyze(&bytes).unwrap(), Dimension { width: 500, height: 800 });
    }

    #[test]
    fn test_analyze_garbage() {
        let err = Dimension::analyze(b"definitely not an image").unwrap_err();
        assert!(matches!(*err, ErrorKind::Image(_)));
    }

    #[test]
    fn test_analyze_truncated_header() {
        let bytes = encode(64, 64, ImageFormat::Png);
        assert!(Dimension::analyze(&bytes[..12]).is_err());
    }

    #[rstest]
    #[case(0, 10)]
    #[case(10, 0)]
    fn test_new_rejects_zero(#[case] width: u32, #[case] height: u32) {
        assert!(Dimension::new(width, height).is_err());
    }

    #[test]
    fn test_display_and_longest_side() {
        let dimension = Dimension::new(500, 800).unwrap();
        assert_eq!(dimension.to_string(), "500x800");
        assert_eq!(dimension.longest_side(), 800);
    }
}
