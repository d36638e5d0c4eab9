//! Bounded-size thumbnails.
//!
//! Whatever the input codec, thumbnails always come out as JPEG so that a
//! resize request either succeeds with a predictable format or fails loudly.

use crate::error::{ErrorKind, Result};
use crate::{Dimension, MediaType};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::instrument;

/// The media type of every thumbnail produced by [`resize`].
pub const THUMBNAIL_MEDIA_TYPE: MediaType = MediaType::Jpeg;

/// A re-encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub dimension: Dimension,
}

impl Thumbnail {
    pub fn media_type(&self) -> MediaType {
        THUMBNAIL_MEDIA_TYPE
    }
}

/// Decode an image and re-encode it so that its longest side is at most
/// `longest_side` pixels, preserving the aspect ratio.
///
/// Images already within bounds are not upscaled, but are still re-encoded.
#[instrument(skip(bytes), fields(input_size = bytes.len(), output_size))]
pub fn resize(bytes: &[u8], longest_side: u32) -> Result<Thumbnail> {
    if longest_side == 0 {
        exn::bail!(ErrorKind::InvalidSize(longest_side));
    }
    let image = image::load_from_memory(bytes).map_err(ErrorKind::Image)?;
    let source = Dimension::new(image.width(), image.height())?;
    let image = match source.longest_side() > longest_side {
        // Fits within the bounding box, keeping the aspect ratio.
        true => image.resize(longest_side, longest_side, FilterType::Lanczos3),
        false => image,
    };
    // JPEG has no alpha channel.
    let image = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut output = Vec::new();
    image.write_to(&mut Cursor::new(&mut output), ImageFormat::Jpeg).map_err(ErrorKind::Image)?;
    tracing::Span::current().record("output_size", output.len());
    Ok(Thumbnail {
        dimension: Dimension::new(image.width(), image.height())?,
        bytes: output,
    })
}
