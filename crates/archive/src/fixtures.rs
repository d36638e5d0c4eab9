//! Archives built on the fly for tests.

use flate2::Compression;
use flate2::write::GzEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// Names ending in `/` become directory entries.
pub(crate) fn write_zip(path: &Path, method: CompressionMethod, entries: &[(&str, &[u8])]) -> PathBuf {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(method);
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap();
    path.to_path_buf()
}

/// Names ending in `/` become directory entries.
pub(crate) fn write_tar(path: &Path, gzip: bool, entries: &[(&str, &[u8])]) -> PathBuf {
    let file = File::create(path).unwrap();
    let writer: Box<dyn Write> = match gzip {
        true => Box::new(GzEncoder::new(file, Compression::default())),
        false => Box::new(file),
    };
    let mut builder = tar::Builder::new(writer);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        if name.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder.append_data(&mut header, name, std::io::empty()).unwrap();
        } else {
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
            builder.append_data(&mut header, name, *data).unwrap();
        }
    }
    // Dropping the encoder writes the gzip trailer.
    builder.into_inner().unwrap().flush().unwrap();
    path.to_path_buf()
}

/// Flip a byte inside the first occurrence of `marker` in the file, e.g. to
/// break a stored entry's checksum.
pub(crate) fn corrupt(path: &Path, marker: &[u8]) {
    let mut bytes = std::fs::read(path).unwrap();
    let offset = bytes.windows(marker.len()).position(|window| window == marker).unwrap();
    bytes[offset] ^= 0xFF;
    std::fs::write(path, bytes).unwrap();
}
