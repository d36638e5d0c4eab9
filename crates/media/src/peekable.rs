//! Peekable readers for sniff-then-decide workflows.
//!
//! Thin convenience wrapper around standard library I/O primitives
//! ([`Read::take`], [`Cursor`], [`Chain`]) so that the head of an archive
//! entry can be classified before deciding whether to read the rest.

use crate::MediaType;
use crate::error::{ErrorKind, Result};
use std::io::{Chain, Cursor, Read};

/// How many leading bytes [`MediaType::sniff`] inspects. Large enough to
/// reach the tar magic at offset 257.
pub const SNIFF_LENGTH: usize = 512;

/// A resumable [`Read`]er for peek-decide-stream workflows.
///
/// Read enough data to inspect (e.g., magic bytes), then either continue with
/// the full content via [`into_reader`](Self::into_reader) or
/// [`into_bytes`](Self::into_bytes), or drop to discard.
pub struct PeekableReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: Read> PeekableReader<R> {
    /// Wrap any reader for peeking.
    pub fn new(inner: R) -> Self {
        Self { inner, buffer: Vec::new() }
    }

    /// Read up to `limit` bytes of the content.
    ///
    /// Returns a slice of all buffered data. Successive calls do not accumulate:
    /// - `peek(4*1024)` puts 4KiB in the buffer, returns 4KiB
    /// - `peek(8*1024)` puts an additional 4KiB in the buffer, returns 8KiB
    /// - `peek(2*1024)` immediately returns 2KiB (because buffer already has 8KiB)
    pub fn peek(&mut self, limit: usize) -> Result<&[u8]> {
        if self.buffer.len() >= limit {
            return Ok(&self.buffer[..limit]);
        }
        let needed = (limit - self.buffer.len()) as u64;
        (&mut self.inner).take(needed).read_to_end(&mut self.buffer).map_err(ErrorKind::Io)?;
        Ok(&self.buffer[..self.buffer.len().min(limit)])
    }

    /// Access data read into internal buffer so far.
    pub fn head(&self) -> &[u8] {
        &self.buffer
    }

    /// Convert into a [`Read`]er that replays the buffered head, then
    /// streams the remaining content.
    pub fn into_reader(self) -> Chain<Cursor<Vec<u8>>, R> {
        Cursor::new(self.buffer).chain(self.inner)
    }

    /// Read all remaining data and return the complete buffer.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.inner.read_to_end(&mut self.buffer).map_err(ErrorKind::Io)?;
        Ok(self.buffer)
    }
}

impl MediaType {
    /// Classify a stream by its first [`SNIFF_LENGTH`] bytes, leaving them
    /// buffered in the reader for whoever consumes the content next.
    ///
    /// # Example
    ///
    /// ```
    /// use folio_media::{MediaType, PeekableReader};
    ///
    /// let mut reader = PeekableReader::new(&b"%PDF-1.7 ..."[..]);
    /// assert_eq!(MediaType::sniff(&mut reader).unwrap(), MediaType::Pdf);
    /// assert_eq!(reader.into_bytes().unwrap(), b"%PDF-1.7 ...");
    /// ```
    pub fn sniff<R: Read>(reader: &mut PeekableReader<R>) -> Result<MediaType> {
        Ok(MediaType::from_magic_bytes(reader.peek(SNIFF_LENGTH)?))
    }
}
