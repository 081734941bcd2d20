use std::io::{self, Read};

use flate2::read::DeflateDecoder;

use crate::entry::{CompressionMethod, ContainerEntry};
use crate::source::ByteSource;

/// Reads a fixed byte range of a source by explicit offset.
pub struct RangeReader<'a> {
    source: &'a dyn ByteSource,
    pos: u64,
    end: u64,
}

impl<'a> RangeReader<'a> {
    pub fn new(source: &'a dyn ByteSource, start: u64, len: u64) -> Self {
        Self {
            source,
            pos: start,
            end: start + len,
        }
    }

    pub fn remaining(&self) -> u64 { self.end - self.pos }
}

impl Read for RangeReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.source.read_at(self.pos, &mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "container source ended inside entry data",
            ));
        }
        self.pos += n as u64;
        Ok(n)
    }
}

enum Decoder<'a> {
    Stored(RangeReader<'a>),
    Deflated(DeflateDecoder<RangeReader<'a>>),
}

/// Independent plaintext stream over one container entry.
///
/// Data is decompressed on demand. The stream yields exactly the entry's
/// declared uncompressed size. A deflate stream that ends short or runs long
/// is `InvalidData`; `UnexpectedEof` is reserved for the source itself
/// running out inside the entry's byte range.
pub struct EntryReader<'a> {
    entry: &'a ContainerEntry,
    decoder: Decoder<'a>,
    produced: u64,
}

impl<'a> EntryReader<'a> {
    pub(crate) fn new(source: &'a dyn ByteSource, entry: &'a ContainerEntry) -> Self {
        let range = RangeReader::new(source, entry.data_offset, entry.compressed_size);
        let decoder = match entry.method {
            CompressionMethod::Stored => Decoder::Stored(range),
            CompressionMethod::Deflated => Decoder::Deflated(DeflateDecoder::new(range)),
        };
        Self {
            entry,
            decoder,
            produced: 0,
        }
    }

    pub fn entry(&self) -> &'a ContainerEntry { self.entry }

    /// Plaintext bytes produced so far.
    pub fn position(&self) -> u64 { self.produced }

    fn read_decoded(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let decoder = match &mut self.decoder {
            Decoder::Stored(r) => return r.read(buf),
            Decoder::Deflated(r) => r,
        };
        match decoder.read(buf) {
            Ok(n) => Ok(n),
            // The range reader still owes bytes, so the source itself ran out.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && decoder.get_ref().remaining() > 0 => Err(e),
            Err(e) if matches!(e.kind(), io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidInput) => {
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry '{}': {e}", self.entry.path),
                ))
            }
            Err(e) => Err(e),
        }
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let declared = self.entry.uncompressed_size;

        if self.produced == declared {
            // Read one more byte so an over-long entry cannot pass as complete.
            let mut extra = [0u8; 1];
            return match self.read_decoded(&mut extra)? {
                0 => Ok(0),
                _ => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry '{}' is longer than its declared size", self.entry.path),
                )),
            };
        }

        let remaining = declared - self.produced;
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.read_decoded(&mut buf[..want])?;
        if n == 0 {
            let kind = match self.decoder {
                Decoder::Deflated(_) => io::ErrorKind::InvalidData,
                Decoder::Stored(_) => io::ErrorKind::UnexpectedEof,
            };
            return Err(io::Error::new(
                kind,
                format!(
                    "entry '{}' ended after {} of {} bytes",
                    self.entry.path, self.produced, declared
                ),
            ));
        }
        self.produced += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Write;

    fn entry(method: CompressionMethod, offset: u64, csize: u64, size: u64) -> ContainerEntry {
        ContainerEntry {
            path: "data.bin".to_string(),
            method,
            header_offset: 0,
            data_offset: offset,
            compressed_size: csize,
            uncompressed_size: size,
            crc32: 0,
            is_directory: false,
        }
    }

    #[test]
    fn range_reader_stays_in_bounds() {
        let data = b"xxhelloyy".to_vec();
        let mut reader = RangeReader::new(&data, 2, 5);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn range_past_source_is_unexpected_eof() {
        let data = b"abc".to_vec();
        let mut reader = RangeReader::new(&data, 1, 10);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn stored_entry_reads_declared_bytes() {
        let data = b"--payload--".to_vec();
        let e = entry(CompressionMethod::Stored, 2, 7, 7);
        let mut reader = EntryReader::new(&data, &e);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
        assert_eq!(reader.position(), 7);
    }

    #[test]
    fn deflated_entry_is_decompressed() {
        let plain = b"deflate me deflate me deflate me".repeat(8);
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();

        let e = entry(
            CompressionMethod::Deflated,
            0,
            compressed.len() as u64,
            plain.len() as u64,
        );
        let mut reader = EntryReader::new(&compressed, &e);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn short_deflate_stream_is_invalid_data() {
        let plain = b"short".to_vec();
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();

        let e = entry(CompressionMethod::Deflated, 0, compressed.len() as u64, 10);
        let mut reader = EntryReader::new(&compressed, &e);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(out, plain);
    }

    #[test]
    fn stored_entry_past_source_is_unexpected_eof() {
        let data = b"--pay".to_vec();
        let e = entry(CompressionMethod::Stored, 2, 7, 7);
        let mut reader = EntryReader::new(&data, &e);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn corrupt_deflate_stream_is_invalid_data() {
        let plain = b"a stream that will not survive".repeat(4);
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let mut compressed = encoder.finish().unwrap();
        // Turn the first block into the reserved block type 3.
        compressed[0] |= 0b110;

        let e = entry(CompressionMethod::Deflated, 0, compressed.len() as u64, plain.len() as u64);
        let mut reader = EntryReader::new(&compressed, &e);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn incomplete_deflate_stream_is_invalid_data() {
        let plain = b"cut short before the final block".repeat(16);
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();
        let cut = compressed.len() / 2;

        let e = entry(CompressionMethod::Deflated, 0, cut as u64, plain.len() as u64);
        let mut reader = EntryReader::new(&compressed, &e);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn deflated_entry_past_source_is_unexpected_eof() {
        let plain = b"the container was truncated".repeat(16);
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();
        let source = compressed[..compressed.len() / 2].to_vec();

        let e = entry(CompressionMethod::Deflated, 0, compressed.len() as u64, plain.len() as u64);
        let mut reader = EntryReader::new(&source, &e);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn long_entry_is_invalid_data() {
        let plain = b"longer than declared".to_vec();
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();

        let e = entry(CompressionMethod::Deflated, 0, compressed.len() as u64, 6);
        let mut reader = EntryReader::new(&compressed, &e);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
