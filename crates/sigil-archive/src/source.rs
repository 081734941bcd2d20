//! Positional byte sources backing a container.
//!
//! Every read names its own offset, so any number of entry readers can share
//! one source without a shared cursor.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

/// A seekable, shareable byte source.
pub trait ByteSource: Send + Sync {
    /// Total length of the source in bytes.
    fn size(&self) -> io::Result<u64>;

    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns `Ok(0)` at or past the end of the source.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Fills `buf` completely from `offset` or fails with `UnexpectedEof`.
    fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(offset, buf) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => {
                    offset += n as u64;
                    buf = &mut buf[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl ByteSource for [u8] {
    fn size(&self) -> io::Result<u64> { Ok(self.len() as u64) }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ByteSource for Vec<u8> {
    fn size(&self) -> io::Result<u64> { self.as_slice().size() }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &T {
    fn size(&self) -> io::Result<u64> { (**self).size() }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    fn size(&self) -> io::Result<u64> { (**self).size() }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn size(&self) -> io::Result<u64> { (**self).size() }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl ByteSource for File {
    fn size(&self) -> io::Result<u64> { Ok(self.metadata()?.len()) }

    #[cfg(unix)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

/// Adapts any `Read + Seek` stream into a [`ByteSource`].
///
/// The stream cursor sits behind a mutex that is held for a single
/// seek-and-read pair, so concurrent entry readers serialize only on the
/// underlying I/O call.
pub struct SeekSource<R> {
    inner: Mutex<R>,
}

impl<R: Read + Seek> SeekSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: Read + Seek + Send> ByteSource for SeekSource<R> {
    fn size(&self) -> io::Result<u64> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;
        inner.seek(SeekFrom::End(0))
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;
        inner.seek(SeekFrom::Start(offset))?;
        inner.read(buf)
    }
}

fn poisoned() -> io::Error {
    io::Error::other("byte source lock poisoned")
}

/// A private `Read + Seek` cursor over a [`ByteSource`].
///
/// Used while the index is built; entry streams keep reading positionally.
pub(crate) struct SourceCursor<'a> {
    source: &'a dyn ByteSource,
    pos: u64,
}

impl<'a> SourceCursor<'a> {
    pub(crate) fn new(source: &'a dyn ByteSource) -> Self { Self { source, pos: 0 } }
}

impl Read for SourceCursor<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read_at(self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for SourceCursor<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.source.size()?.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position")
        })?;
        self.pos = target;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn slice_reads_are_positional() {
        let data = b"0123456789".to_vec();
        let mut buf = [0u8; 4];
        assert_eq!(data.read_at(3, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"3456");
        assert_eq!(data.read_at(8, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"89");
        assert_eq!(data.read_at(10, &mut buf).unwrap(), 0);
        assert_eq!(data.read_at(u64::MAX, &mut buf).unwrap(), 0);
    }

    #[test]
    fn read_exact_at_reports_short_source() {
        let data = b"abc".to_vec();
        let mut buf = [0u8; 4];
        let err = data.read_exact_at(0, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn seek_source_matches_slice() {
        let source = SeekSource::new(Cursor::new(b"hello world".to_vec()));
        assert_eq!(source.size().unwrap(), 11);
        let mut buf = [0u8; 5];
        source.read_exact_at(6, &mut buf).unwrap();
        assert_eq!(&buf, b"world");
        source.read_exact_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn cursor_reads_and_seeks_over_source() {
        let data = b"0123456789".to_vec();
        let mut cursor = SourceCursor::new(&data);
        assert_eq!(cursor.seek(SeekFrom::End(-4)).unwrap(), 6);
        let mut buf = [0u8; 3];
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"678");
        assert_eq!(cursor.seek(SeekFrom::Current(-8)).unwrap(), 1);
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"123");
        assert_eq!(cursor.seek(SeekFrom::Current(-10)).unwrap_err().kind(), io::ErrorKind::InvalidInput);

        let mut rest = Vec::new();
        cursor.seek(SeekFrom::Start(8)).unwrap();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"89");
    }

    #[test]
    fn file_source_reads_at_offset() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"package bytes").unwrap();
        assert_eq!(ByteSource::size(&file).unwrap(), 13);
        let mut buf = [0u8; 5];
        file.read_exact_at(8, &mut buf).unwrap();
        assert_eq!(&buf, b"bytes");
    }
}
