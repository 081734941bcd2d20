use std::io::{self, Read};

use sigil_verify::{HashAlgorithm, Hasher};

use crate::error::{Error, Result};
use crate::model::FileDigestEntry;

/// Content that fails to decode, or whose stream ends early, cannot match any digest.
fn is_corrupt_data(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof
    )
}

/// Recorded failure, replayed on every read after the first.
#[derive(Clone, Debug)]
enum Failure {
    Mismatch { block: usize },
    Truncated { expected: u64, actual: u64 },
    Trailing,
    Io { kind: io::ErrorKind, message: String },
}

/// Streams a file's plaintext, releasing each block only after its digest matched.
///
/// One block is buffered at a time. A failure poisons the reader: every later
/// read returns the same error.
pub struct BlockReader<'a, R> {
    inner:      R,
    entry:      &'a FileDigestEntry,
    hasher:     Box<dyn Hasher>,
    buffer:     Vec<u8>,
    pos:        usize,
    next_block: usize,
    consumed:   u64,
    finished:   bool,
    failure:    Option<Failure>,
}

impl<'a, R: Read> BlockReader<'a, R> {
    pub fn new(inner: R, entry: &'a FileDigestEntry, algorithm: HashAlgorithm) -> Self {
        Self {
            inner,
            entry,
            hasher: algorithm.hasher(),
            buffer: Vec::new(),
            pos: 0,
            next_block: 0,
            consumed: 0,
            finished: false,
            failure: None,
        }
    }

    /// Validates the next block and returns it whole; `None` once the file ended cleanly.
    ///
    /// Bytes of the current block not yet returned by `read` are discarded.
    pub fn read_block(&mut self) -> Result<Option<&[u8]>> {
        if self.fill_next()? {
            self.pos = self.buffer.len();
            Ok(Some(self.buffer.as_slice()))
        } else {
            Ok(None)
        }
    }

    fn fill_next(&mut self) -> Result<bool> {
        if let Some(failure) = &self.failure {
            return Err(self.replay(failure));
        }
        if self.finished {
            return Ok(false);
        }

        match self.advance() {
            Ok(more) => Ok(more),
            Err(err) => {
                tracing::warn!(path = self.entry.path(), block = self.next_block, error = %err, "block validation failed");
                self.buffer.clear();
                self.pos = 0;
                self.failure = Some(Failure::record(&err));
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<bool> {
        let entry = self.entry;
        let Some(block) = entry.blocks().get(self.next_block) else {
            self.check_trailing()?;
            self.finished = true;
            self.buffer.clear();
            self.pos = 0;
            return Ok(false);
        };

        let len = block.size() as usize;
        self.buffer.clear();
        self.buffer.resize(len, 0);
        self.pos = 0;

        let mut filled = 0;
        while filled < len {
            match self.inner.read(&mut self.buffer[filled..]) {
                Ok(0) => return Err(self.truncated(filled)),
                Ok(n) => {
                    self.hasher.update(&self.buffer[filled..filled + n]);
                    filled += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if is_corrupt_data(&e) => {
                    tracing::debug!(path = entry.path(), block = block.index(), error = %e, "block failed to decode");
                    return Err(Error::BlockHashMismatch {
                        path:  entry.path().to_string(),
                        block: block.index(),
                    });
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }

        if self.hasher.finalize_reset() != block.digest() {
            return Err(Error::BlockHashMismatch {
                path:  entry.path().to_string(),
                block: block.index(),
            });
        }

        self.next_block += 1;
        self.consumed += len as u64;
        Ok(true)
    }

    fn check_trailing(&mut self) -> Result<()> {
        let mut extra = [0u8; 1];
        loop {
            match self.inner.read(&mut extra) {
                Ok(0) => return Ok(()),
                Ok(_) => {
                    return Err(Error::TrailingContent {
                        path: self.entry.path().to_string(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                // Every block matched but the stream behind them is damaged.
                Err(e) if is_corrupt_data(&e) => {
                    tracing::debug!(path = self.entry.path(), error = %e, "content failed to decode past its last block");
                    let path = self.entry.path().to_string();
                    return Err(match self.entry.blocks().last() {
                        Some(last) => Error::BlockHashMismatch {
                            path,
                            block: last.index(),
                        },
                        None => Error::TrailingContent { path },
                    });
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn truncated(&self, filled: usize) -> Error {
        Error::TruncatedContent {
            path:     self.entry.path().to_string(),
            expected: self.entry.total_size(),
            actual:   self.consumed + filled as u64,
        }
    }
}

impl<R> BlockReader<'_, R> {
    pub fn entry(&self) -> &FileDigestEntry { self.entry }

    /// Validated bytes handed out so far.
    pub fn position(&self) -> u64 {
        let pending = self.buffer.len() - self.pos;
        self.consumed - pending as u64
    }

    pub fn is_poisoned(&self) -> bool { self.failure.is_some() }

    pub fn into_inner(self) -> R { self.inner }

    fn replay(&self, failure: &Failure) -> Error {
        let path = self.entry.path().to_string();
        match failure {
            Failure::Mismatch { block } => Error::BlockHashMismatch { path, block: *block },
            Failure::Truncated { expected, actual } => Error::TruncatedContent {
                path,
                expected: *expected,
                actual: *actual,
            },
            Failure::Trailing => Error::TrailingContent { path },
            Failure::Io { kind, message } => Error::Io(io::Error::new(*kind, message.clone())),
        }
    }
}

impl Failure {
    fn record(err: &Error) -> Self {
        match err {
            Error::BlockHashMismatch { block, .. } => Failure::Mismatch { block: *block },
            Error::TruncatedContent { expected, actual, .. } => Failure::Truncated {
                expected: *expected,
                actual:   *actual,
            },
            Error::TrailingContent { .. } => Failure::Trailing,
            Error::Io(e) => Failure::Io {
                kind:    e.kind(),
                message: e.to_string(),
            },
            Error::InvalidBlockMap(reason) => Failure::Io {
                kind:    io::ErrorKind::InvalidData,
                message: reason.clone(),
            },
        }
    }
}

impl<R: Read> Read for BlockReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos == self.buffer.len() && !self.fill_next()? {
            return Ok(0);
        }
        let n = buf.len().min(self.buffer.len() - self.pos);
        buf[..n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
