use std::io::{self, Read};

use crate::{Hasher, Result, VerificationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Streaming,
    Verified,
    Failed,
}

/// Read-only decorator pinning a stream to an expected digest.
///
/// Bytes pass through unchanged while being hashed. When the inner stream
/// ends, the running digest is compared with the expected one: a match
/// reports end of stream, a mismatch fails the read and every read after it.
pub struct VerifiedStream<R, H> {
    reader:   R,
    hasher:   H,
    expected: Vec<u8>,
    state:    State,
}

impl<R, H> VerifiedStream<R, H> {
    pub fn new(reader: R, hasher: H, expected: impl Into<Vec<u8>>) -> Self {
        Self {
            reader,
            hasher,
            expected: expected.into(),
            state: State::Streaming,
        }
    }

    /// Digest the stream is pinned to.
    pub fn expected(&self) -> &[u8] { &self.expected }

    /// `true` once the whole stream was read and matched.
    pub fn is_verified(&self) -> bool { self.state == State::Verified }

    pub fn is_failed(&self) -> bool { self.state == State::Failed }
}

impl<R: Read, H: Hasher> VerifiedStream<R, H> {
    /// Drains the stream and checks the digest.
    pub fn finish(mut self) -> Result<()> {
        io::copy(&mut self, &mut io::sink()).map_err(|e| {
            if let Some(VerificationError::Mismatch { expected, actual }) = VerificationError::from_io(&e) {
                return VerificationError::Mismatch {
                    expected: expected.clone(),
                    actual:   actual.clone(),
                };
            }
            VerificationError::Io(e)
        })?;
        Ok(())
    }

    fn mismatch(&self, actual: Vec<u8>) -> io::Error {
        VerificationError::Mismatch {
            expected: self.expected.clone(),
            actual,
        }
        .into()
    }
}

impl<R: Read, H: Hasher> Read for VerifiedStream<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.state {
            State::Failed => {
                return Err(VerificationError::IllegalState("stream failed verification").into());
            }
            State::Verified => return Ok(0),
            State::Streaming => {}
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            return Ok(n);
        }

        let actual = self.hasher.finalize_reset();
        if actual == self.expected {
            self.state = State::Verified;
            Ok(0)
        } else {
            self.state = State::Failed;
            Err(self.mismatch(actual))
        }
    }
}
