use std::io::{self, Cursor, Read};

use sigil_archive::{ByteSource, Container};
use sigil_verify::{Sha256Hasher, VerifiedStream};

use crate::error::{Error, Result};
use crate::record::SignatureRecord;
use crate::verifier::SignatureVerifier;

pub const DEFAULT_MAX_SIGNED_BYTES: u64 = 16 * 1024 * 1024;
pub const DEFAULT_MAX_SIGNATURE_BYTES: u64 = 64 * 1024;

/// Stream over signature-verified bytes, pinned to their SHA-256 digest.
pub type VerifiedEntry = VerifiedStream<Cursor<Vec<u8>>, Sha256Hasher>;

/// Upper bounds on what is read into memory during verification.
#[derive(Clone, Debug)]
pub struct VerifyLimits {
    pub max_signed_bytes:    u64,
    pub max_signature_bytes: u64,
}

impl Default for VerifyLimits {
    fn default() -> Self {
        Self {
            max_signed_bytes:    DEFAULT_MAX_SIGNED_BYTES,
            max_signature_bytes: DEFAULT_MAX_SIGNATURE_BYTES,
        }
    }
}

impl VerifyLimits {
    pub fn max_signed_bytes(mut self, bytes: u64) -> Self {
        self.max_signed_bytes = bytes;
        self
    }

    pub fn max_signature_bytes(mut self, bytes: u64) -> Self {
        self.max_signature_bytes = bytes;
        self
    }
}

/// Verifies `signed_entry` against the signature stored in `signature_entry`.
///
/// The signed entry is read whole and handed to `verifier`. On success the
/// returned stream replays exactly the verified bytes.
pub fn verify_entry<S: ByteSource>(
    container: &Container<S>,
    signature_entry: &str,
    signed_entry: &str,
    verifier: &dyn SignatureVerifier,
    limits: &VerifyLimits,
) -> Result<VerifiedEntry> {
    tracing::debug!(signature = signature_entry, signed = signed_entry, "verifying embedded signature");

    let signature = read_bounded(container.get_entry(signature_entry)?, signature_entry, limits.max_signature_bytes)?;
    let signed = read_bounded(container.get_entry(signed_entry)?, signed_entry, limits.max_signed_bytes)?;
    finish(signed_entry, signed, signature, verifier)
}

/// Verifies `signed` against a signature supplied from a separate source.
pub fn verify_detached<R: Read, G: Read>(
    signed_name: &str,
    signed: R,
    signature: G,
    verifier: &dyn SignatureVerifier,
    limits: &VerifyLimits,
) -> Result<VerifiedEntry> {
    tracing::debug!(signed = signed_name, "verifying detached signature");

    let signature = read_bounded(signature, "detached signature", limits.max_signature_bytes)?;
    let signed = read_bounded(signed, signed_name, limits.max_signed_bytes)?;
    finish(signed_name, signed, signature, verifier)
}

fn finish(
    signed_name: &str,
    signed: Vec<u8>,
    signature: Vec<u8>,
    verifier: &dyn SignatureVerifier,
) -> Result<VerifiedEntry> {
    let mut record = SignatureRecord::new(signed_name, signature);
    record.verify(verifier, &signed)?;

    let digest = Sha256Hasher::digest(&signed);
    Ok(VerifiedStream::new(Cursor::new(signed), Sha256Hasher::new(), digest))
}

fn read_bounded<R: Read>(reader: R, name: &str, limit: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Err(e) = reader.take(limit.saturating_add(1)).read_to_end(&mut buf) {
        return Err(match e.kind() {
            // The stored bytes cannot be reproduced, so nothing can verify against them.
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
                tracing::warn!(entry = name, error = %e, "signed material failed to decode");
                Error::SignatureInvalid(format!("'{name}' cannot be read: {e}"))
            }
            _ => Error::Io(e),
        });
    }
    if buf.len() as u64 > limit {
        tracing::warn!(entry = name, limit, "signed material exceeds limit");
        return Err(Error::SignatureInvalid(format!("'{name}' exceeds {limit} bytes")));
    }
    Ok(buf)
}
