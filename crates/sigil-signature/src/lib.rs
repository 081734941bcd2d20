//! Signature verification for signed package entries.
//!
//! A package carries a detached signature over one entry, normally its block
//! map. Nothing read from that entry is trusted until the signature checked
//! out; afterwards the entry's bytes are served from memory through a
//! [`VerifiedStream`](sigil_verify::VerifiedStream) pinned to their digest.
//!
//! # Architecture
//!
//! - [`SignatureVerifier`]: injected trust decision, [`Ed25519Verifier`] provided
//! - [`SignatureRecord`]: one signature, checked exactly once
//! - [`verify_entry`]/[`verify_detached`]: bounded read, verify, replay

pub use self::error::{Error, Result, VerifyError};
pub use self::record::{SignatureRecord, SignatureState};
pub use self::verifier::{Ed25519Verifier, SignatureVerifier};
pub use self::verify::{
    DEFAULT_MAX_SIGNATURE_BYTES, DEFAULT_MAX_SIGNED_BYTES, VerifiedEntry, VerifyLimits, verify_detached, verify_entry,
};

mod error;
mod record;
mod verifier;
mod verify;
