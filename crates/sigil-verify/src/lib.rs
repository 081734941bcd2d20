//! Content verification primitives.
//!
//! Provides incremental hashing and a tamper-evident stream decorator without
//! enforcing a verification policy. Digests are computed as data streams
//! through, so every byte is touched once.
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use sigil_verify::{Sha256Hasher, VerifiedStream};
//!
//! let data = b"hello world";
//! let expected = Sha256Hasher::digest(data);
//!
//! let mut stream = VerifiedStream::new(&data[..], Sha256Hasher::new(), expected);
//! let mut buffer = Vec::new();
//! stream.read_to_end(&mut buffer).unwrap();
//! assert!(stream.is_verified());
//! ```

pub use self::algorithm::HashAlgorithm;
pub use self::error::{Result, VerificationError};
pub use self::hasher::{DigestHasher, Hasher, Sha256Hasher, Sha384Hasher, Sha512Hasher};
pub use self::reader::VerifiedStream;

mod algorithm;
mod error;
mod hasher;
mod reader;
