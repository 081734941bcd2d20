//! Signed block-map package reader.
//!
//! Opens a ZIP package carrying a block map and a detached signature, and
//! releases member files only after their integrity was established: the
//! signature covers the block map, the block map covers every content block.
//!
//! # Architecture
//!
//! - [`sigil_archive`]: container index and lazy entry streams
//! - [`sigil_signature`]: signature over the block map entry
//! - [`sigil_blockmap`]: digest table and block-validating reader
//! - this crate: [`Package`] orchestration, [`PackageFactory`] façade,
//!   [`ErrorKind`] status codes and buffer marshaling
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::Read;
//! use sigil::{Ed25519Verifier, PackageFactory};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let key = [0u8; 32];
//! let factory = PackageFactory::builder()
//!     .verifier(Ed25519Verifier::from_public_key_bytes(&key)?)
//!     .build();
//!
//! let package = factory.create_package_reader(File::open("app.pkg")?)?;
//! let mut text = String::new();
//! package.open_validated_file("a.txt")?.read_to_string(&mut text)?;
//! # Ok(())
//! # }
//! ```

pub use self::error::{Error, ErrorKind, Result, STATUS_OK};
pub use self::factory::{PackageFactory, PackageFactoryBuilder, StreamFactory};
pub use self::marshal::{BufferAllocator, HeapAllocator, marshal_out_bytes, marshal_out_string, marshal_out_wide};
pub use self::options::{BLOCK_MAP_ENTRY, CONTENT_TYPES_ENTRY, PackageOptions, SIGNATURE_ENTRY, Validation};
pub use self::package::{Package, ValidatedFile};
pub use sigil_archive::{ByteSource, Container, ContainerEntry, EntryReader, SeekSource};
pub use sigil_blockmap::{BlockDescriptor, BlockReader, DigestTable, FileDigestEntry, HashAlgorithm, ParseOptions};
pub use sigil_signature::{Ed25519Verifier, SignatureVerifier, VerifyError, VerifyLimits};

mod error;
mod factory;
mod marshal;
mod options;
mod package;
