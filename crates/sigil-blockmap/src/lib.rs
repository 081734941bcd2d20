//! Block-map digest tables and validated block readers.
//!
//! A block map lists, for every content file of a package, the ordered blocks
//! of its plaintext and the digest of each block. Content is released to
//! callers one block at a time and only after that block's digest matched.
//!
//! # Architecture
//!
//! - [`DigestTable`]: immutable model of the block map, keyed case-insensitively
//! - [`parse`]/[`parse_bytes`]: JSON descriptor to [`DigestTable`], bounded
//! - [`BlockReader`]: per-file `Read` adapter that validates block by block
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use sigil_blockmap::{BlockReader, ParseOptions, parse_bytes};
//!
//! let json = r#"{"hashMethod":"sha256","files":[{"name":"a.txt","size":5,
//!     "blocks":[{"hash":"LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=","size":5}]}]}"#;
//! let table = parse_bytes(json.as_bytes(), &ParseOptions::default()).unwrap();
//!
//! let entry = table.get("a.txt").unwrap();
//! let mut reader = BlockReader::new(&b"hello"[..], entry, table.algorithm());
//! let mut text = String::new();
//! reader.read_to_string(&mut text).unwrap();
//! assert_eq!(text, "hello");
//! ```

pub use self::descriptor::{DEFAULT_MAX_BLOCK_BYTES, DEFAULT_MAX_DESCRIPTOR_BYTES, ParseOptions, parse, parse_bytes};
pub use self::error::{Error, Result};
pub use self::model::{BlockDescriptor, DigestTable, FileDigestEntry};
pub use self::reader::BlockReader;
pub use sigil_verify::HashAlgorithm;

mod descriptor;
mod error;
mod model;
mod reader;
