//! Read-only access to ZIP package containers.
//!
//! # Architecture
//!
//! - `source.rs` - Positional byte sources (no shared cursor)
//! - `sanitize.rs` - Entry name normalization and case-insensitive keys
//! - `container.rs` - Index construction over `zip::ZipArchive` and layout validation
//! - `reader.rs` - Lazy, size-checked entry streams

pub use container::Container;
pub use entry::{CompressionMethod, ContainerEntry};
pub use error::{Error, Result};
pub use reader::{EntryReader, RangeReader};
pub use sanitize::{lookup_key, normalize_entry_name};
pub use source::{ByteSource, SeekSource};

mod container;
mod entry;
mod error;
mod reader;
mod sanitize;
mod source;
