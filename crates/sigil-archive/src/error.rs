use std::borrow::Cow;
use std::io;

use zip::result::ZipError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid container format: {0}")]
    InvalidFormat(Cow<'static, str>),

    #[error("invalid entry name '{name}': {reason}")]
    InvalidEntryName { name: String, reason: &'static str },

    #[error("duplicate entry '{name}'")]
    DuplicateEntry { name: String },

    #[error("entry '{name}' overlaps entry '{other}'")]
    OverlappingEntries { name: String, other: String },

    #[error("entry '{name}' uses unsupported compression method {method}")]
    UnsupportedCompression { name: String, method: u16 },

    #[error("file not found in container: '{path}'")]
    FileNotFound { path: String },

    #[error("'{path}' is a directory")]
    IsDirectory { path: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invalid(reason: &'static str) -> Self { Self::InvalidFormat(Cow::Borrowed(reason)) }

    /// Returns `true` for every failure caused by the container bytes themselves.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::InvalidEntryName { .. }
                | Self::DuplicateEntry { .. }
                | Self::OverlappingEntries { .. }
                | Self::UnsupportedCompression { .. }
        )
    }
}

impl From<ZipError> for Error {
    fn from(err: ZipError) -> Self {
        match err {
            // Running off the end of the source means a record points past it.
            ZipError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Self::invalid("record extends past the end of the container")
            }
            ZipError::Io(e) => Self::Io(e),
            ZipError::InvalidArchive(reason) => Self::InvalidFormat(reason),
            ZipError::UnsupportedArchive(reason) => Self::InvalidFormat(Cow::Borrowed(reason)),
            other => Self::InvalidFormat(Cow::Owned(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
