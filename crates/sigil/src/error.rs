use std::io;

/// Discriminant handed across the external boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFormat,
    FileNotFound,
    InvalidBlockMap,
    SignatureInvalid,
    BlockHashMismatch,
    TruncatedContent,
    OutOfMemory,
    InvalidParameter,
    NotSupported,
    NotImplemented,
    Io,
}

/// Status reported for success.
pub const STATUS_OK: u32 = 0;

impl ErrorKind {
    /// Stable HRESULT-style status code.
    pub const fn status(self) -> u32 {
        match self {
            ErrorKind::NotImplemented => 0x8000_4001,
            ErrorKind::Io => 0x8000_4005,
            ErrorKind::FileNotFound => 0x8007_0002,
            ErrorKind::OutOfMemory => 0x8007_000E,
            ErrorKind::NotSupported => 0x8007_0032,
            ErrorKind::InvalidParameter => 0x8007_0057,
            ErrorKind::InvalidFormat => 0x8BAD_0002,
            ErrorKind::SignatureInvalid => 0x8BAD_0041,
            ErrorKind::InvalidBlockMap => 0x8BAD_0051,
            ErrorKind::BlockHashMismatch => 0x8BAD_0052,
            ErrorKind::TruncatedContent => 0x8BAD_0053,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid package format: {0}")]
    InvalidFormat(String),

    #[error("file not found: '{path}'")]
    FileNotFound { path: String },

    #[error("invalid block map: {0}")]
    InvalidBlockMap(String),

    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("block {block} of '{path}' does not match its digest")]
    BlockHashMismatch { path: String, block: usize },

    #[error("'{path}' ended after {actual} of {expected} bytes")]
    TruncatedContent {
        path:     String,
        expected: u64,
        actual:   u64,
    },

    #[error("allocation of {requested} bytes failed")]
    OutOfMemory { requested: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("not supported: {0}")]
    NotSupported(&'static str),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Error::FileNotFound { .. } => ErrorKind::FileNotFound,
            Error::InvalidBlockMap(_) => ErrorKind::InvalidBlockMap,
            Error::SignatureInvalid(_) => ErrorKind::SignatureInvalid,
            Error::BlockHashMismatch { .. } => ErrorKind::BlockHashMismatch,
            Error::TruncatedContent { .. } => ErrorKind::TruncatedContent,
            Error::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Error::NotSupported(_) => ErrorKind::NotSupported,
            Error::NotImplemented(_) => ErrorKind::NotImplemented,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub fn status(&self) -> u32 { self.kind().status() }

    /// Recovers the typed error behind an `io::Error` raised by a package reader.
    pub fn from_io(err: io::Error) -> Self {
        let recovered = sigil_blockmap::Error::from_io(&err).and_then(|inner| match inner {
            sigil_blockmap::Error::BlockHashMismatch { path, block } => Some(Error::BlockHashMismatch {
                path:  path.clone(),
                block: *block,
            }),
            sigil_blockmap::Error::TruncatedContent { path, expected, actual } => Some(Error::TruncatedContent {
                path:     path.clone(),
                expected: *expected,
                actual:   *actual,
            }),
            sigil_blockmap::Error::TrailingContent { path } => Some(Error::InvalidFormat(format!(
                "'{path}' has content past its last block"
            ))),
            sigil_blockmap::Error::InvalidBlockMap(reason) => Some(Error::InvalidBlockMap(reason.clone())),
            sigil_blockmap::Error::Io(_) => None,
        });
        if let Some(err) = recovered {
            return err;
        }
        if sigil_verify::VerificationError::from_io(&err).is_some() {
            return Error::SignatureInvalid(err.to_string());
        }
        Error::Io(err)
    }
}

impl From<sigil_archive::Error> for Error {
    fn from(err: sigil_archive::Error) -> Self {
        match err {
            sigil_archive::Error::FileNotFound { path } => Error::FileNotFound { path },
            sigil_archive::Error::IsDirectory { .. } => Error::InvalidParameter("path names a directory"),
            sigil_archive::Error::Io(e) => Error::Io(e),
            other => Error::InvalidFormat(other.to_string()),
        }
    }
}

impl From<sigil_blockmap::Error> for Error {
    fn from(err: sigil_blockmap::Error) -> Self {
        match err {
            sigil_blockmap::Error::InvalidBlockMap(reason) => Error::InvalidBlockMap(reason),
            sigil_blockmap::Error::BlockHashMismatch { path, block } => Error::BlockHashMismatch { path, block },
            sigil_blockmap::Error::TruncatedContent { path, expected, actual } => {
                Error::TruncatedContent { path, expected, actual }
            }
            sigil_blockmap::Error::TrailingContent { path } => {
                Error::InvalidFormat(format!("'{path}' has content past its last block"))
            }
            sigil_blockmap::Error::Io(e) => Error::from_io(e),
        }
    }
}

impl From<sigil_signature::Error> for Error {
    fn from(err: sigil_signature::Error) -> Self {
        match err {
            sigil_signature::Error::SignatureInvalid(reason) => Error::SignatureInvalid(reason),
            sigil_signature::Error::IllegalState(reason) => Error::SignatureInvalid(reason.to_string()),
            sigil_signature::Error::Archive(e) => e.into(),
            sigil_signature::Error::Io(e) => Error::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
