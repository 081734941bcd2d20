use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid block map: {0}")]
    InvalidBlockMap(String),

    #[error("block {block} of '{path}' does not match its digest")]
    BlockHashMismatch { path: String, block: usize },

    #[error("'{path}' ended after {actual} of {expected} bytes")]
    TruncatedContent {
        path:     String,
        expected: u64,
        actual:   u64,
    },

    #[error("'{path}' has content past its last block")]
    TrailingContent { path: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self { Self::InvalidBlockMap(reason.into()) }

    /// Recovers a block-map error carried inside an `io::Error`.
    pub fn from_io(err: &io::Error) -> Option<&Error> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Error>())
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
