use std::io;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("digest mismatch: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    Mismatch {
        expected: Vec<u8>,
        actual:   Vec<u8>,
    },

    #[error("unsupported hash algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("illegal state: {0}")]
    IllegalState(&'static str),
}

impl VerificationError {
    /// Recovers a verification error carried inside an `io::Error`.
    pub fn from_io(err: &io::Error) -> Option<&VerificationError> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<VerificationError>())
    }
}

impl From<VerificationError> for io::Error {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, VerificationError>;
