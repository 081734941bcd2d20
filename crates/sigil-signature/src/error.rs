use std::io;

/// Rejection reported by a [`SignatureVerifier`](crate::SignatureVerifier).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("malformed signature: {0}")]
    Malformed(String),

    #[error("signature not accepted by any trusted key")]
    Rejected,

    #[error("no trusted keys configured")]
    NoTrustedKeys,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    #[error(transparent)]
    Archive(#[from] sigil_archive::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<VerifyError> for Error {
    fn from(err: VerifyError) -> Self { Self::SignatureInvalid(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
