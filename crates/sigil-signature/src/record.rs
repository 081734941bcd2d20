use crate::error::{Error, Result};
use crate::verifier::SignatureVerifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureState {
    NotChecked,
    Verified,
    Failed,
}

/// A signature over one named entry, checked at most once.
#[derive(Clone, Debug)]
pub struct SignatureRecord {
    signed_entry: String,
    signature:    Vec<u8>,
    state:        SignatureState,
}

impl SignatureRecord {
    pub fn new(signed_entry: impl Into<String>, signature: Vec<u8>) -> Self {
        Self {
            signed_entry: signed_entry.into(),
            signature,
            state: SignatureState::NotChecked,
        }
    }

    pub fn signed_entry(&self) -> &str { &self.signed_entry }

    pub fn signature(&self) -> &[u8] { &self.signature }

    pub fn state(&self) -> SignatureState { self.state }

    /// Checks `message` against the signature, moving out of `NotChecked`.
    ///
    /// Any call after the first is `IllegalState`.
    pub fn verify(&mut self, verifier: &dyn SignatureVerifier, message: &[u8]) -> Result<()> {
        if self.state != SignatureState::NotChecked {
            return Err(Error::IllegalState("signature already checked"));
        }

        match verifier.verify(message, &self.signature) {
            Ok(()) => {
                self.state = SignatureState::Verified;
                tracing::debug!(entry = %self.signed_entry, "signature verified");
                Ok(())
            }
            Err(err) => {
                self.state = SignatureState::Failed;
                tracing::warn!(entry = %self.signed_entry, error = %err, "signature rejected");
                Err(Error::SignatureInvalid(format!("'{}': {err}", self.signed_entry)))
            }
        }
    }
}
