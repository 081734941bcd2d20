use std::sync::Arc;

use ed25519_dalek::{SIGNATURE_LENGTH, Signature, VerifyingKey};

use crate::error::VerifyError;

/// Capability that decides whether a signature over a message is trusted.
///
/// Trust-chain policy lives entirely behind this trait.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), VerifyError>;
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for &T {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        (**self).verify(message, signature)
    }
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for Arc<T> {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        (**self).verify(message, signature)
    }
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for Box<T> {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        (**self).verify(message, signature)
    }
}

/// Ed25519 verifier over a set of trusted public keys.
///
/// Accepts a raw 64-byte signature valid under any trusted key.
#[derive(Clone, Debug, Default)]
pub struct Ed25519Verifier {
    keys: Vec<VerifyingKey>,
}

impl Ed25519Verifier {
    pub fn new(key: VerifyingKey) -> Self { Self { keys: vec![key] } }

    pub fn with_keys(keys: impl IntoIterator<Item = VerifyingKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Parses a raw 32-byte public key.
    pub fn from_public_key_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        let raw: &[u8; 32] = bytes
            .try_into()
            .map_err(|_| VerifyError::Malformed(format!("public key is {} bytes, expected 32", bytes.len())))?;
        let key = VerifyingKey::from_bytes(raw).map_err(|e| VerifyError::Malformed(e.to_string()))?;
        Ok(Self::new(key))
    }

    pub fn trust(mut self, key: VerifyingKey) -> Self {
        self.keys.push(key);
        self
    }

    pub fn keys(&self) -> &[VerifyingKey] { &self.keys }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        if self.keys.is_empty() {
            return Err(VerifyError::NoTrustedKeys);
        }
        if signature.len() != SIGNATURE_LENGTH {
            return Err(VerifyError::Malformed(format!(
                "signature is {} bytes, expected {SIGNATURE_LENGTH}",
                signature.len()
            )));
        }
        let signature = Signature::from_slice(signature).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        if self.keys.iter().any(|key| key.verify_strict(message, &signature).is_ok()) {
            Ok(())
        } else {
            Err(VerifyError::Rejected)
        }
    }
}
