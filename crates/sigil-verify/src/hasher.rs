use digest::{Digest, FixedOutputReset};

/// Incremental hash state.
///
/// `finalize_reset` returns the digest of everything fed so far and leaves
/// the hasher ready for the next message, which lets one instance digest a
/// sequence of blocks.
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);

    fn finalize_reset(&mut self) -> Vec<u8>;

    fn finalize(mut self) -> Vec<u8>
    where
        Self: Sized,
    {
        self.finalize_reset()
    }
}

impl<H: Hasher + ?Sized> Hasher for Box<H> {
    fn update(&mut self, data: &[u8]) { (**self).update(data) }

    fn finalize_reset(&mut self) -> Vec<u8> { (**self).finalize_reset() }
}

/// Adapter from any RustCrypto digest to [`Hasher`].
#[derive(Clone, Default)]
pub struct DigestHasher<D>(D);

impl<D: Digest> DigestHasher<D> {
    pub fn new() -> Self { Self(D::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { D::digest(data).to_vec() }
}

impl<D: Digest + FixedOutputReset + Send> Hasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) { Digest::update(&mut self.0, data); }

    fn finalize_reset(&mut self) -> Vec<u8> { Digest::finalize_reset(&mut self.0).to_vec() }
}

pub type Sha256Hasher = DigestHasher<sha2::Sha256>;
pub type Sha384Hasher = DigestHasher<sha2::Sha384>;
pub type Sha512Hasher = DigestHasher<sha2::Sha512>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_answer() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        let expected =
            hex::decode("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
                .unwrap();
        assert_eq!(hasher.finalize(), expected);
    }

    #[test]
    fn finalize_reset_starts_a_new_message() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"first");
        let first = hasher.finalize_reset();
        hasher.update(b"second");
        let second = hasher.finalize_reset();

        assert_eq!(first, Sha256Hasher::digest(b"first"));
        assert_eq!(second, Sha256Hasher::digest(b"second"));
    }

    #[test]
    fn boxed_hasher_delegates() {
        let mut hasher: Box<dyn Hasher> = Box::new(Sha512Hasher::new());
        hasher.update(b"abc");
        let digest = hasher.finalize();
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, Sha512Hasher::digest(b"abc"));
    }
}
