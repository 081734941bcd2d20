use std::convert::Infallible;
use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::Arc;

use sigil_archive::ByteSource;
use sigil_blockmap::DigestTable;
use sigil_signature::{Ed25519Verifier, SignatureVerifier, verify_detached};

use crate::error::{Error, Result};
use crate::marshal::{self, BufferAllocator, HeapAllocator};
use crate::options::{PackageOptions, Validation};
use crate::package::Package;

/// Supplies named byte streams in place of the filesystem.
pub trait StreamFactory: Send + Sync {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Entry point for creating package and block-map readers.
///
/// Capabilities are fixed when the factory is built.
pub struct PackageFactory {
    options:        PackageOptions,
    verifier:       Option<Arc<dyn SignatureVerifier>>,
    allocator:      Arc<dyn BufferAllocator>,
    stream_factory: Option<Arc<dyn StreamFactory>>,
}

#[derive(Default)]
pub struct PackageFactoryBuilder {
    options:        PackageOptions,
    verifier:       Option<Arc<dyn SignatureVerifier>>,
    allocator:      Option<Arc<dyn BufferAllocator>>,
    stream_factory: Option<Arc<dyn StreamFactory>>,
}

impl PackageFactoryBuilder {
    pub fn options(mut self, options: PackageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn verifier(mut self, verifier: impl SignatureVerifier + 'static) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn allocator(mut self, allocator: impl BufferAllocator + 'static) -> Self {
        self.allocator = Some(Arc::new(allocator));
        self
    }

    pub fn stream_factory(mut self, factory: impl StreamFactory + 'static) -> Self {
        self.stream_factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> PackageFactory {
        PackageFactory {
            options:        self.options,
            verifier:       self.verifier,
            allocator:      self.allocator.unwrap_or_else(|| Arc::new(HeapAllocator)),
            stream_factory: self.stream_factory,
        }
    }
}

impl PackageFactory {
    pub fn builder() -> PackageFactoryBuilder { PackageFactoryBuilder::default() }

    pub fn options(&self) -> &PackageOptions { &self.options }

    /// The stream supplier injected at build time, if any.
    pub fn stream_factory(&self) -> Option<&Arc<dyn StreamFactory>> { self.stream_factory.as_ref() }

    pub fn create_package_reader<S: ByteSource>(&self, source: S) -> Result<Package<S>> {
        match (&self.verifier, self.options.validation) {
            (Some(verifier), _) => Package::open(source, &self.options, &**verifier),
            (None, Validation::SkipSignature) => Package::open(source, &self.options, &Ed25519Verifier::default()),
            (None, Validation::Full) => Err(Error::InvalidParameter("full validation needs a signature verifier")),
        }
    }

    /// Parses a block map without checking any signature.
    pub fn create_block_map_reader<R: Read>(&self, reader: R) -> Result<DigestTable> {
        Ok(sigil_blockmap::parse(reader, &self.options.parse)?)
    }

    /// Parses a block map after checking it against a detached signature file.
    ///
    /// The signature is opened through the stream factory when one was
    /// supplied, otherwise from the filesystem.
    pub fn create_validated_block_map_reader<R: Read>(&self, reader: R, signature_path: &str) -> Result<DigestTable> {
        if signature_path.is_empty() {
            return Err(Error::InvalidParameter("signature path is empty"));
        }
        let verifier = self
            .verifier
            .as_deref()
            .ok_or(Error::InvalidParameter("validated block maps need a signature verifier"))?;

        let signature = self.open_stream(signature_path)?;
        let verified = verify_detached(
            &self.options.block_map_entry,
            reader,
            signature,
            verifier,
            &self.options.limits,
        )?;
        Ok(sigil_blockmap::parse(verified, &self.options.parse)?)
    }

    pub fn create_package_writer<W: Write>(&self, _output: W) -> Result<Infallible> {
        Err(Error::NotImplemented("package writing"))
    }

    pub fn create_manifest_reader<R: Read>(&self, _input: R) -> Result<Infallible> {
        Err(Error::NotImplemented("manifest reading"))
    }

    pub fn create_bundle_reader<R: Read>(&self, _input: R) -> Result<Infallible> {
        Err(Error::NotSupported("bundles"))
    }

    pub fn create_bundle_writer<W: Write>(&self, _output: W, _bundle_version: u64) -> Result<Infallible> {
        Err(Error::NotSupported("bundles"))
    }

    pub fn create_bundle_manifest_reader<R: Read>(&self, _input: R) -> Result<Infallible> {
        Err(Error::NotSupported("bundles"))
    }

    pub fn marshal_out_string(&self, value: &str, out: &mut Option<Box<[u8]>>) -> Result<()> {
        marshal::marshal_out_string(self.allocator.as_ref(), value, out)
    }

    pub fn marshal_out_wide(&self, value: &[u16], out: &mut Option<Box<[u8]>>) -> Result<()> {
        marshal::marshal_out_wide(self.allocator.as_ref(), value, out)
    }

    pub fn marshal_out_bytes(&self, data: &[u8], out: &mut Option<Box<[u8]>>) -> Result<()> {
        marshal::marshal_out_bytes(self.allocator.as_ref(), data, out)
    }

    fn open_stream(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let opened = match &self.stream_factory {
            Some(factory) => factory.open(name),
            None => File::open(name).map(|file| Box::new(file) as Box<dyn Read + Send>),
        };
        opened.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound { path: name.to_string() },
            _ => Error::Io(e),
        })
    }
}
