use std::io::Read;

use sigil_archive::{ByteSource, Container, ContainerEntry, EntryReader};
use sigil_blockmap::{BlockReader, DigestTable, FileDigestEntry};
use sigil_signature::{SignatureVerifier, verify_entry};

use crate::error::{Error, Result};
use crate::options::{PackageOptions, Validation};

/// Reader over the block-mapped content of an opened package.
pub type ValidatedFile<'a> = BlockReader<'a, EntryReader<'a>>;

/// An opened package whose block map has been established.
///
/// The package owns its container; file readers borrow it, so it cannot be
/// dropped while readers are outstanding. All methods take `&self` and may be
/// called from several threads at once.
pub struct Package<S> {
    container: Container<S>,
    block_map: DigestTable,
    options:   PackageOptions,
}

impl<S: ByteSource> Package<S> {
    /// Opens a package, establishing its block map per `options.validation`.
    ///
    /// `verifier` is consulted only under [`Validation::Full`].
    pub fn open(source: S, options: &PackageOptions, verifier: &dyn SignatureVerifier) -> Result<Self> {
        let container = Container::open(source)?;
        tracing::debug!(entries = container.len(), validation = ?options.validation, "opened package container");

        let block_map = match options.validation {
            Validation::Full => {
                let verified = verify_entry(
                    &container,
                    &options.signature_entry,
                    &options.block_map_entry,
                    verifier,
                    &options.limits,
                )?;
                sigil_blockmap::parse(verified, &options.parse)?
            }
            Validation::SkipSignature => {
                tracing::debug!(entry = %options.block_map_entry, "skipping block map signature");
                let raw = container.get_entry(&options.block_map_entry)?;
                sigil_blockmap::parse(raw, &options.parse)?
            }
        };

        check_coverage(&container, &block_map, options)?;
        tracing::debug!(files = block_map.len(), algorithm = %block_map.algorithm(), "package block map established");

        Ok(Self {
            container,
            block_map,
            options: options.clone(),
        })
    }

    /// Opens a content file whose blocks are checked as they are read.
    pub fn open_validated_file(&self, path: &str) -> Result<ValidatedFile<'_>> {
        let (entry, digests) = self.lookup(path)?;
        let Some(digests) = digests else {
            tracing::warn!(path = %entry.path, "file is not covered by the block map");
            return Err(Error::InvalidBlockMap(format!("'{}' is not listed in the block map", entry.path)));
        };

        let reader = self.container.get_entry(path)?;
        Ok(BlockReader::new(reader, digests, self.block_map.algorithm()))
    }

    /// Opens a file without block validation.
    ///
    /// Block-mapped files are refused when content validation is on.
    pub fn open_raw_file(&self, path: &str) -> Result<EntryReader<'_>> {
        let (_, digests) = self.lookup(path)?;
        if digests.is_some() && self.options.validate_content {
            return Err(Error::InvalidParameter("block-mapped files must be read through validation"));
        }
        Ok(self.container.get_entry(path)?)
    }

    /// Reads a whole content file through validation.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut reader = self.open_validated_file(path)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(Error::from_io)?;
        Ok(data)
    }

    fn lookup(&self, path: &str) -> Result<(&ContainerEntry, Option<&FileDigestEntry>)> {
        let entry = self
            .container
            .entry(path)
            .ok_or_else(|| Error::FileNotFound { path: path.to_string() })?;
        if entry.is_directory {
            return Err(Error::InvalidParameter("path names a directory"));
        }
        Ok((entry, self.block_map.get(path)))
    }
}

impl<S> Package<S> {
    pub fn block_map(&self) -> &DigestTable { &self.block_map }

    pub fn container(&self) -> &Container<S> { &self.container }

    pub fn options(&self) -> &PackageOptions { &self.options }

    /// Content files in block-map order.
    pub fn files(&self) -> impl Iterator<Item = &FileDigestEntry> { self.block_map.files() }

    /// Footprint entries present in the container.
    pub fn footprint_files(&self) -> impl Iterator<Item = &ContainerEntry> {
        self.container.files().filter(|entry| !self.block_map.contains(&entry.path))
    }
}

/// Every listed file must exist with a matching size; every other file must be footprint.
fn check_coverage<S>(container: &Container<S>, block_map: &DigestTable, options: &PackageOptions) -> Result<()> {
    for file in block_map.files() {
        let entry = container.entry(file.path()).ok_or_else(|| {
            Error::InvalidBlockMap(format!("'{}' is listed in the block map but missing", file.path()))
        })?;
        if entry.is_directory {
            return Err(Error::InvalidBlockMap(format!("'{}' is a directory in the container", file.path())));
        }
        if entry.uncompressed_size != file.total_size() {
            return Err(Error::InvalidBlockMap(format!(
                "'{}' is {} bytes but its blocks cover {}",
                entry.path,
                entry.uncompressed_size,
                file.total_size()
            )));
        }
    }

    if let Some(orphan) = container
        .files()
        .find(|entry| !block_map.contains(&entry.path) && !options.is_footprint(&entry.path))
    {
        tracing::warn!(path = %orphan.path, "container entry outside the block map");
        return Err(Error::InvalidBlockMap(format!("'{}' is not covered by the block map", orphan.path)));
    }

    Ok(())
}
