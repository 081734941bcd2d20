use std::collections::HashMap;

use sigil_archive::lookup_key;
use sigil_verify::HashAlgorithm;

use crate::error::{Error, Result};

/// One contiguous slice of a file's plaintext and its digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    index:  usize,
    digest: Vec<u8>,
    size:   u32,
}

impl BlockDescriptor {
    pub fn new(index: usize, digest: Vec<u8>, size: u32) -> Self { Self { index, digest, size } }

    pub fn index(&self) -> usize { self.index }

    pub fn digest(&self) -> &[u8] { &self.digest }

    /// Plaintext length of the block.
    pub fn size(&self) -> u32 { self.size }
}

/// Ordered block list for one file of the package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDigestEntry {
    path:          String,
    declared_size: Option<u64>,
    blocks:        Vec<BlockDescriptor>,
    total_size:    u64,
}

impl FileDigestEntry {
    /// Builds an entry, checking the block sequence against the declared size.
    pub fn new(path: String, declared_size: Option<u64>, blocks: Vec<BlockDescriptor>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(Error::invalid(format!("'{path}' has no blocks")));
        }

        let mut total = 0u64;
        for (position, block) in blocks.iter().enumerate() {
            if block.index != position {
                return Err(Error::invalid(format!("'{path}' has blocks out of order")));
            }
            if block.size == 0 {
                return Err(Error::invalid(format!("block {position} of '{path}' is empty")));
            }
            total = total
                .checked_add(u64::from(block.size))
                .ok_or_else(|| Error::invalid(format!("'{path}' block sizes overflow")))?;
        }

        if let Some(size) = declared_size
            && size != total
        {
            return Err(Error::invalid(format!(
                "'{path}' declares {size} bytes but its blocks cover {total}"
            )));
        }

        Ok(Self {
            path,
            declared_size,
            blocks,
            total_size: total,
        })
    }

    pub fn path(&self) -> &str { &self.path }

    pub fn declared_size(&self) -> Option<u64> { self.declared_size }

    pub fn blocks(&self) -> &[BlockDescriptor] { &self.blocks }

    /// Sum of all block lengths.
    pub fn total_size(&self) -> u64 { self.total_size }
}

/// Per-file, per-block digest table of a package.
///
/// Immutable once built and safe to share between readers.
#[derive(Clone, Debug)]
pub struct DigestTable {
    algorithm:  HashAlgorithm,
    block_size: Option<u32>,
    files:      Vec<FileDigestEntry>,
    by_key:     HashMap<String, usize>,
}

impl DigestTable {
    /// Builds a table; paths must be unique ignoring case.
    pub fn new(
        algorithm: HashAlgorithm,
        block_size: Option<u32>,
        files: Vec<FileDigestEntry>,
    ) -> Result<Self> {
        let mut by_key = HashMap::with_capacity(files.len());
        for (idx, file) in files.iter().enumerate() {
            if by_key.insert(lookup_key(&file.path), idx).is_some() {
                return Err(Error::invalid(format!("'{}' is listed twice", file.path)));
            }
            if let Some(block) = file.blocks.iter().find(|b| b.digest.len() != algorithm.digest_len()) {
                return Err(Error::invalid(format!(
                    "block {} of '{}' has a {}-byte digest, {algorithm} needs {}",
                    block.index,
                    file.path,
                    block.digest.len(),
                    algorithm.digest_len()
                )));
            }
        }

        Ok(Self {
            algorithm,
            block_size,
            files,
            by_key,
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm { self.algorithm }

    pub fn block_size(&self) -> Option<u32> { self.block_size }

    /// Case-insensitive lookup; `\` matches `/`.
    pub fn get(&self, path: &str) -> Option<&FileDigestEntry> {
        self.by_key.get(&lookup_key(path)).map(|&idx| &self.files[idx])
    }

    pub fn contains(&self, path: &str) -> bool { self.by_key.contains_key(&lookup_key(path)) }

    /// Files in descriptor order.
    pub fn files(&self) -> impl Iterator<Item = &FileDigestEntry> { self.files.iter() }

    pub fn len(&self) -> usize { self.files.len() }

    pub fn is_empty(&self) -> bool { self.files.is_empty() }
}
