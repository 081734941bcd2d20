use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use sigil_archive::normalize_entry_name;
use sigil_verify::HashAlgorithm;

use crate::error::{Error, Result};
use crate::model::{BlockDescriptor, DigestTable, FileDigestEntry};

pub const DEFAULT_MAX_DESCRIPTOR_BYTES: u64 = 16 * 1024 * 1024;
pub const DEFAULT_MAX_BLOCK_BYTES: u32 = 4 * 1024 * 1024;

/// Bounds applied while parsing a descriptor.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    pub max_descriptor_bytes: u64,
    pub max_block_bytes:      u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_descriptor_bytes: DEFAULT_MAX_DESCRIPTOR_BYTES,
            max_block_bytes:      DEFAULT_MAX_BLOCK_BYTES,
        }
    }
}

impl ParseOptions {
    pub fn max_descriptor_bytes(mut self, bytes: u64) -> Self {
        self.max_descriptor_bytes = bytes;
        self
    }

    pub fn max_block_bytes(mut self, bytes: u32) -> Self {
        self.max_block_bytes = bytes;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawDescriptor {
    hash_method: String,
    #[serde(default)]
    block_size:  Option<u32>,
    files:       Vec<RawFile>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    name:   String,
    #[serde(default)]
    size:   Option<u64>,
    blocks: Vec<RawBlock>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlock {
    hash: String,
    size: u32,
}

/// Reads and parses a descriptor; reads at most `max_descriptor_bytes + 1` bytes.
pub fn parse<R: Read>(reader: R, options: &ParseOptions) -> Result<DigestTable> {
    let mut buf = Vec::new();
    reader
        .take(options.max_descriptor_bytes.saturating_add(1))
        .read_to_end(&mut buf)?;
    parse_bytes(&buf, options)
}

/// Parses a descriptor held in memory.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<DigestTable> {
    if bytes.len() as u64 > options.max_descriptor_bytes {
        return Err(Error::invalid(format!(
            "descriptor exceeds {} bytes",
            options.max_descriptor_bytes
        )));
    }

    let raw: RawDescriptor =
        serde_json::from_slice(bytes).map_err(|e| Error::invalid(format!("malformed descriptor: {e}")))?;

    let algorithm = HashAlgorithm::from_name(&raw.hash_method).map_err(|e| Error::invalid(e.to_string()))?;

    if let Some(block_size) = raw.block_size
        && (block_size == 0 || block_size > options.max_block_bytes)
    {
        return Err(Error::invalid(format!("block size {block_size} is out of range")));
    }

    let files = raw
        .files
        .into_iter()
        .map(|file| convert_file(file, algorithm, raw.block_size, options))
        .collect::<Result<Vec<_>>>()?;

    let table = DigestTable::new(algorithm, raw.block_size, files)?;
    tracing::debug!(
        algorithm = %table.algorithm(),
        files = table.len(),
        "parsed block map"
    );
    Ok(table)
}

fn convert_file(
    raw: RawFile,
    algorithm: HashAlgorithm,
    block_size: Option<u32>,
    options: &ParseOptions,
) -> Result<FileDigestEntry> {
    if raw.name.is_empty() {
        return Err(Error::invalid("file with empty name"));
    }
    let path = normalize_entry_name(&raw.name).map_err(|e| Error::invalid(e.to_string()))?;
    if path.ends_with('/') {
        return Err(Error::invalid(format!("'{path}' names a directory")));
    }

    let last = raw.blocks.len().saturating_sub(1);
    let mut blocks = Vec::with_capacity(raw.blocks.len());
    for (index, block) in raw.blocks.into_iter().enumerate() {
        if block.size == 0 || block.size > options.max_block_bytes {
            return Err(Error::invalid(format!(
                "block {index} of '{path}' has out-of-range size {}",
                block.size
            )));
        }
        if let Some(uniform) = block_size {
            let fits = if index == last { block.size <= uniform } else { block.size == uniform };
            if !fits {
                return Err(Error::invalid(format!(
                    "block {index} of '{path}' does not match block size {uniform}"
                )));
            }
        }

        let digest = STANDARD
            .decode(block.hash.trim())
            .map_err(|e| Error::invalid(format!("block {index} of '{path}': bad digest encoding: {e}")))?;
        if digest.len() != algorithm.digest_len() {
            return Err(Error::invalid(format!(
                "block {index} of '{path}' has a {}-byte digest, {algorithm} needs {}",
                digest.len(),
                algorithm.digest_len()
            )));
        }
        blocks.push(BlockDescriptor::new(index, digest, block.size));
    }

    FileDigestEntry::new(path, raw.size, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_verify::Sha256Hasher;

    fn b64(data: &[u8]) -> String { STANDARD.encode(Sha256Hasher::digest(data)) }

    fn descriptor(files: &str) -> String {
        format!(r#"{{"hashMethod":"sha256","blockSize":4,"files":[{files}]}}"#)
    }

    #[test]
    fn parses_single_file() {
        let json = descriptor(&format!(
            r#"{{"name":"a.txt","size":5,"blocks":[{{"hash":"{}","size":4}},{{"hash":"{}","size":1}}]}}"#,
            b64(b"hell"),
            b64(b"o")
        ));
        let table = parse_bytes(json.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(table.algorithm(), HashAlgorithm::Sha256);
        assert_eq!(table.block_size(), Some(4));

        let entry = table.get("A.TXT").unwrap();
        assert_eq!(entry.total_size(), 5);
        assert_eq!(entry.blocks()[0].digest(), Sha256Hasher::digest(b"hell").as_slice());
    }

    #[test]
    fn parse_reads_from_stream() {
        let json = descriptor(&format!(r#"{{"name":"x","blocks":[{{"hash":"{}","size":3}}]}}"#, b64(b"abc")));
        let table = parse(json.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn accepts_uri_hash_method() {
        let json = format!(
            r#"{{"hashMethod":"http://www.w3.org/2001/04/xmlenc#sha256","files":[{{"name":"x","blocks":[{{"hash":"{}","size":9}}]}}]}}"#,
            b64(b"anything!")
        );
        let table = parse_bytes(json.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(table.block_size(), None);
    }

    #[test]
    fn size_mismatch_is_fatal() {
        let json = descriptor(&format!(r#"{{"name":"a","size":6,"blocks":[{{"hash":"{}","size":4}}]}}"#, b64(b"x")));
        assert!(matches!(
            parse_bytes(json.as_bytes(), &ParseOptions::default()),
            Err(Error::InvalidBlockMap(_))
        ));
    }

    #[test]
    fn wrong_digest_length_is_rejected() {
        let short = STANDARD.encode([0u8; 20]);
        let json = descriptor(&format!(r#"{{"name":"a","blocks":[{{"hash":"{short}","size":4}}]}}"#));
        assert!(parse_bytes(json.as_bytes(), &ParseOptions::default()).is_err());
    }

    #[test]
    fn rejects_structural_problems() {
        let opts = ParseOptions::default();
        let h = b64(b"x");
        let cases = [
            descriptor(r#"{"name":"","blocks":[]}"#),
            descriptor(r#"{"name":"a","blocks":[]}"#),
            descriptor(&format!(r#"{{"name":"a","blocks":[{{"hash":"{h}","size":0}}]}}"#)),
            descriptor(&format!(r#"{{"name":"../a","blocks":[{{"hash":"{h}","size":1}}]}}"#)),
            descriptor(&format!(r#"{{"name":"a","blocks":[{{"hash":"not base64!","size":1}}]}}"#)),
            descriptor(&format!(r#"{{"name":"a","blocks":[{{"hash":"{h}","size":2}},{{"hash":"{h}","size":2}}]}}"#)),
            descriptor(&format!(r#"{{"name":"a","blocks":[{{"hash":"{h}","size":5}}]}}"#)),
            descriptor(&format!(
                r#"{{"name":"a","blocks":[{{"hash":"{h}","size":1}}]}},{{"name":"A","blocks":[{{"hash":"{h}","size":1}}]}}"#
            )),
            r#"{"hashMethod":"md5","files":[]}"#.to_string(),
            r#"{"hashMethod":"sha256","files":[],"extra":1}"#.to_string(),
            r#"{"hashMethod":"sha256""#.to_string(),
        ];
        for case in cases {
            assert!(
                matches!(parse_bytes(case.as_bytes(), &opts), Err(Error::InvalidBlockMap(_))),
                "accepted: {case}"
            );
        }
    }

    #[test]
    fn oversized_descriptor_is_rejected() {
        let json = descriptor(&format!(r#"{{"name":"x","blocks":[{{"hash":"{}","size":3}}]}}"#, b64(b"abc")));
        let opts = ParseOptions::default().max_descriptor_bytes(16);
        assert!(matches!(parse(json.as_bytes(), &opts), Err(Error::InvalidBlockMap(_))));
    }

    #[test]
    fn block_cap_applies() {
        let json = format!(
            r#"{{"hashMethod":"sha256","files":[{{"name":"x","blocks":[{{"hash":"{}","size":100}}]}}]}}"#,
            b64(b"x")
        );
        let opts = ParseOptions::default().max_block_bytes(64);
        assert!(parse_bytes(json.as_bytes(), &opts).is_err());
    }
}
