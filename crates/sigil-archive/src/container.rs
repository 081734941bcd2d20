use std::collections::HashMap;
use std::io::{Read, Seek};

use zip::ZipArchive;
use zip::read::ZipFile;

use crate::entry::{CompressionMethod, ContainerEntry};
use crate::error::{Error, Result};
use crate::reader::EntryReader;
use crate::sanitize::{lookup_key, normalize_entry_name};
use crate::source::{ByteSource, SourceCursor};

const LOCAL_HEADER_SIGNATURE: [u8; 4] = *b"PK\x03\x04";
const LOCAL_HEADER_LEN: u64 = 30;

/// An opened container: a byte source plus its parsed entry index.
///
/// The index is built once by [`Container::open`] and never changes.
/// Readers returned by [`Container::get_entry`] borrow the container, so it
/// cannot be dropped while any of them is alive.
pub struct Container<S> {
    source: S,
    entries: Vec<ContainerEntry>,
    by_key: HashMap<String, usize>,
}

impl<S: ByteSource> Container<S> {
    /// Parses the container index and validates its layout.
    pub fn open(source: S) -> Result<Self> {
        let (entries, directory_offset) = read_index(&source)?;

        let mut by_key = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if by_key.insert(lookup_key(&entry.path), index).is_some() {
                return Err(Error::DuplicateEntry {
                    name: entry.path.clone(),
                });
            }
        }
        check_overlaps(&entries)?;
        check_unlisted(&source, &entries, &by_key, directory_offset)?;

        tracing::debug!(entries = entries.len(), directory_offset, "opened container");
        Ok(Self {
            source,
            entries,
            by_key,
        })
    }

    /// Opens an independent plaintext stream over the entry at `path`.
    ///
    /// Matching is case-insensitive. Nothing is read until the stream is.
    pub fn get_entry(&self, path: &str) -> Result<EntryReader<'_>> {
        let entry = self.entry(path).ok_or_else(|| Error::FileNotFound {
            path: path.to_string(),
        })?;
        if entry.is_directory {
            return Err(Error::IsDirectory {
                path: entry.path.clone(),
            });
        }
        Ok(EntryReader::new(&self.source, entry))
    }
}

impl<S> Container<S> {
    pub fn entry(&self, path: &str) -> Option<&ContainerEntry> {
        self.by_key.get(&lookup_key(path)).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, path: &str) -> bool { self.by_key.contains_key(&lookup_key(path)) }

    /// Entries in central-directory order.
    pub fn entries(&self) -> impl Iterator<Item = &ContainerEntry> { self.entries.iter() }

    /// File (non-directory) entries in central-directory order.
    pub fn files(&self) -> impl Iterator<Item = &ContainerEntry> {
        self.entries.iter().filter(|e| e.is_file())
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn source(&self) -> &S { &self.source }

    pub fn into_source(self) -> S { self.source }
}

/// Reads the central directory and every local header it points at.
///
/// Returns the entries in directory order plus the directory offset.
fn read_index(source: &dyn ByteSource) -> Result<(Vec<ContainerEntry>, u64)> {
    let mut archive = ZipArchive::new(SourceCursor::new(source))?;
    let directory_offset = archive.central_directory_start();

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        entries.push(resolve_entry(&file, directory_offset)?);
    }
    Ok((entries, directory_offset))
}

fn resolve_entry<R: Read + Seek>(file: &ZipFile<'_, R>, directory_offset: u64) -> Result<ContainerEntry> {
    let raw = std::str::from_utf8(file.name_raw()).map_err(|_| Error::invalid("entry name is not valid UTF-8"))?;
    let path = normalize_entry_name(raw)?;

    if file.encrypted() {
        return Err(Error::invalid("encrypted entries are not supported"));
    }
    let code = raw_method(file.compression());
    let method = CompressionMethod::from_raw(code).ok_or_else(|| Error::UnsupportedCompression {
        name: path.clone(),
        method: code,
    })?;
    if method == CompressionMethod::Stored && file.compressed_size() != file.size() {
        return Err(Error::invalid("stored entry sizes differ"));
    }

    let data_offset = file
        .data_start()
        .ok_or(Error::invalid("local header was not resolved"))?;
    let data_end = data_offset
        .checked_add(file.compressed_size())
        .ok_or(Error::invalid("entry size overflow"))?;
    if data_end > directory_offset {
        return Err(Error::invalid("entry data extends into central directory"));
    }

    Ok(ContainerEntry {
        is_directory: path.ends_with('/'),
        path,
        method,
        header_offset: file.header_start(),
        data_offset,
        compressed_size: file.compressed_size(),
        uncompressed_size: file.size(),
        crc32: file.crc32(),
    })
}

#[allow(deprecated)]
fn raw_method(method: zip::CompressionMethod) -> u16 { method.to_u16() }

/// Rejects entries whose `[local header, data end)` ranges intersect.
fn check_overlaps(entries: &[ContainerEntry]) -> Result<()> {
    let mut order: Vec<&ContainerEntry> = entries.iter().collect();
    order.sort_by_key(|e| e.header_offset);
    for pair in order.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if prev.data_end() > next.header_offset {
            return Err(Error::OverlappingEntries {
                name: next.path.clone(),
                other: prev.path.clone(),
            });
        }
    }
    Ok(())
}

/// Rejects local records that no indexed entry claims.
///
/// The zip index keeps only the last of several directory records sharing one
/// raw name, so a shadowed duplicate shows up as a local header at the start
/// of an otherwise unclaimed gap.
fn check_unlisted(
    source: &dyn ByteSource,
    entries: &[ContainerEntry],
    by_key: &HashMap<String, usize>,
    directory_offset: u64,
) -> Result<()> {
    let mut claimed: Vec<(u64, u64)> = entries.iter().map(|e| (e.header_offset, e.data_end())).collect();
    claimed.sort_unstable();

    let mut gap_start = 0;
    let mut gaps = Vec::new();
    for &(start, end) in &claimed {
        if start > gap_start {
            gaps.push(gap_start);
        }
        gap_start = gap_start.max(end);
    }
    if directory_offset > gap_start {
        gaps.push(gap_start);
    }

    for offset in gaps {
        let mut header = [0u8; LOCAL_HEADER_LEN as usize];
        if source.read_exact_at(offset, &mut header).is_err() || header[..4] != LOCAL_HEADER_SIGNATURE {
            continue;
        }
        let name_len = u16::from_le_bytes([header[26], header[27]]);
        let mut name = vec![0u8; usize::from(name_len)];
        if source.read_exact_at(offset + LOCAL_HEADER_LEN, &mut name).is_err() {
            return Err(Error::invalid("truncated local record before central directory"));
        }
        let name = String::from_utf8_lossy(&name).into_owned();
        tracing::warn!(offset, name = %name, "local record missing from index");
        if by_key.contains_key(&lookup_key(&name)) {
            return Err(Error::DuplicateEntry { name });
        }
        return Err(Error::invalid("local record missing from central directory"));
    }
    Ok(())
}
