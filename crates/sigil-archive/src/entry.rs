/// How an entry's bytes are stored in the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflated,
}

impl CompressionMethod {
    pub(crate) fn from_raw(method: u16) -> Option<Self> {
        match method {
            0 => Some(Self::Stored),
            8 => Some(Self::Deflated),
            _ => None,
        }
    }
}

/// A member of an opened container.
///
/// Entries are immutable once the container has been opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerEntry {
    /// Canonical archive-relative path, `/` separated.
    pub path: String,
    pub method: CompressionMethod,
    /// Offset of the local file header.
    pub header_offset: u64,
    /// Offset of the first stored/compressed data byte.
    pub data_offset: u64,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// CRC-32 as recorded in the central directory.
    pub crc32: u32,
    pub is_directory: bool,
}

impl ContainerEntry {
    /// One past the last stored/compressed data byte.
    pub fn data_end(&self) -> u64 { self.data_offset + self.compressed_size }

    pub fn is_file(&self) -> bool { !self.is_directory }

    pub fn is_compressed(&self) -> bool { self.method == CompressionMethod::Deflated }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, method: CompressionMethod) -> ContainerEntry {
        ContainerEntry {
            path: path.to_string(),
            method,
            header_offset: 10,
            data_offset: 50,
            compressed_size: 7,
            uncompressed_size: 12,
            crc32: 0,
            is_directory: path.ends_with('/'),
        }
    }

    #[test]
    fn compression_method_from_raw() {
        assert_eq!(CompressionMethod::from_raw(0), Some(CompressionMethod::Stored));
        assert_eq!(CompressionMethod::from_raw(8), Some(CompressionMethod::Deflated));
        assert_eq!(CompressionMethod::from_raw(12), None);
        assert_eq!(CompressionMethod::from_raw(99), None);
    }

    #[test]
    fn data_end_spans_compressed_bytes() {
        let e = entry("bin/tool", CompressionMethod::Deflated);
        assert_eq!(e.data_end(), 57);
        assert!(e.is_compressed());
        assert!(e.is_file());
    }

    #[test]
    fn directory_entry() {
        let e = entry("assets/", CompressionMethod::Stored);
        assert!(e.is_directory);
        assert!(!e.is_file());
        assert!(!e.is_compressed());
    }
}
