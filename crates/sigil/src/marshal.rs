use crate::error::{Error, Result};

/// Caller-supplied allocation capability for buffers handed out of the library.
///
/// Buffers are owned by the caller once returned; the library never frees them.
pub trait BufferAllocator: Send + Sync {
    /// Returns a zeroed buffer of exactly `len` bytes, or `None` on failure.
    fn allocate(&self, len: usize) -> Option<Box<[u8]>>;
}

/// Allocates from the global heap, reporting failure instead of aborting.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, len: usize) -> Option<Box<[u8]>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).ok()?;
        buf.resize(len, 0);
        Some(buf.into_boxed_slice())
    }
}

/// Copies `value` out as NUL-terminated UTF-16LE.
///
/// `out` must be `None` on entry and stays `None` for an empty string.
pub fn marshal_out_string(allocator: &dyn BufferAllocator, value: &str, out: &mut Option<Box<[u8]>>) -> Result<()> {
    check_out(out)?;
    if value.is_empty() {
        return Ok(());
    }
    let units: Vec<u16> = value.encode_utf16().collect();
    write_wide(allocator, &units, out)
}

/// Copies UTF-16 code units out as NUL-terminated UTF-16LE.
pub fn marshal_out_wide(allocator: &dyn BufferAllocator, value: &[u16], out: &mut Option<Box<[u8]>>) -> Result<()> {
    check_out(out)?;
    if value.is_empty() {
        return Ok(());
    }
    write_wide(allocator, value, out)
}

/// Copies raw bytes out. `out` must be `None` on entry.
///
/// Always allocates, so empty input yields an empty buffer rather than `None`.
pub fn marshal_out_bytes(allocator: &dyn BufferAllocator, data: &[u8], out: &mut Option<Box<[u8]>>) -> Result<()> {
    check_out(out)?;
    let mut buf = allocate(allocator, data.len())?;
    buf.copy_from_slice(data);
    *out = Some(buf);
    Ok(())
}

fn check_out(out: &Option<Box<[u8]>>) -> Result<()> {
    if out.is_some() {
        return Err(Error::InvalidParameter("output buffer must be empty"));
    }
    Ok(())
}

fn write_wide(allocator: &dyn BufferAllocator, units: &[u16], out: &mut Option<Box<[u8]>>) -> Result<()> {
    let len = units
        .len()
        .checked_add(1)
        .and_then(|n| n.checked_mul(2))
        .ok_or(Error::OutOfMemory { requested: usize::MAX })?;
    let mut buf = allocate(allocator, len)?;
    for (slot, unit) in buf.chunks_exact_mut(2).zip(units) {
        slot.copy_from_slice(&unit.to_le_bytes());
    }
    buf[len - 2..].fill(0);
    *out = Some(buf);
    Ok(())
}

fn allocate(allocator: &dyn BufferAllocator, len: usize) -> Result<Box<[u8]>> {
    match allocator.allocate(len) {
        Some(buf) if buf.len() == len => Ok(buf),
        _ => {
            tracing::warn!(requested = len, "buffer allocation failed");
            Err(Error::OutOfMemory { requested: len })
        }
    }
}
