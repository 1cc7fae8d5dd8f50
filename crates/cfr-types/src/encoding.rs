//! Little-endian field access with explicit bounds.
//!
//! Readers take the absolute offset of the field and the end of the region
//! the caller is allowed to read (the enclosing record's end), never just
//! the buffer length.

use cfr_error::{CfrError, Result};

fn checked_end(offset: usize, len: usize, end: usize, buf_len: usize) -> Result<usize> {
    let field_end = offset
        .checked_add(len)
        .ok_or_else(|| CfrError::truncated(offset, len, 0))?;
    let limit = end.min(buf_len);
    if field_end > limit {
        return Err(CfrError::truncated(
            offset,
            len,
            limit.saturating_sub(offset),
        ));
    }
    Ok(field_end)
}

/// Read a `u32` at `offset`, which must lie wholly before `end`.
pub fn read_u32_le_at(buf: &[u8], offset: usize, end: usize) -> Result<u32> {
    let field_end = checked_end(offset, 4, end, buf.len())?;
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(&buf[offset..field_end]);
    Ok(u32::from_le_bytes(raw))
}

/// Read a `u64` at `offset`, which must lie wholly before `end`.
pub fn read_u64_le_at(buf: &[u8], offset: usize, end: usize) -> Result<u64> {
    let field_end = checked_end(offset, 8, end, buf.len())?;
    let mut raw = [0_u8; 8];
    raw.copy_from_slice(&buf[offset..field_end]);
    Ok(u64::from_le_bytes(raw))
}

/// Borrow `len` bytes at `offset`, which must lie wholly before `end`.
pub fn slice_at(buf: &[u8], offset: usize, len: usize, end: usize) -> Result<&[u8]> {
    let field_end = checked_end(offset, len, end, buf.len())?;
    Ok(&buf[offset..field_end])
}

pub fn append_u16_le(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn append_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn append_u64_le(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Convert a `u32` length field to `usize`.
pub fn u32_to_usize(value: u32, offset: usize) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        CfrError::internal(format!(
            "length {value} at offset {offset:#x} does not fit in usize"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_u32_le_at(&buf, 0, 8).unwrap(), 0x0403_0201);
        assert_eq!(read_u64_le_at(&buf, 0, 8).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn respects_region_end_not_buffer_len() {
        let buf = [0_u8; 16];
        let err = read_u32_le_at(&buf, 6, 8).unwrap_err();
        assert!(matches!(
            err,
            CfrError::Truncated {
                offset: 6,
                needed: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn region_end_is_clamped_to_buffer() {
        let buf = [0_u8; 4];
        assert!(read_u64_le_at(&buf, 0, 64).is_err());
        assert!(slice_at(&buf, 2, 4, 64).is_err());
        assert_eq!(slice_at(&buf, 1, 3, 64).unwrap().len(), 3);
    }

    #[test]
    fn offset_overflow_is_truncation() {
        let buf = [0_u8; 4];
        assert!(read_u32_le_at(&buf, usize::MAX - 1, usize::MAX).is_err());
    }

    #[test]
    fn append_helpers() {
        let mut buf = Vec::new();
        append_u16_le(&mut buf, 0xBEEF);
        append_u32_le(&mut buf, 0x0102_0304);
        append_u64_le(&mut buf, 1);
        assert_eq!(buf.len(), 14);
        assert_eq!(&buf[..2], &[0xEF, 0xBE]);
        assert_eq!(&buf[2..6], &[0x04, 0x03, 0x02, 0x01]);
    }
}
