//! Variable-length ("varbinary") fields.
//!
//! ```text
//! ┌────────────┬────────────┬───────────────────┬──────────────────┬─────────┐
//! │ tag (u32)  │ size (u32) │ data_length (u32) │ data[data_length]│ padding │
//! └────────────┴────────────┴───────────────────┴──────────────────┴─────────┘
//! ```
//!
//! Varbinary fields follow a record's fixed layout in a per-kind order. The
//! extractor behaves like a queue: it only consumes the next field when its
//! tag is the one the caller asks for, so optional fields can be tried
//! without disturbing the cursor.

use cfr_error::{CfrError, Result};
use tracing::debug;

use crate::encoding::{read_u32_le_at, slice_at, u32_to_usize};
use crate::header::RecordHeader;
use crate::limits::VARBINARY_HEADER_SIZE;
use crate::tag::RecordTag;

/// A borrowed view of one varbinary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarBinary<'a> {
    /// Field tag.
    pub tag: RecordTag,
    /// Absolute offset of the field header.
    pub offset: usize,
    /// Declared field size, header and padding included.
    pub size: u32,
    /// Payload length (includes the NUL terminator for text).
    pub data_length: u32,
    /// Payload bytes, exactly `data_length` long.
    pub data: &'a [u8],
}

impl<'a> VarBinary<'a> {
    /// Absolute offset of the payload.
    #[must_use]
    pub const fn data_offset(&self) -> usize {
        self.offset + VARBINARY_HEADER_SIZE
    }

    /// Payload up to (not including) the first NUL.
    #[must_use]
    pub fn text_bytes(&self) -> &'a [u8] {
        let len = self
            .data
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(self.data.len());
        &self.data[..len]
    }

    /// Payload decoded as NUL-terminated UTF-8 text.
    pub fn text(&self) -> Result<&'a str> {
        std::str::from_utf8(self.text_bytes()).map_err(|_| CfrError::InvalidText {
            offset: self.data_offset(),
        })
    }
}

/// Extract the next varbinary field if its tag is `expected`.
///
/// On a match, `cursor` advances by the field's declared `size`. On a
/// mismatch, or when fewer than a header's bytes remain before `end`,
/// returns `Ok(None)` and leaves `cursor` untouched. A matching field that
/// does not fit inside `end` is a structural error.
pub fn extract_varbinary<'a>(
    buf: &'a [u8],
    cursor: &mut usize,
    end: usize,
    expected: RecordTag,
) -> Result<Option<VarBinary<'a>>> {
    match RecordHeader::peek_tag(buf, *cursor, end) {
        Some(tag) if tag == expected => {}
        _ => return Ok(None),
    }

    let header = RecordHeader::parse(buf, *cursor, end)?;
    header.require_min(VARBINARY_HEADER_SIZE)?;
    let field_end = header.end()?;

    let data_length = read_u32_le_at(buf, header.offset + 8, field_end)?;
    let data_start = header.offset + VARBINARY_HEADER_SIZE;
    let data_len = u32_to_usize(data_length, data_start)?;
    let data = slice_at(buf, data_start, data_len, field_end)?;

    debug!(
        offset = header.offset,
        tag = header.tag.raw(),
        size = header.size,
        data_length,
        "extracted varbinary field"
    );

    *cursor = field_end;
    Ok(Some(VarBinary {
        tag: header.tag,
        offset: header.offset,
        size: header.size,
        data_length,
        data,
    }))
}

/// Extract a mandatory varbinary field; absence is a structural error.
pub fn require_varbinary<'a>(
    buf: &'a [u8],
    cursor: &mut usize,
    end: usize,
    expected: RecordTag,
) -> Result<VarBinary<'a>> {
    extract_varbinary(buf, cursor, end, expected)?.ok_or(CfrError::MissingField {
        offset: *cursor,
        field_tag: expected.raw(),
    })
}
