//! Record header and fixed-layout decoding.
//!
//! ```text
//! ┌────────────┬────────────┬──────────────────────────────┐
//! │ tag (u32)  │ size (u32) │ fixed fields, then children   │
//! └────────────┴────────────┴──────────────────────────────┘
//!              └── size covers everything, header included
//! ```
//!
//! Each decoder here checks that the record's declared `size` covers its own
//! fixed layout and that the record ends inside the region the caller owns.

use cfr_error::{CfrError, Result};

use crate::encoding::{read_u32_le_at, read_u64_le_at, u32_to_usize};
use crate::flags::OptionFlags;
use crate::limits::{
    ENUM_VALUE_FIXED_SIZE, FORM_FIXED_SIZE, NUMERIC_DEFAULT_OFFSET, NUMERIC_FIXED_SIZE,
    RECORD_HEADER_SIZE, TEXT_FIXED_SIZE,
};
use crate::tag::RecordTag;

/// The `{ tag, size }` pair every record starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Decoded tag.
    pub tag: RecordTag,
    /// Total record length including header and children.
    pub size: u32,
    /// Absolute offset of the record within its buffer.
    pub offset: usize,
}

impl RecordHeader {
    /// Parse the header at `offset`, requiring the whole record to end at or
    /// before `end`.
    pub fn parse(buf: &[u8], offset: usize, end: usize) -> Result<Self> {
        let raw_tag = read_u32_le_at(buf, offset, end)?;
        let size = read_u32_le_at(buf, offset + 4, end)?;
        let header = Self {
            tag: RecordTag::from_raw(raw_tag),
            size,
            offset,
        };
        header.require_min(RECORD_HEADER_SIZE)?;
        let record_end = header.end()?;
        if record_end > end.min(buf.len()) {
            return Err(CfrError::RecordOverrun {
                offset,
                tag: raw_tag,
                size,
                end: end.min(buf.len()),
            });
        }
        Ok(header)
    }

    /// Read only the tag at `offset` without validating the rest.
    ///
    /// Returns `None` when fewer than a full header's bytes remain before
    /// `end`.
    #[must_use]
    pub fn peek_tag(buf: &[u8], offset: usize, end: usize) -> Option<RecordTag> {
        let header_end = offset.checked_add(RECORD_HEADER_SIZE)?;
        if header_end > end.min(buf.len()) {
            return None;
        }
        read_u32_le_at(buf, offset, end).ok().map(RecordTag::from_raw)
    }

    /// Declared size as `usize`.
    pub fn len(&self) -> Result<usize> {
        u32_to_usize(self.size, self.offset)
    }

    /// Absolute end offset of the record.
    pub fn end(&self) -> Result<usize> {
        let len = self.len()?;
        self.offset
            .checked_add(len)
            .ok_or_else(|| CfrError::RecordOverrun {
                offset: self.offset,
                tag: self.tag.raw(),
                size: self.size,
                end: usize::MAX,
            })
    }

    /// Reject records whose declared size cannot hold `min` bytes.
    pub fn require_min(&self, min: usize) -> Result<()> {
        if self.len()? < min {
            return Err(CfrError::RecordTooSmall {
                offset: self.offset,
                tag: self.tag.raw(),
                size: self.size,
                min,
            });
        }
        Ok(())
    }

    /// Reject a header whose tag is not `expected`.
    pub fn expect_tag(&self, expected: RecordTag) -> Result<()> {
        if self.tag != expected {
            return Err(CfrError::UnexpectedTag {
                offset: self.offset,
                expected: expected.raw(),
                found: self.tag.raw(),
            });
        }
        Ok(())
    }
}

/// `{ object_id, dependency_id, flags }`, shared by forms and all options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonFields {
    /// Storage binding key, unique within a tree.
    pub object_id: u64,
    /// Object id of the option this one depends on (0 for none).
    pub dependency_id: u64,
    /// Storage and rendering flags.
    pub flags: OptionFlags,
}

impl CommonFields {
    fn parse(buf: &[u8], header: &RecordHeader) -> Result<Self> {
        let end = header.end()?;
        let base = header.offset + RECORD_HEADER_SIZE;
        Ok(Self {
            object_id: read_u64_le_at(buf, base, end)?,
            dependency_id: read_u64_le_at(buf, base + 8, end)?,
            flags: OptionFlags::from_bits_retain(read_u32_le_at(buf, base + 16, end)?),
        })
    }
}

/// Fixed part of a form record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormHeader {
    pub header: RecordHeader,
    pub fields: CommonFields,
}

impl FormHeader {
    pub const FIXED_SIZE: usize = FORM_FIXED_SIZE;

    /// Decode a form's fixed fields.
    pub fn parse(buf: &[u8], header: RecordHeader) -> Result<Self> {
        header.expect_tag(RecordTag::OptionForm)?;
        header.require_min(Self::FIXED_SIZE)?;
        let fields = CommonFields::parse(buf, &header)?;
        Ok(Self { header, fields })
    }

    /// Offset of the first varbinary field.
    #[must_use]
    pub const fn fields_start(&self) -> usize {
        self.header.offset + Self::FIXED_SIZE
    }
}

/// Fixed part of an ENUM, NUMBER or BOOL option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericHeader {
    pub header: RecordHeader,
    pub fields: CommonFields,
    /// Declared 32-bit default.
    pub default_value: u32,
}

impl NumericHeader {
    pub const FIXED_SIZE: usize = NUMERIC_FIXED_SIZE;

    /// Decode a numeric option's fixed fields.
    pub fn parse(buf: &[u8], header: RecordHeader) -> Result<Self> {
        if !header.tag.is_numeric_option() {
            return Err(CfrError::UnexpectedTag {
                offset: header.offset,
                expected: RecordTag::OptionNumber.raw(),
                found: header.tag.raw(),
            });
        }
        header.require_min(Self::FIXED_SIZE)?;
        let fields = CommonFields::parse(buf, &header)?;
        let default_value =
            read_u32_le_at(buf, header.offset + NUMERIC_DEFAULT_OFFSET, header.end()?)?;
        Ok(Self {
            header,
            fields,
            default_value,
        })
    }

    /// Absolute offset of the `default_value` field.
    #[must_use]
    pub const fn default_offset(&self) -> usize {
        self.header.offset + NUMERIC_DEFAULT_OFFSET
    }

    /// Offset of the first varbinary field.
    #[must_use]
    pub const fn fields_start(&self) -> usize {
        self.header.offset + Self::FIXED_SIZE
    }
}

/// Fixed part of an enum value record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValueHeader {
    pub header: RecordHeader,
    /// Selector stored when this value is chosen.
    pub value: u32,
}

impl EnumValueHeader {
    pub const FIXED_SIZE: usize = ENUM_VALUE_FIXED_SIZE;

    /// Decode an enum value's fixed fields.
    pub fn parse(buf: &[u8], header: RecordHeader) -> Result<Self> {
        header.expect_tag(RecordTag::EnumValue)?;
        header.require_min(Self::FIXED_SIZE)?;
        let value = read_u32_le_at(buf, header.offset + RECORD_HEADER_SIZE, header.end()?)?;
        Ok(Self { header, value })
    }

    /// Offset of the label field.
    #[must_use]
    pub const fn fields_start(&self) -> usize {
        self.header.offset + Self::FIXED_SIZE
    }
}

/// Fixed part of a VARCHAR or COMMENT option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextHeader {
    pub header: RecordHeader,
    pub fields: CommonFields,
}

impl TextHeader {
    pub const FIXED_SIZE: usize = TEXT_FIXED_SIZE;

    /// Decode a text option's fixed fields.
    pub fn parse(buf: &[u8], header: RecordHeader) -> Result<Self> {
        if !header.tag.is_text_option() {
            return Err(CfrError::UnexpectedTag {
                offset: header.offset,
                expected: RecordTag::OptionVarchar.raw(),
                found: header.tag.raw(),
            });
        }
        header.require_min(Self::FIXED_SIZE)?;
        let fields = CommonFields::parse(buf, &header)?;
        Ok(Self { header, fields })
    }

    /// Offset of the first varbinary field.
    #[must_use]
    pub const fn fields_start(&self) -> usize {
        self.header.offset + Self::FIXED_SIZE
    }
}
