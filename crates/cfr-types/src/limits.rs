//! Fixed layout sizes and platform limits of the CFR format.
//!
//! Every length here includes the 8-byte record header. Records are packed
//! with no padding between fields, so these are exact byte counts.

/// Common `{ tag: u32, size: u32 }` header.
pub const RECORD_HEADER_SIZE: usize = 8;

/// Varbinary header: record header plus `data_length: u32`.
pub const VARBINARY_HEADER_SIZE: usize = RECORD_HEADER_SIZE + 4;

/// Form: header, `object_id: u64`, `dependency_id: u64`, `flags: u32`.
pub const FORM_FIXED_SIZE: usize = RECORD_HEADER_SIZE + 8 + 8 + 4;

/// Numeric option: the form layout plus `default_value: u32`.
pub const NUMERIC_FIXED_SIZE: usize = FORM_FIXED_SIZE + 4;

/// Byte offset of `default_value` within a numeric option record.
pub const NUMERIC_DEFAULT_OFFSET: usize = FORM_FIXED_SIZE;

/// Enum value: header plus `value: u32`.
pub const ENUM_VALUE_FIXED_SIZE: usize = RECORD_HEADER_SIZE + 4;

/// String and comment options share the form layout.
pub const TEXT_FIXED_SIZE: usize = FORM_FIXED_SIZE;

/// Largest accepted `data_length` of a string option's default value.
pub const MAX_VARCHAR_DEFAULT_LEN: u32 = 0xFF;

/// Default bound on form nesting.
pub const MAX_FORM_DEPTH: usize = 32;
