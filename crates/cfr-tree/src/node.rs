//! Decoded, borrowed views of CFR records.
//!
//! Every `&'a str` and `&'a [u8]` here points into the caller's buffer.

use cfr_error::Result;
use cfr_types::{
    CommonFields, EnumValueHeader, FormHeader, NumericHeader, OptionFlags, RecordHeader,
    RecordTag, TextHeader, VarBinary, extract_varbinary, require_varbinary,
};
use serde::Serialize;

use crate::config::WalkConfig;

/// Which record kind a child tag introduces.
///
/// Decoded once per child through a total match; everything a form may not
/// contain lands in [`RecordKind::Unrecognized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Form,
    Numeric(NumericKind),
    Text(TextKind),
    Unrecognized(RecordTag),
}

impl RecordKind {
    #[must_use]
    pub const fn classify(tag: RecordTag) -> Self {
        match tag {
            RecordTag::OptionForm => Self::Form,
            RecordTag::OptionEnum => Self::Numeric(NumericKind::Enum),
            RecordTag::OptionNumber => Self::Numeric(NumericKind::Number),
            RecordTag::OptionBool => Self::Numeric(NumericKind::Bool),
            RecordTag::OptionVarchar => Self::Text(TextKind::Varchar),
            RecordTag::OptionComment => Self::Text(TextKind::Comment),
            RecordTag::EnumValue
            | RecordTag::VarcharOptName
            | RecordTag::VarcharUiName
            | RecordTag::VarcharUiHelptext
            | RecordTag::VarcharDefValue
            | RecordTag::Unknown(_) => Self::Unrecognized(tag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    Enum,
    Number,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Varchar,
    Comment,
}

/// A form, up to (not including) its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormView<'a> {
    pub offset: usize,
    pub size: u32,
    pub fields: CommonFields,
    /// UI name; forms share one namespace with option names.
    pub name: &'a str,
    /// 0 for the root of a tree.
    pub depth: usize,
    /// Offset of the first child record.
    pub children_start: usize,
    /// End of the form record.
    pub end: usize,
}

impl<'a> FormView<'a> {
    /// Decode the form at `offset`, which must end at or before `end`.
    pub fn decode(buf: &'a [u8], offset: usize, end: usize, depth: usize) -> Result<Self> {
        let header = FormHeader::parse(buf, RecordHeader::parse(buf, offset, end)?)?;
        let form_end = header.header.end()?;
        let mut cursor = header.fields_start();
        let name = require_varbinary(buf, &mut cursor, form_end, RecordTag::VarcharUiName)?;
        Ok(Self {
            offset,
            size: header.header.size,
            fields: header.fields,
            name: name.text()?,
            depth,
            children_start: cursor,
            end: form_end,
        })
    }

    #[must_use]
    pub const fn object_id(&self) -> u64 {
        self.fields.object_id
    }

    #[must_use]
    pub const fn flags(&self) -> OptionFlags {
        self.fields.flags
    }
}

/// One selectable value of an enum option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnumValue<'a> {
    pub offset: usize,
    pub value: u32,
    pub label: &'a str,
}

impl<'a> EnumValue<'a> {
    /// Decode an enum value record; its label must fill its size.
    pub fn decode(buf: &'a [u8], header: RecordHeader) -> Result<Self> {
        let fixed = EnumValueHeader::parse(buf, header)?;
        let mut cursor = fixed.fields_start();
        let label = require_varbinary(buf, &mut cursor, header.end()?, RecordTag::VarcharUiName)?;
        check_consumed(&header, cursor)?;
        Ok(Self {
            offset: header.offset,
            value: fixed.value,
            label: label.text()?,
        })
    }
}

/// A decoded ENUM, NUMBER or BOOL option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericOption<'a> {
    pub offset: usize,
    pub size: u32,
    pub kind: NumericKind,
    pub fields: CommonFields,
    pub default_value: u32,
    /// Internal name, the storage key.
    pub name: &'a str,
    pub ui_name: &'a str,
    pub help: Option<&'a str>,
    /// Enum values in declaration order; empty for NUMBER and BOOL.
    pub values: Vec<EnumValue<'a>>,
}

impl<'a> NumericOption<'a> {
    /// Decode a numeric option and, for ENUM, every trailing value record.
    pub fn decode(buf: &'a [u8], header: RecordHeader, kind: NumericKind) -> Result<Self> {
        let fixed = NumericHeader::parse(buf, header)?;
        let end = header.end()?;
        let mut cursor = fixed.fields_start();
        let name = require_varbinary(buf, &mut cursor, end, RecordTag::VarcharOptName)?.text()?;
        let ui_name = require_varbinary(buf, &mut cursor, end, RecordTag::VarcharUiName)?.text()?;
        let help = optional_text(buf, &mut cursor, end, RecordTag::VarcharUiHelptext)?;

        let mut values = Vec::new();
        if kind == NumericKind::Enum {
            while cursor < end {
                let value_header = RecordHeader::parse(buf, cursor, end)?;
                values.push(EnumValue::decode(buf, value_header)?);
                cursor = value_header.end()?;
            }
        }
        check_consumed(&header, cursor)?;

        Ok(Self {
            offset: header.offset,
            size: header.size,
            kind,
            fields: fixed.fields,
            default_value: fixed.default_value,
            name,
            ui_name,
            help,
            values,
        })
    }

    /// Whether `value` is one of the declared enum selectors.
    #[must_use]
    pub fn has_value(&self, value: u32) -> bool {
        self.values.iter().any(|candidate| candidate.value == value)
    }
}

/// A decoded VARCHAR or COMMENT option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOption<'a> {
    pub offset: usize,
    pub size: u32,
    pub kind: TextKind,
    pub fields: CommonFields,
    /// VARCHAR only: the raw default field, NUL included.
    pub default: Option<VarBinary<'a>>,
    /// VARCHAR only.
    pub name: Option<&'a str>,
    pub ui_name: &'a str,
    pub help: Option<&'a str>,
}

impl<'a> TextOption<'a> {
    /// Decode a text option.
    ///
    /// A VARCHAR default longer than `config.max_default_len` rejects the
    /// option with [`cfr_error::CfrError::FieldTooLong`].
    pub fn decode(
        buf: &'a [u8],
        header: RecordHeader,
        kind: TextKind,
        config: &WalkConfig,
    ) -> Result<Self> {
        let fixed = TextHeader::parse(buf, header)?;
        let end = header.end()?;
        let mut cursor = fixed.fields_start();

        let (default, name) = match kind {
            TextKind::Varchar => {
                let default =
                    require_varbinary(buf, &mut cursor, end, RecordTag::VarcharDefValue)?;
                if default.data_length > config.max_default_len {
                    return Err(cfr_error::CfrError::FieldTooLong {
                        offset: default.offset,
                        field_tag: default.tag.raw(),
                        length: default.data_length,
                        max: config.max_default_len,
                    });
                }
                let name =
                    require_varbinary(buf, &mut cursor, end, RecordTag::VarcharOptName)?.text()?;
                (Some(default), Some(name))
            }
            TextKind::Comment => (None, None),
        };
        let ui_name = require_varbinary(buf, &mut cursor, end, RecordTag::VarcharUiName)?.text()?;
        let help = optional_text(buf, &mut cursor, end, RecordTag::VarcharUiHelptext)?;
        check_consumed(&header, cursor)?;

        Ok(Self {
            offset: header.offset,
            size: header.size,
            kind,
            fields: fixed.fields,
            default,
            name,
            ui_name,
            help,
        })
    }

    /// The default as text, up to the first NUL.
    pub fn default_text(&self) -> Result<Option<&'a str>> {
        self.default.as_ref().map(VarBinary::text).transpose()
    }
}

fn optional_text<'a>(
    buf: &'a [u8],
    cursor: &mut usize,
    end: usize,
    tag: RecordTag,
) -> Result<Option<&'a str>> {
    extract_varbinary(buf, cursor, end, tag)?
        .map(|field| field.text())
        .transpose()
}

/// Post-condition of every record decode: the fields consumed exactly fill
/// the declared size.
pub(crate) fn check_consumed(header: &RecordHeader, cursor: usize) -> Result<()> {
    let consumed = cursor - header.offset;
    if consumed != header.len()? {
        return Err(cfr_error::CfrError::SizeMismatch {
            offset: header.offset,
            tag: header.tag.raw(),
            declared: header.size,
            consumed,
        });
    }
    Ok(())
}
