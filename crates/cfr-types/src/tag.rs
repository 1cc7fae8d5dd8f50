//! CFR record tags.
//!
//! Tags are the only guidance a walker has: every record starts with one,
//! and the set of values is closed. Anything else decodes to
//! [`RecordTag::Unknown`] so callers can skip it by size.

/// Raw tag values as they appear on the wire.
pub mod raw {
    pub const OPTION_FORM: u32 = 0x0101;
    pub const ENUM_VALUE: u32 = 0x0102;
    pub const OPTION_ENUM: u32 = 0x0103;
    pub const OPTION_NUMBER: u32 = 0x0104;
    pub const OPTION_BOOL: u32 = 0x0105;
    pub const OPTION_VARCHAR: u32 = 0x0106;
    pub const VARCHAR_OPT_NAME: u32 = 0x0107;
    pub const VARCHAR_UI_NAME: u32 = 0x0108;
    pub const VARCHAR_UI_HELPTEXT: u32 = 0x0109;
    pub const VARCHAR_DEF_VALUE: u32 = 0x010a;
    pub const OPTION_COMMENT: u32 = 0x010b;
}

/// A decoded record tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordTag {
    /// Form grouping nested forms and options.
    OptionForm,
    /// One selectable value of an enum option.
    EnumValue,
    /// Enum option (one-of selector).
    OptionEnum,
    /// Plain 32-bit number option.
    OptionNumber,
    /// Boolean option.
    OptionBool,
    /// String option.
    OptionVarchar,
    /// Varbinary: internal option name (storage key).
    VarcharOptName,
    /// Varbinary: display name or label.
    VarcharUiName,
    /// Varbinary: help text.
    VarcharUiHelptext,
    /// Varbinary: string option default.
    VarcharDefValue,
    /// Read-only comment line.
    OptionComment,
    /// Any value outside the enumerated set.
    Unknown(u32),
}

impl RecordTag {
    /// Decode a raw tag. Total: unknown values are preserved.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        match value {
            raw::OPTION_FORM => Self::OptionForm,
            raw::ENUM_VALUE => Self::EnumValue,
            raw::OPTION_ENUM => Self::OptionEnum,
            raw::OPTION_NUMBER => Self::OptionNumber,
            raw::OPTION_BOOL => Self::OptionBool,
            raw::OPTION_VARCHAR => Self::OptionVarchar,
            raw::VARCHAR_OPT_NAME => Self::VarcharOptName,
            raw::VARCHAR_UI_NAME => Self::VarcharUiName,
            raw::VARCHAR_UI_HELPTEXT => Self::VarcharUiHelptext,
            raw::VARCHAR_DEF_VALUE => Self::VarcharDefValue,
            raw::OPTION_COMMENT => Self::OptionComment,
            other => Self::Unknown(other),
        }
    }

    /// The wire value of this tag.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::OptionForm => raw::OPTION_FORM,
            Self::EnumValue => raw::ENUM_VALUE,
            Self::OptionEnum => raw::OPTION_ENUM,
            Self::OptionNumber => raw::OPTION_NUMBER,
            Self::OptionBool => raw::OPTION_BOOL,
            Self::OptionVarchar => raw::OPTION_VARCHAR,
            Self::VarcharOptName => raw::VARCHAR_OPT_NAME,
            Self::VarcharUiName => raw::VARCHAR_UI_NAME,
            Self::VarcharUiHelptext => raw::VARCHAR_UI_HELPTEXT,
            Self::VarcharDefValue => raw::VARCHAR_DEF_VALUE,
            Self::OptionComment => raw::OPTION_COMMENT,
            Self::Unknown(value) => value,
        }
    }

    /// Whether this tag introduces a varbinary field.
    #[must_use]
    pub const fn is_varbinary(self) -> bool {
        matches!(
            self,
            Self::VarcharOptName
                | Self::VarcharUiName
                | Self::VarcharUiHelptext
                | Self::VarcharDefValue
        )
    }

    /// ENUM, NUMBER and BOOL share the numeric layout.
    #[must_use]
    pub const fn is_numeric_option(self) -> bool {
        matches!(self, Self::OptionEnum | Self::OptionNumber | Self::OptionBool)
    }

    /// VARCHAR and COMMENT share the text layout.
    #[must_use]
    pub const fn is_text_option(self) -> bool {
        matches!(self, Self::OptionVarchar | Self::OptionComment)
    }

    /// Short lowercase name for diagnostics.
    #[must_use]
    pub const fn kind_name(self) -> &'static str {
        match self {
            Self::OptionForm => "form",
            Self::EnumValue => "enum value",
            Self::OptionEnum => "enum",
            Self::OptionNumber => "number",
            Self::OptionBool => "bool",
            Self::OptionVarchar => "varchar",
            Self::VarcharOptName => "option name",
            Self::VarcharUiName => "ui name",
            Self::VarcharUiHelptext => "help text",
            Self::VarcharDefValue => "default value",
            Self::OptionComment => "comment",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<u32> for RecordTag {
    fn from(value: u32) -> Self {
        Self::from_raw(value)
    }
}
