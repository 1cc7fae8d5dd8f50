//! Programmatic producer of CFR blobs.
//!
//! Every `size` is computed bottom-up from the encoded children, so a tree
//! built without overrides is always well formed. The override hooks
//! (`with_size`, `with_data_length`, [`Node::Raw`]) exist to produce the
//! malformed inputs the decoder must survive.

use crate::encoding::{append_u32_le, append_u64_le};
use crate::flags::OptionFlags;
use crate::limits::VARBINARY_HEADER_SIZE;
use crate::tag::RecordTag;

/// Clamp an encoded length to the `u32` wire type.
fn wire_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Patch the `size` field of a record encoded at the start of `out[start..]`.
fn patch_size(out: &mut [u8], start: usize, size: u32) {
    out[start + 4..start + 8].copy_from_slice(&size.to_le_bytes());
}

/// Encode a raw record `{ tag, size, body }` with a correct size.
#[must_use]
pub fn raw_record(tag: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    append_u32_le(&mut out, tag);
    append_u32_le(&mut out, wire_len(8 + body.len()));
    out.extend_from_slice(body);
    out
}

// ---------------------------------------------------------------------------
// Varbinary fields
// ---------------------------------------------------------------------------

/// One varbinary field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    tag: RecordTag,
    payload: Vec<u8>,
    data_length: Option<u32>,
    padding: usize,
}

impl Field {
    /// NUL-terminated text payload.
    #[must_use]
    pub fn text(tag: RecordTag, text: &str) -> Self {
        let mut payload = Vec::with_capacity(text.len() + 1);
        payload.extend_from_slice(text.as_bytes());
        payload.push(0);
        Self::bytes(tag, payload)
    }

    /// Arbitrary payload bytes.
    #[must_use]
    pub fn bytes(tag: RecordTag, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            payload: payload.into(),
            data_length: None,
            padding: 0,
        }
    }

    /// Declare a `data_length` different from the payload actually written.
    #[must_use]
    pub const fn with_data_length(mut self, data_length: u32) -> Self {
        self.data_length = Some(data_length);
        self
    }

    /// Trailing alignment padding counted in `size`.
    #[must_use]
    pub const fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let size = VARBINARY_HEADER_SIZE + self.payload.len() + self.padding;
        append_u32_le(out, self.tag.raw());
        append_u32_le(out, wire_len(size));
        append_u32_le(
            out,
            self.data_length
                .unwrap_or_else(|| wire_len(self.payload.len())),
        );
        out.extend_from_slice(&self.payload);
        out.resize(out.len() + self.padding, 0);
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Common {
    object_id: u64,
    dependency_id: u64,
    flags: OptionFlags,
}

impl Common {
    fn encode_into(self, out: &mut Vec<u8>) {
        append_u64_le(out, self.object_id);
        append_u64_le(out, self.dependency_id);
        append_u32_le(out, self.flags.bits());
    }
}

/// An enum value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueBuilder {
    value: u32,
    label: Option<Field>,
    size: Option<u32>,
}

impl EnumValueBuilder {
    #[must_use]
    pub fn new(value: u32, label: &str) -> Self {
        Self {
            value,
            label: Some(Field::text(RecordTag::VarcharUiName, label)),
            size: None,
        }
    }

    /// Drop the mandatory label.
    #[must_use]
    pub fn without_label(mut self) -> Self {
        self.label = None;
        self
    }

    /// Override the declared record size.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        append_u32_le(out, RecordTag::EnumValue.raw());
        append_u32_le(out, 0);
        append_u32_le(out, self.value);
        if let Some(label) = &self.label {
            label.encode_into(out);
        }
        let size = self.size.unwrap_or_else(|| wire_len(out.len() - start));
        patch_size(out, start, size);
    }
}

/// A leaf option: numeric-like, string or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionBuilder {
    tag: RecordTag,
    common: Common,
    default_value: u32,
    default_field: Option<Field>,
    opt_name: Option<Field>,
    ui_name: Option<Field>,
    help: Option<Field>,
    values: Vec<EnumValueBuilder>,
    size: Option<u32>,
}

impl OptionBuilder {
    fn numeric(tag: RecordTag, name: &str, label: &str, default_value: u32) -> Self {
        Self {
            tag,
            common: Common::default(),
            default_value,
            default_field: None,
            opt_name: Some(Field::text(RecordTag::VarcharOptName, name)),
            ui_name: Some(Field::text(RecordTag::VarcharUiName, label)),
            help: None,
            values: Vec::new(),
            size: None,
        }
    }

    #[must_use]
    pub fn number(name: &str, label: &str, default_value: u32) -> Self {
        Self::numeric(RecordTag::OptionNumber, name, label, default_value)
    }

    #[must_use]
    pub fn boolean(name: &str, label: &str, default_value: bool) -> Self {
        Self::numeric(RecordTag::OptionBool, name, label, u32::from(default_value))
    }

    /// An enum option; add its values with [`Self::value`].
    #[must_use]
    pub fn enumeration(name: &str, label: &str, default_value: u32) -> Self {
        Self::numeric(RecordTag::OptionEnum, name, label, default_value)
    }

    #[must_use]
    pub fn varchar(name: &str, label: &str, default_value: &str) -> Self {
        Self {
            default_field: Some(Field::text(RecordTag::VarcharDefValue, default_value)),
            ..Self::numeric(RecordTag::OptionVarchar, name, label, 0)
        }
    }

    #[must_use]
    pub fn comment(label: &str) -> Self {
        Self {
            opt_name: None,
            ..Self::numeric(RecordTag::OptionComment, "", label, 0)
        }
    }

    #[must_use]
    pub const fn object_id(mut self, object_id: u64) -> Self {
        self.common.object_id = object_id;
        self
    }

    #[must_use]
    pub const fn dependency_id(mut self, dependency_id: u64) -> Self {
        self.common.dependency_id = dependency_id;
        self
    }

    #[must_use]
    pub const fn flags(mut self, flags: OptionFlags) -> Self {
        self.common.flags = flags;
        self
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(Field::text(RecordTag::VarcharUiHelptext, help));
        self
    }

    /// Append an enum value with a label.
    #[must_use]
    pub fn value(self, value: u32, label: &str) -> Self {
        self.enum_value(EnumValueBuilder::new(value, label))
    }

    #[must_use]
    pub fn enum_value(mut self, value: EnumValueBuilder) -> Self {
        self.values.push(value);
        self
    }

    /// Replace the string default field.
    #[must_use]
    pub fn default_field(mut self, field: Field) -> Self {
        self.default_field = Some(field);
        self
    }

    /// Replace the internal name field.
    #[must_use]
    pub fn opt_name_field(mut self, field: Field) -> Self {
        self.opt_name = Some(field);
        self
    }

    #[must_use]
    pub fn without_default_field(mut self) -> Self {
        self.default_field = None;
        self
    }

    #[must_use]
    pub fn without_opt_name(mut self) -> Self {
        self.opt_name = None;
        self
    }

    #[must_use]
    pub fn without_ui_name(mut self) -> Self {
        self.ui_name = None;
        self
    }

    /// Override the declared record size.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        append_u32_le(out, self.tag.raw());
        append_u32_le(out, 0);
        self.common.encode_into(out);
        if self.tag.is_numeric_option() {
            append_u32_le(out, self.default_value);
        }
        for field in [
            &self.default_field,
            &self.opt_name,
            &self.ui_name,
            &self.help,
        ]
        .into_iter()
        .flatten()
        {
            field.encode_into(out);
        }
        for value in &self.values {
            value.encode_into(out);
        }
        let size = self.size.unwrap_or_else(|| wire_len(out.len() - start));
        patch_size(out, start, size);
    }

    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

/// A child of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Form(CfrBuilder),
    Option(OptionBuilder),
    /// Pre-encoded bytes, written verbatim.
    Raw(Vec<u8>),
}

impl Node {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Form(form) => form.encode_into(out),
            Self::Option(option) => option.encode_into(out),
            Self::Raw(bytes) => out.extend_from_slice(bytes),
        }
    }
}

/// Builder for a form and, recursively, everything inside it.
///
/// ```
/// use cfr_types::builder::{CfrBuilder, OptionBuilder};
///
/// let blob = CfrBuilder::form("Main")
///     .option(OptionBuilder::number("Foo", "Foo", 7).object_id(1))
///     .build();
/// assert_eq!(blob.len(), 28 + 17 + 32 + 16 + 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfrBuilder {
    common: Common,
    ui_name: Option<Field>,
    children: Vec<Node>,
    size: Option<u32>,
}

impl CfrBuilder {
    #[must_use]
    pub fn form(label: &str) -> Self {
        Self {
            common: Common::default(),
            ui_name: Some(Field::text(RecordTag::VarcharUiName, label)),
            children: Vec::new(),
            size: None,
        }
    }

    #[must_use]
    pub const fn object_id(mut self, object_id: u64) -> Self {
        self.common.object_id = object_id;
        self
    }

    #[must_use]
    pub const fn dependency_id(mut self, dependency_id: u64) -> Self {
        self.common.dependency_id = dependency_id;
        self
    }

    #[must_use]
    pub const fn flags(mut self, flags: OptionFlags) -> Self {
        self.common.flags = flags;
        self
    }

    #[must_use]
    pub fn option(mut self, option: OptionBuilder) -> Self {
        self.children.push(Node::Option(option));
        self
    }

    #[must_use]
    pub fn subform(mut self, form: Self) -> Self {
        self.children.push(Node::Form(form));
        self
    }

    /// Append pre-encoded bytes as a child.
    #[must_use]
    pub fn raw(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.children.push(Node::Raw(bytes.into()));
        self
    }

    #[must_use]
    pub fn without_ui_name(mut self) -> Self {
        self.ui_name = None;
        self
    }

    /// Override the declared record size.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        append_u32_le(out, RecordTag::OptionForm.raw());
        append_u32_le(out, 0);
        self.common.encode_into(out);
        if let Some(name) = &self.ui_name {
            name.encode_into(out);
        }
        for child in &self.children {
            child.encode_into(out);
        }
        let size = self.size.unwrap_or_else(|| wire_len(out.len() - start));
        patch_size(out, start, size);
    }

    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}
