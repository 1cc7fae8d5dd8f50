//! Default value lookup by name.
//!
//! A restricted walk that decodes only what it needs to compare names and
//! stops at the first match. Forms and options share one namespace: a name
//! that matches a form (or a comment, by its UI name) is found but has no
//! default. Unlike the walker, the resolver does not skip malformed
//! records; structural errors propagate to the caller.

use cfr_error::{CfrError, Result};
use cfr_types::encoding::slice_at;
use cfr_types::{NumericHeader, RecordHeader, RecordTag, TextHeader, require_varbinary};
use serde::Serialize;
use tracing::debug;

use crate::config::WalkConfig;
use crate::node::{FormView, RecordKind, TextKind};
use crate::tree::CfrTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultKind {
    /// The 4-byte little-endian `default_value` of an ENUM, NUMBER or BOOL.
    Numeric,
    /// The whole payload of a VARCHAR default field, NUL included.
    Text,
}

/// A default value, borrowed from the tree's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultValue<'a> {
    pub bytes: &'a [u8],
    /// Offset of `bytes` within the tree's buffer.
    pub offset: usize,
    pub kind: DefaultKind,
}

impl<'a> DefaultValue<'a> {
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match (self.kind, self.bytes) {
            (DefaultKind::Numeric, &[b0, b1, b2, b3]) => Some(u32::from_le_bytes([b0, b1, b2, b3])),
            _ => None,
        }
    }

    /// Text up to the first NUL; `None` for numeric or non-UTF-8 defaults.
    #[must_use]
    pub fn as_text(&self) -> Option<&'a str> {
        if self.kind != DefaultKind::Text {
            return None;
        }
        let len = self
            .bytes
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(self.bytes.len());
        std::str::from_utf8(&self.bytes[..len]).ok()
    }
}

enum Lookup<'a> {
    Found(DefaultValue<'a>),
    NoDefault(&'static str),
}

/// Find the default of `option_name` under the default walk limits.
///
/// Trees are searched in order; with `form_name`, only trees whose root
/// form has that UI name. The first match wins.
pub fn find_default<'a>(
    trees: &[CfrTree<'a>],
    form_name: Option<&str>,
    option_name: &str,
) -> Result<DefaultValue<'a>> {
    find_default_with(&WalkConfig::default(), trees, form_name, option_name)
}

/// [`find_default`] with the nesting limit taken from `config`.
pub fn find_default_with<'a>(
    config: &WalkConfig,
    trees: &[CfrTree<'a>],
    form_name: Option<&str>,
    option_name: &str,
) -> Result<DefaultValue<'a>> {
    for tree in trees {
        if form_name.is_some_and(|name| name != tree.name()) {
            continue;
        }
        match search_form(tree.buffer(), tree.root(), option_name, config.max_depth)? {
            Some(Lookup::Found(value)) => {
                debug!(
                    tree = tree.name(),
                    name = option_name,
                    offset = value.offset,
                    len = value.bytes.len(),
                    "resolved default"
                );
                return Ok(value);
            }
            Some(Lookup::NoDefault(kind)) => return Err(CfrError::no_default(option_name, kind)),
            None => {}
        }
    }
    Err(CfrError::option_not_found(option_name))
}

/// The first tree whose root form is named `name`.
pub fn find_tree<'t, 'a>(trees: &'t [CfrTree<'a>], name: &str) -> Result<&'t CfrTree<'a>> {
    trees
        .iter()
        .find(|tree| tree.name() == name)
        .ok_or_else(|| CfrError::TreeNotFound {
            name: name.to_owned(),
        })
}

fn search_form<'a>(
    buf: &'a [u8],
    form: &FormView<'a>,
    name: &str,
    max_depth: usize,
) -> Result<Option<Lookup<'a>>> {
    if form.name == name {
        return Ok(Some(Lookup::NoDefault(RecordTag::OptionForm.kind_name())));
    }

    let mut cursor = form.children_start;
    while cursor < form.end {
        let header = RecordHeader::parse(buf, cursor, form.end)?;
        let found = match RecordKind::classify(header.tag) {
            RecordKind::Form => {
                let depth = form.depth + 1;
                if depth > max_depth {
                    return Err(CfrError::NestingTooDeep {
                        offset: header.offset,
                        max: max_depth,
                    });
                }
                let child = FormView::decode(buf, header.offset, form.end, depth)?;
                search_form(buf, &child, name, max_depth)?
            }
            RecordKind::Numeric(_) => match_numeric(buf, header, name)?,
            RecordKind::Text(kind) => match_text(buf, header, kind, name)?,
            RecordKind::Unrecognized(_) => None,
        };
        if found.is_some() {
            return Ok(found);
        }
        cursor = header.end()?;
    }
    Ok(None)
}

fn match_numeric<'a>(buf: &'a [u8], header: RecordHeader, name: &str) -> Result<Option<Lookup<'a>>> {
    let fixed = NumericHeader::parse(buf, header)?;
    let end = header.end()?;
    let mut cursor = fixed.fields_start();
    let opt_name = require_varbinary(buf, &mut cursor, end, RecordTag::VarcharOptName)?;
    if opt_name.text_bytes() != name.as_bytes() {
        return Ok(None);
    }
    let offset = fixed.default_offset();
    Ok(Some(Lookup::Found(DefaultValue {
        bytes: slice_at(buf, offset, 4, end)?,
        offset,
        kind: DefaultKind::Numeric,
    })))
}

fn match_text<'a>(
    buf: &'a [u8],
    header: RecordHeader,
    kind: TextKind,
    name: &str,
) -> Result<Option<Lookup<'a>>> {
    let fixed = TextHeader::parse(buf, header)?;
    let end = header.end()?;
    let mut cursor = fixed.fields_start();
    match kind {
        TextKind::Varchar => {
            let default = require_varbinary(buf, &mut cursor, end, RecordTag::VarcharDefValue)?;
            let opt_name = require_varbinary(buf, &mut cursor, end, RecordTag::VarcharOptName)?;
            if opt_name.text_bytes() != name.as_bytes() {
                return Ok(None);
            }
            Ok(Some(Lookup::Found(DefaultValue {
                bytes: default.data,
                offset: default.data_offset(),
                kind: DefaultKind::Text,
            })))
        }
        TextKind::Comment => {
            let ui_name = require_varbinary(buf, &mut cursor, end, RecordTag::VarcharUiName)?;
            if ui_name.text_bytes() != name.as_bytes() {
                return Ok(None);
            }
            Ok(Some(Lookup::NoDefault(header.tag.kind_name())))
        }
    }
}
