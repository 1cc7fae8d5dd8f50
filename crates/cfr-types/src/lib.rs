//! CFR record model.
//!
//! A CFR blob is a tree of tagged, variable-length records. This crate
//! defines the tags and flags, the fixed layouts, bounds-checked
//! little-endian access, the varbinary field extractor, the HOB list
//! scanner that locates blobs, and a builder that produces them.

pub mod builder;
pub mod encoding;
pub mod flags;
pub mod guid;
pub mod header;
pub mod hob;
pub mod limits;
pub mod tag;
pub mod varbinary;

pub use builder::{CfrBuilder, EnumValueBuilder, Field, Node, OptionBuilder};
pub use flags::OptionFlags;
pub use guid::{Guid, SETUP_MENU_FORMSET_GUID};
pub use header::{
    CommonFields, EnumValueHeader, FormHeader, NumericHeader, RecordHeader, TextHeader,
};
pub use hob::{Hob, HobList};
pub use tag::RecordTag;
pub use varbinary::{VarBinary, extract_varbinary, require_varbinary};
