//! CFR form trees: decoding, walking and default lookup.
//!
//! A [`CfrTree`] is a read-only view over one externally owned buffer. The
//! [`Walker`] visits every record in declaration order and reports what it
//! had to skip; [`find_default`] resolves one option's default without
//! copying it.

pub mod config;
pub mod node;
pub mod report;
pub mod resolver;
pub mod tree;
pub mod visitor;
pub mod walker;

pub use config::WalkConfig;
pub use node::{
    EnumValue, FormView, NumericKind, NumericOption, RecordKind, TextKind, TextOption,
};
pub use report::{Diagnostic, Severity, WalkReport};
pub use resolver::{DefaultKind, DefaultValue, find_default, find_default_with, find_tree};
pub use tree::CfrTree;
pub use visitor::Visitor;
pub use walker::{Walker, walk, walk_all};
