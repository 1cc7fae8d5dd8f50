//! Public API facade for the CFR setup menu decoder.
//!
//! Re-exports the record model, the tree walker and default resolver, and
//! the menu materializer so callers depend on one crate.

pub use cfr_error::{CfrError, ErrorCode, Result};
pub use cfr_menu::{
    ConfigAccess, MemoryStore, Menu, MenuBuilder, MenuConfig, MenuContext, MenuElement,
    PolicyLock, VariableAttributes, VariableStore, build_menu,
};
pub use cfr_tree::{
    CfrTree, DefaultKind, DefaultValue, Diagnostic, Severity, Visitor, WalkConfig, WalkReport,
    Walker, find_default, find_default_with, find_tree, walk, walk_all,
};
pub use cfr_types::{CfrBuilder, Guid, HobList, OptionBuilder, OptionFlags, RecordTag};

pub use cfr_menu;
pub use cfr_tree;
pub use cfr_types;

/// Decode every buffer as a tree, failing on the first malformed root.
pub fn trees_from_buffers<'a, B: AsRef<[u8]>>(buffers: &'a [B]) -> Result<Vec<CfrTree<'a>>> {
    buffers
        .iter()
        .map(|buffer| CfrTree::new(buffer.as_ref()))
        .collect()
}
