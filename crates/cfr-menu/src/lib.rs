//! Setup menu materialization for CFR form trees.
//!
//! [`MenuBuilder`] is a tree [`Visitor`](cfr_tree::Visitor) that turns each
//! option into a menu element and makes sure a backing variable exists for
//! it. Storage and the lock policy are collaborators behind the
//! [`VariableStore`] and [`PolicyLock`] traits; [`MemoryStore`] implements
//! both.

pub mod access;
pub mod builder;
pub mod config;
pub mod context;
pub mod element;
pub mod policy;
pub mod store;

pub use access::{ConfigAccess, encode_variable_name, variable_name_from_request};
pub use builder::{Menu, MenuBuilder, build_menu};
pub use config::MenuConfig;
pub use context::MenuContext;
pub use element::{
    MenuElement, OneOfOption, Question, QuestionFlags, VarStore, Visibility,
};
pub use policy::PolicyLock;
pub use store::{MemoryStore, VariableAttributes, VariableStore};
