//! Backing variable store contract and an in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cfr_error::{CfrError, Result};
use cfr_types::OptionFlags;
use parking_lot::Mutex;

use crate::policy::PolicyLock;

bitflags::bitflags! {
    /// Persistence and visibility of a stored variable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VariableAttributes: u32 {
        const NON_VOLATILE = 0x0000_0001;
        const BOOTSERVICE_ACCESS = 0x0000_0002;
        const RUNTIME_ACCESS = 0x0000_0004;
    }
}

impl VariableAttributes {
    /// Attributes a freshly provisioned option variable gets.
    #[must_use]
    pub fn for_option(flags: OptionFlags) -> Self {
        let mut attributes = Self::BOOTSERVICE_ACCESS;
        if !flags.contains(OptionFlags::VOLATILE) {
            attributes |= Self::NON_VOLATILE;
        }
        if flags.contains(OptionFlags::RUNTIME) {
            attributes |= Self::RUNTIME_ACCESS;
        }
        attributes
    }
}

/// Named, fixed-size variables in the option namespace.
pub trait VariableStore {
    /// Size of the stored value, or `None` if it does not exist.
    fn query_size(&self, name: &str) -> Result<Option<usize>>;

    /// Read exactly `len` bytes.
    ///
    /// A missing variable is [`CfrError::VariableNotFound`]; one of any
    /// other size is [`CfrError::StoreSizeMismatch`].
    fn get_exact(&self, name: &str, len: usize) -> Result<Vec<u8>>;

    /// Read the value and its attributes.
    fn get(&self, name: &str) -> Result<(Vec<u8>, VariableAttributes)>;

    /// Create or replace a variable. Fails with
    /// [`CfrError::WriteProtected`] once the name is locked.
    fn set(&self, name: &str, attributes: VariableAttributes, data: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Variable {
    data: Vec<u8>,
    attributes: VariableAttributes,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    variables: HashMap<String, Variable>,
    locked: HashSet<String>,
}

/// A variable store held in memory, with lock-now policy support.
///
/// Clones share the same variables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_locked(&self, name: &str) -> bool {
        self.inner.lock().locked.contains(name)
    }

    /// Stored names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().variables.keys().cloned().collect();
        names.sort();
        names
    }
}

impl VariableStore for MemoryStore {
    fn query_size(&self, name: &str) -> Result<Option<usize>> {
        Ok(self
            .inner
            .lock()
            .variables
            .get(name)
            .map(|variable| variable.data.len()))
    }

    fn get_exact(&self, name: &str, len: usize) -> Result<Vec<u8>> {
        let inner = self.inner.lock();
        let variable = inner
            .variables
            .get(name)
            .ok_or_else(|| CfrError::variable_not_found(name))?;
        if variable.data.len() != len {
            return Err(CfrError::StoreSizeMismatch {
                name: name.to_owned(),
                expected: len,
                actual: variable.data.len(),
            });
        }
        Ok(variable.data.clone())
    }

    fn get(&self, name: &str) -> Result<(Vec<u8>, VariableAttributes)> {
        self.inner
            .lock()
            .variables
            .get(name)
            .map(|variable| (variable.data.clone(), variable.attributes))
            .ok_or_else(|| CfrError::variable_not_found(name))
    }

    fn set(&self, name: &str, attributes: VariableAttributes, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.locked.contains(name) {
            return Err(CfrError::WriteProtected {
                name: name.to_owned(),
            });
        }
        inner.variables.insert(
            name.to_owned(),
            Variable {
                data: data.to_vec(),
                attributes,
            },
        );
        Ok(())
    }
}

impl PolicyLock for MemoryStore {
    fn lock_now(&self, name: &str) -> Result<()> {
        self.inner.lock().locked.insert(name.to_owned());
        Ok(())
    }
}
