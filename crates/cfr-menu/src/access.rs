//! Config access: read and write option variables named by config strings.
//!
//! A config request names its variable with a `&NAME=<hex>&` element, where
//! `<hex>` spells the UTF-16 code units of the name, each as four
//! big-endian hex digits.

use cfr_error::{CfrError, Result};
use tracing::debug;

use crate::store::VariableStore;

const NAME_KEY: &str = "&NAME=";

/// Decode the variable name of a config request.
pub fn variable_name_from_request(request: &str) -> Result<String> {
    let start = request
        .find(NAME_KEY)
        .map(|index| index + NAME_KEY.len())
        .ok_or_else(|| CfrError::config_request("no &NAME= element"))?;
    let rest = &request[start..];
    let hex = rest
        .find('&')
        .map(|end| &rest[..end])
        .ok_or_else(|| CfrError::config_request("unterminated &NAME= element"))?;
    if hex.len() % 4 != 0 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(CfrError::config_request(format!(
            "name '{hex}' is not hex-encoded UTF-16"
        )));
    }

    let units = hex
        .as_bytes()
        .chunks_exact(4)
        .map(|chunk| {
            std::str::from_utf8(chunk)
                .ok()
                .and_then(|digits| u16::from_str_radix(digits, 16).ok())
                .ok_or_else(|| CfrError::config_request("bad hex digit in name"))
        })
        .collect::<Result<Vec<u16>>>()?;
    String::from_utf16(&units)
        .map_err(|_| CfrError::config_request(format!("name '{hex}' is not valid UTF-16")))
}

/// Hex spelling of `name` as it appears after `&NAME=`.
#[must_use]
pub fn encode_variable_name(name: &str) -> String {
    name.encode_utf16().map(|unit| format!("{unit:04x}")).collect()
}

/// Extract and route config blocks against a variable store.
#[derive(Clone, Copy)]
pub struct ConfigAccess<'c> {
    store: &'c dyn VariableStore,
}

impl<'c> ConfigAccess<'c> {
    #[must_use]
    pub const fn new(store: &'c dyn VariableStore) -> Self {
        Self { store }
    }

    /// The current contents of the requested variable.
    pub fn extract_config(&self, request: &str) -> Result<Vec<u8>> {
        let name = variable_name_from_request(request)?;
        let (data, _) = self.store.get(&name)?;
        debug!(name = %name, size = data.len(), "extracted config");
        Ok(data)
    }

    /// Write `data` back to the requested variable with its stored
    /// attributes. A locked variable is left as is and counts as success.
    pub fn route_config(&self, request: &str, data: &[u8]) -> Result<()> {
        let name = variable_name_from_request(request)?;
        let (current, attributes) = self.store.get(&name)?;
        if current.len() != data.len() {
            return Err(CfrError::StoreSizeMismatch {
                name,
                expected: current.len(),
                actual: data.len(),
            });
        }
        match self.store.set(&name, attributes, data) {
            Err(CfrError::WriteProtected { .. }) => {
                debug!(name = %name, "variable is locked, keeping stored value");
                Ok(())
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for ConfigAccess<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigAccess").finish_non_exhaustive()
    }
}
