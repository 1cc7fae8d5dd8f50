use cfr_types::limits::{MAX_FORM_DEPTH, MAX_VARCHAR_DEFAULT_LEN};
use serde::{Deserialize, Serialize};

/// Walker limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Largest accepted `data_length` of a VARCHAR default.
    pub max_default_len: u32,
    /// Deepest accepted form nesting; the root is depth 0.
    pub max_depth: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_default_len: MAX_VARCHAR_DEFAULT_LEN,
            max_depth: MAX_FORM_DEPTH,
        }
    }
}
