use serde::{Deserialize, Serialize};

/// Menu materializer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// First question id of runtime components; `object_id` is added to it.
    pub component_start: u16,
    /// Question ids must stay below this label.
    pub component_end: u16,
    /// Stored in place of an empty string default.
    pub invalid_string: String,
    /// Mark every question reset-required.
    pub reset_required: bool,
    /// Emit a blank subtitle after each tree.
    pub tree_separator: bool,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            component_start: 0x1000,
            component_end: 0xefff,
            invalid_string: "INVALID".to_owned(),
            reset_required: true,
            tree_separator: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: MenuConfig =
            serde_json::from_str(r#"{ "invalid_string": "UNSET" }"#).unwrap();
        assert_eq!(config.invalid_string, "UNSET");
        assert_eq!(config.component_start, 0x1000);
        assert!(config.tree_separator);
    }
}
