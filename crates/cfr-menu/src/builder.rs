//! Turns walker callbacks into menu elements and backing variables.
//!
//! For each option the builder derives a question id from its object id,
//! which must be unique within the tree. It then provisions the backing
//! variable on first run, applies the read-only lock policy and emits one
//! element. Nested forms flatten into sequential subtitles.

use std::collections::HashSet;

use cfr_error::{CfrError, Result};
use cfr_tree::{
    CfrTree, FormView, NumericKind, NumericOption, TextKind, TextOption, Visitor, WalkReport,
    Walker,
};
use cfr_types::OptionFlags;
use tracing::{debug, error, warn};

use crate::context::MenuContext;
use crate::element::{MenuElement, OneOfOption, Question, QuestionFlags, VarStore, Visibility};
use crate::store::VariableAttributes;

/// Fixed part of an encoded varstore opcode (header, id, GUID, size, NUL).
pub const VARSTORE_FIXED_SIZE: usize = 23;
/// Largest encodable varstore opcode.
pub const VARSTORE_MAX_SIZE: usize = 0x7f;

/// Result of one menu build.
#[derive(Debug, Default)]
pub struct Menu {
    pub elements: Vec<MenuElement>,
    /// Variables created by this build, in visit order.
    pub provisioned: Vec<String>,
    /// Existing variables that could not back their option as-is.
    pub storage_errors: Vec<CfrError>,
    pub report: WalkReport,
}

impl Menu {
    /// No walk diagnostics and no storage errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.report.is_clean() && self.storage_errors.is_empty()
    }
}

/// Build the menu for every tree, in order.
pub fn build_menu(ctx: MenuContext<'_>, walker: &Walker, trees: &[CfrTree<'_>]) -> Menu {
    let mut builder = MenuBuilder::new(ctx);
    let report = walker.walk_all(trees, &mut builder);
    let mut menu = builder.finish();
    menu.report = report;
    menu
}

/// A [`Visitor`] that materializes the menu.
#[derive(Debug)]
pub struct MenuBuilder<'c> {
    ctx: MenuContext<'c>,
    menu: Menu,
    warned_no_policy: bool,
    /// Question ids issued in the current tree.
    issued: HashSet<u16>,
}

impl<'c> MenuBuilder<'c> {
    #[must_use]
    pub fn new(ctx: MenuContext<'c>) -> Self {
        Self {
            ctx,
            menu: Menu::default(),
            warned_no_policy: false,
            issued: HashSet::new(),
        }
    }

    /// The elements and provisioning outcome so far; the report is empty.
    #[must_use]
    pub fn finish(self) -> Menu {
        self.menu
    }

    fn question_id(&self, object_id: u64) -> Result<u16> {
        let config = self.ctx.config;
        u64::from(config.component_start)
            .checked_add(object_id)
            .filter(|id| *id < u64::from(config.component_end))
            .and_then(|id| u16::try_from(id).ok())
            .ok_or(CfrError::QuestionIdOutOfRange { object_id })
    }

    fn question(
        &mut self,
        name: &str,
        object_id: u64,
        flags: OptionFlags,
        label: &str,
        help: Option<&str>,
        size: usize,
    ) -> Result<Question> {
        let id = self.question_id(object_id)?;
        let encoded = VARSTORE_FIXED_SIZE + name.len();
        if encoded > VARSTORE_MAX_SIZE {
            return Err(CfrError::NameTooLong {
                name: name.to_owned(),
                length: name.len(),
                max: VARSTORE_MAX_SIZE - VARSTORE_FIXED_SIZE,
            });
        }
        if !self.issued.insert(id) {
            return Err(CfrError::DuplicateObjectId {
                object_id,
                name: name.to_owned(),
            });
        }
        Ok(Question {
            id,
            varstore: VarStore {
                id,
                name: name.to_owned(),
                size,
            },
            label: label.to_owned(),
            help: help.map(str::to_owned),
            flags: QuestionFlags {
                read_only: flags.contains(OptionFlags::READONLY),
                reset_required: self.ctx.config.reset_required,
            },
            visibility: Visibility::from_flags(flags),
        })
    }

    /// Create the backing variable if absent, then apply the lock policy.
    fn provision(&mut self, name: &str, flags: OptionFlags, default: &[u8]) -> Result<()> {
        match self.ctx.store.query_size(name)? {
            None => {
                let attributes = VariableAttributes::for_option(flags);
                self.ctx.store.set(name, attributes, default)?;
                debug!(name, size = default.len(), ?attributes, "provisioned variable");
                self.menu.provisioned.push(name.to_owned());
            }
            Some(size) if size != default.len() => {
                let err = CfrError::StoreSizeMismatch {
                    name: name.to_owned(),
                    expected: default.len(),
                    actual: size,
                };
                error!(name, error = %err, "existing variable has the wrong size, leaving it");
                self.menu.storage_errors.push(err);
            }
            Some(_) => {}
        }

        if flags.contains(OptionFlags::READONLY) {
            match self.ctx.policy {
                Some(policy) => {
                    if let Err(err) = policy.lock_now(name) {
                        warn!(name, error = %err, "failed to lock variable");
                    }
                }
                None if !self.warned_no_policy => {
                    warn!("no variable policy service, read-only variables stay writable");
                    self.warned_no_policy = true;
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl<'a> Visitor<'a> for MenuBuilder<'_> {
    fn on_form_enter(&mut self, form: &FormView<'a>) -> Result<()> {
        if form.depth == 0 {
            self.issued.clear();
        } else {
            debug!(name = form.name, depth = form.depth, "nested form, producing subtitle");
        }
        self.menu.elements.push(MenuElement::Subtitle {
            label: form.name.to_owned(),
            visibility: Visibility::from_flags(form.fields.flags),
        });
        Ok(())
    }

    fn on_form_exit(&mut self, form: &FormView<'a>) -> Result<()> {
        if form.depth == 0 && self.ctx.config.tree_separator {
            self.menu.elements.push(MenuElement::Subtitle {
                label: String::new(),
                visibility: Visibility::default(),
            });
        }
        Ok(())
    }

    fn on_numeric_option(&mut self, option: &NumericOption<'a>) -> Result<()> {
        let default = option.default_value.to_le_bytes();
        let flags = option.fields.flags;
        let question = self.question(
            option.name,
            option.fields.object_id,
            flags,
            option.ui_name,
            option.help,
            default.len(),
        )?;
        self.provision(option.name, flags, &default)?;

        let element = match option.kind {
            NumericKind::Enum => {
                if !option.has_value(option.default_value) {
                    warn!(
                        name = option.name,
                        default = option.default_value,
                        "enum default is not one of its values"
                    );
                }
                MenuElement::OneOf {
                    question,
                    default: option.default_value,
                    options: option
                        .values
                        .iter()
                        .map(|value| OneOfOption {
                            value: value.value,
                            label: value.label.to_owned(),
                        })
                        .collect(),
                }
            }
            NumericKind::Number => MenuElement::Numeric {
                question,
                default: option.default_value,
                minimum: 0,
                maximum: u32::MAX,
            },
            NumericKind::Bool => MenuElement::CheckBox {
                question,
                default: option.default_value != 0,
            },
        };
        self.menu.elements.push(element);
        Ok(())
    }

    fn on_text_option(&mut self, option: &TextOption<'a>) -> Result<()> {
        let flags = option.fields.flags;
        if option.kind == TextKind::Comment {
            self.menu.elements.push(MenuElement::Text {
                label: option.ui_name.to_owned(),
                help: option.help.map(str::to_owned),
                visibility: Visibility::from_flags(flags),
            });
            return Ok(());
        }
        let (Some(name), Some(default_field)) = (option.name, option.default) else {
            return Err(CfrError::internal("string option decoded without name or default"));
        };

        // The variable spans `data_length` UTF-16 units: the text up to its
        // first NUL, then zero fill. The placeholder gets its length plus a
        // terminator.
        let (default, units) = if default_field.data_length <= 1 {
            let placeholder = self.ctx.config.invalid_string.clone();
            let units = placeholder.encode_utf16().count() + 1;
            (placeholder, units)
        } else {
            let text = default_field.text()?.to_owned();
            let units = default_field.data.len().max(text.encode_utf16().count() + 1);
            (text, units)
        };
        let mut stored: Vec<u8> = default
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        stored.resize(units * 2, 0);
        let max_len = units - 1;

        let question = self.question(
            name,
            option.fields.object_id,
            flags,
            option.ui_name,
            option.help,
            stored.len(),
        )?;
        self.provision(name, flags, &stored)?;
        self.menu.elements.push(MenuElement::String {
            question,
            default,
            min_len: 0,
            max_len,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfr_types::{CfrBuilder, Field, OptionBuilder, RecordTag};

    use crate::config::MenuConfig;
    use crate::store::{MemoryStore, VariableStore};

    fn build(store: &MemoryStore, config: &MenuConfig, blobs: &[Vec<u8>]) -> Menu {
        let trees: Vec<_> = blobs.iter().map(|blob| CfrTree::new(blob).unwrap()).collect();
        let ctx = MenuContext::new(store, config).with_policy(store);
        build_menu(ctx, &Walker::default(), &trees)
    }

    #[test]
    fn numeric_elements_and_storage() {
        let blob = CfrBuilder::form("Main")
            .option(OptionBuilder::number("Count", "Count", 7).object_id(1))
            .option(
                OptionBuilder::enumeration("Mode", "Mode", 1)
                    .object_id(2)
                    .value(0, "Off")
                    .value(1, "On"),
            )
            .option(OptionBuilder::boolean("Flag", "Flag", true).object_id(3))
            .build();
        let store = MemoryStore::new();
        let menu = build(&store, &MenuConfig::default(), &[blob]);

        assert!(menu.is_clean());
        assert_eq!(menu.elements.len(), 5);
        assert!(matches!(&menu.elements[0], MenuElement::Subtitle { label, .. } if label == "Main"));
        assert!(matches!(
            &menu.elements[1],
            MenuElement::Numeric { question, default: 7, .. } if question.id == 0x1001
        ));
        assert!(matches!(
            &menu.elements[2],
            MenuElement::OneOf { options, default: 1, .. } if options.len() == 2
        ));
        assert!(matches!(&menu.elements[3], MenuElement::CheckBox { default: true, .. }));
        assert!(matches!(&menu.elements[4], MenuElement::Subtitle { label, .. } if label.is_empty()));

        assert_eq!(menu.provisioned, ["Count", "Mode", "Flag"]);
        assert_eq!(store.get_exact("Count", 4).unwrap(), 7_u32.to_le_bytes());
        let (_, attributes) = store.get("Flag").unwrap();
        assert_eq!(
            attributes,
            VariableAttributes::BOOTSERVICE_ACCESS | VariableAttributes::NON_VOLATILE
        );
    }

    #[test]
    fn string_defaults_are_utf16_with_terminator() {
        let blob = CfrBuilder::form("Main")
            .option(OptionBuilder::varchar("Host", "Host", "ab").object_id(1))
            .option(OptionBuilder::varchar("Empty", "Empty", "").object_id(2))
            .option(OptionBuilder::comment("Hello").help("world"))
            .build();
        let store = MemoryStore::new();
        let menu = build(&store, &MenuConfig::default(), &[blob]);

        assert_eq!(
            store.get_exact("Host", 6).unwrap(),
            [b'a', 0, b'b', 0, 0, 0]
        );
        assert!(matches!(
            &menu.elements[1],
            MenuElement::String { default, max_len: 2, min_len: 0, .. } if default == "ab"
        ));
        let invalid: Vec<u8> = "INVALID"
            .encode_utf16()
            .chain([0])
            .flat_map(u16::to_le_bytes)
            .collect();
        assert_eq!(store.get_exact("Empty", invalid.len()).unwrap(), invalid);
        assert!(matches!(
            &menu.elements[2],
            MenuElement::String { max_len: 7, .. }
        ));
        assert!(matches!(
            &menu.elements[3],
            MenuElement::Text { label, help: Some(help), .. } if label == "Hello" && help == "world"
        ));
    }

    #[test]
    fn string_variable_spans_the_whole_default_field() {
        let blob = CfrBuilder::form("Main")
            .option(
                OptionBuilder::varchar("Pad", "Pad", "")
                    .object_id(1)
                    .default_field(Field::bytes(RecordTag::VarcharDefValue, *b"ab\0\0\0\0")),
            )
            .build();
        let store = MemoryStore::new();
        let menu = build(&store, &MenuConfig::default(), &[blob]);

        assert!(menu.is_clean());
        let mut expected = vec![b'a', 0, b'b', 0];
        expected.resize(12, 0);
        assert_eq!(store.get_exact("Pad", 12).unwrap(), expected);
        assert!(matches!(
            &menu.elements[1],
            MenuElement::String { default, max_len: 5, question, .. }
                if default == "ab" && question.varstore.size == 12
        ));
    }

    #[test]
    fn duplicate_object_ids_reject_the_later_option() {
        let first = CfrBuilder::form("Main")
            .option(OptionBuilder::number("A", "A", 1).object_id(5))
            .option(OptionBuilder::number("B", "B", 2).object_id(5))
            .option(OptionBuilder::number("C", "C", 3).object_id(6))
            .build();
        // ids are scoped to one tree
        let second = CfrBuilder::form("Other")
            .option(OptionBuilder::number("D", "D", 4).object_id(5))
            .build();
        let store = MemoryStore::new();
        let menu = build(&store, &MenuConfig::default(), &[first, second]);

        assert!(!menu.is_clean());
        assert_eq!(menu.report.errors(), 1);
        let diagnostic = &menu.report.diagnostics[0];
        assert_eq!(diagnostic.tree, 0);
        assert!(matches!(
            &diagnostic.error,
            CfrError::DuplicateObjectId { object_id: 5, name } if name == "B"
        ));
        let ids: Vec<u16> = menu
            .elements
            .iter()
            .filter_map(|element| element.question().map(|question| question.id))
            .collect();
        assert_eq!(ids, [0x1005, 0x1006, 0x1005]);
        assert_eq!(store.names(), ["A", "C", "D"]);
    }

    #[test]
    fn existing_variables_are_not_overwritten() {
        let store = MemoryStore::new();
        store
            .set("Count", VariableAttributes::NON_VOLATILE, &42_u32.to_le_bytes())
            .unwrap();
        store
            .set("Wide", VariableAttributes::NON_VOLATILE, &[0; 8])
            .unwrap();
        let blob = CfrBuilder::form("Main")
            .option(OptionBuilder::number("Count", "Count", 7).object_id(1))
            .option(OptionBuilder::number("Wide", "Wide", 7).object_id(2))
            .build();
        let menu = build(&store, &MenuConfig::default(), &[blob]);

        assert!(menu.provisioned.is_empty());
        assert_eq!(store.get_exact("Count", 4).unwrap(), 42_u32.to_le_bytes());
        assert_eq!(store.query_size("Wide").unwrap(), Some(8));
        assert!(matches!(
            menu.storage_errors.as_slice(),
            [CfrError::StoreSizeMismatch { expected: 4, actual: 8, .. }]
        ));
        assert!(!menu.is_clean());
        // the element is still shown
        assert_eq!(menu.elements.len(), 4);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let blob = CfrBuilder::form("Main")
            .option(OptionBuilder::number("Count", "Count", 7).object_id(1))
            .build();
        let store = MemoryStore::new();
        let first = build(&store, &MenuConfig::default(), &[blob.clone()]);
        let second = build(&store, &MenuConfig::default(), &[blob]);
        assert_eq!(first.provisioned, ["Count"]);
        assert!(second.provisioned.is_empty());
        assert_eq!(first.elements, second.elements);
    }

    #[test]
    fn read_only_options_are_locked() {
        let blob = CfrBuilder::form("Main")
            .option(
                OptionBuilder::number("Locked", "Locked", 1)
                    .object_id(1)
                    .flags(OptionFlags::READONLY | OptionFlags::VOLATILE),
            )
            .option(OptionBuilder::number("Open", "Open", 1).object_id(2))
            .build();
        let store = MemoryStore::new();
        let menu = build(&store, &MenuConfig::default(), &[blob]);

        assert!(store.is_locked("Locked"));
        assert!(!store.is_locked("Open"));
        let question = menu.elements[1].question().unwrap();
        assert!(question.flags.read_only);
        let (_, attributes) = store.get("Locked").unwrap();
        assert_eq!(attributes, VariableAttributes::BOOTSERVICE_ACCESS);
    }

    #[test]
    fn missing_policy_is_not_fatal() {
        let blob = CfrBuilder::form("Main")
            .option(
                OptionBuilder::boolean("A", "A", true)
                    .object_id(1)
                    .flags(OptionFlags::READONLY),
            )
            .option(
                OptionBuilder::boolean("B", "B", true)
                    .object_id(2)
                    .flags(OptionFlags::READONLY),
            )
            .build();
        let store = MemoryStore::new();
        let config = MenuConfig::default();
        let tree = CfrTree::new(&blob).unwrap();
        let menu = build_menu(MenuContext::new(&store, &config), &Walker::default(), &[tree]);
        assert!(menu.is_clean());
        assert!(!store.is_locked("A"));
        assert_eq!(menu.provisioned, ["A", "B"]);
    }

    #[test]
    fn out_of_range_and_long_names_are_rejected() {
        let long_name = "N".repeat(VARSTORE_MAX_SIZE - VARSTORE_FIXED_SIZE + 1);
        let blob = CfrBuilder::form("Main")
            .option(OptionBuilder::number("Far", "Far", 0).object_id(0xe000))
            .option(OptionBuilder::number(&long_name, "Long", 0).object_id(1))
            .option(OptionBuilder::number("Ok", "Ok", 0).object_id(2))
            .build();
        let store = MemoryStore::new();
        let menu = build(&store, &MenuConfig::default(), &[blob]);

        assert_eq!(menu.report.errors(), 2);
        assert!(matches!(
            menu.report.diagnostics[0].error,
            CfrError::QuestionIdOutOfRange { object_id: 0xe000 }
        ));
        assert!(matches!(
            menu.report.diagnostics[1].error,
            CfrError::NameTooLong { .. }
        ));
        assert_eq!(store.names(), ["Ok"]);
    }

    #[test]
    fn nested_forms_flatten_and_trees_are_separated() {
        let first = CfrBuilder::form("Main")
            .subform(
                CfrBuilder::form("Inner")
                    .flags(OptionFlags::GRAYOUT)
                    .option(OptionBuilder::boolean("B", "B", false).object_id(1)),
            )
            .build();
        let second = CfrBuilder::form("Second").build();
        let store = MemoryStore::new();
        let menu = build(&store, &MenuConfig::default(), &[first, second]);

        let labels: Vec<String> = menu
            .elements
            .iter()
            .map(|element| match element {
                MenuElement::Subtitle { label, .. } => format!("sub:{label}"),
                other => other.question().map_or_else(String::new, |q| q.varstore.name.clone()),
            })
            .collect();
        assert_eq!(labels, ["sub:Main", "sub:Inner", "B", "sub:", "sub:Second", "sub:"]);
        assert!(menu.elements[1].visibility().grayed_out);

        let config = MenuConfig {
            tree_separator: false,
            ..MenuConfig::default()
        };
        let blob = CfrBuilder::form("Only").build();
        let menu = build(&MemoryStore::new(), &config, &[blob]);
        assert_eq!(menu.elements.len(), 1);
    }
}
