//! Pre-order tree walker.
//!
//! Children of a form are visited in declaration order. Every child is
//! framed by its own `{ tag, size }` header before anything inside it is
//! decoded, so a record that fails to decode is skipped by its declared
//! size and its siblings are unaffected. A child whose header itself is
//! unreadable leaves no way to find the next sibling: the rest of that
//! form is abandoned and the walk resumes in the parent.

use cfr_error::{CfrError, Result};
use cfr_types::{RecordHeader, RecordTag};
use tracing::{debug, error, warn};

use crate::config::WalkConfig;
use crate::node::{FormView, NumericOption, RecordKind, TextOption};
use crate::report::{Diagnostic, Severity, WalkReport};
use crate::tree::CfrTree;
use crate::visitor::Visitor;

/// Walks trees with a fixed configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Walker {
    config: WalkConfig,
}

impl Walker {
    #[must_use]
    pub const fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Walk one tree to completion.
    pub fn walk<'a, V: Visitor<'a> + ?Sized>(
        &self,
        tree: &CfrTree<'a>,
        visitor: &mut V,
    ) -> WalkReport {
        self.walk_tree(0, tree, visitor)
    }

    /// Walk every tree in enumeration order with one visitor.
    pub fn walk_all<'a, V: Visitor<'a> + ?Sized>(
        &self,
        trees: &[CfrTree<'a>],
        visitor: &mut V,
    ) -> WalkReport {
        let mut report = WalkReport::default();
        for (index, tree) in trees.iter().enumerate() {
            report.merge(self.walk_tree(index, tree, visitor));
        }
        report
    }

    fn walk_tree<'a, V: Visitor<'a> + ?Sized>(
        &self,
        index: usize,
        tree: &CfrTree<'a>,
        visitor: &mut V,
    ) -> WalkReport {
        let mut state = WalkState {
            buf: tree.buffer(),
            tree: index,
            config: &self.config,
            visitor,
            report: WalkReport::default(),
        };
        state.walk_form(*tree.root());
        debug!(
            tree = index,
            name = tree.name(),
            forms = state.report.forms,
            options = state.report.options,
            skipped = state.report.skipped,
            "walked CFR tree"
        );
        state.report
    }
}

/// Walk one tree with the default configuration.
pub fn walk<'a, V: Visitor<'a> + ?Sized>(tree: &CfrTree<'a>, visitor: &mut V) -> WalkReport {
    Walker::default().walk(tree, visitor)
}

/// Walk every tree with the default configuration.
pub fn walk_all<'a, V: Visitor<'a> + ?Sized>(
    trees: &[CfrTree<'a>],
    visitor: &mut V,
) -> WalkReport {
    Walker::default().walk_all(trees, visitor)
}

struct WalkState<'w, 'a, V: ?Sized> {
    buf: &'a [u8],
    tree: usize,
    config: &'w WalkConfig,
    visitor: &'w mut V,
    report: WalkReport,
}

impl<'a, V: Visitor<'a> + ?Sized> WalkState<'_, 'a, V> {
    fn walk_form(&mut self, form: FormView<'a>) {
        debug!(
            offset = form.offset,
            size = form.size,
            object_id = form.fields.object_id,
            depth = form.depth,
            name = form.name,
            "entering form"
        );
        if let Err(err) = self.visitor.on_form_enter(&form) {
            self.reject(form.offset, RecordTag::OptionForm.raw(), err);
            return;
        }
        self.report.forms += 1;

        self.walk_children(&form);

        if let Err(err) = self.visitor.on_form_exit(&form) {
            self.reject(form.offset, RecordTag::OptionForm.raw(), err);
        }
    }

    fn walk_children(&mut self, form: &FormView<'a>) {
        let mut cursor = form.children_start;
        while cursor < form.end {
            let next = RecordHeader::parse(self.buf, cursor, form.end)
                .and_then(|header| header.end().map(|end| (header, end)));
            let (header, child_end) = match next {
                Ok(framed) => framed,
                Err(err) => {
                    let tag = RecordHeader::peek_tag(self.buf, cursor, form.end)
                        .map_or(0, RecordTag::raw);
                    self.reject(cursor, tag, err);
                    return;
                }
            };
            self.visit_child(form, header);
            cursor = child_end;
        }
    }

    fn visit_child(&mut self, parent: &FormView<'a>, header: RecordHeader) {
        let result = match RecordKind::classify(header.tag) {
            RecordKind::Form => {
                let depth = parent.depth + 1;
                if depth > self.config.max_depth {
                    Err(CfrError::NestingTooDeep {
                        offset: header.offset,
                        max: self.config.max_depth,
                    })
                } else {
                    FormView::decode(self.buf, header.offset, parent.end, depth)
                        .map(|form| self.walk_form(form))
                }
            }
            RecordKind::Numeric(kind) => NumericOption::decode(self.buf, header, kind)
                .and_then(|option| self.emit_numeric(&option)),
            RecordKind::Text(kind) => TextOption::decode(self.buf, header, kind, self.config)
                .and_then(|option| self.emit_text(&option)),
            RecordKind::Unrecognized(tag) => {
                warn!(
                    offset = header.offset,
                    tag = tag.raw(),
                    size = header.size,
                    "skipping unrecognized CFR record"
                );
                self.report.skipped += 1;
                self.report.diagnostics.push(Diagnostic {
                    tree: self.tree,
                    offset: header.offset,
                    tag: tag.raw(),
                    severity: Severity::Warning,
                    error: CfrError::UnknownRecord {
                        offset: header.offset,
                        tag: tag.raw(),
                    },
                });
                Ok(())
            }
        };
        if let Err(err) = result {
            self.reject(header.offset, header.tag.raw(), err);
        }
    }

    fn emit_numeric(&mut self, option: &NumericOption<'a>) -> Result<()> {
        debug!(
            offset = option.offset,
            size = option.size,
            object_id = option.fields.object_id,
            name = option.name,
            values = option.values.len(),
            "decoded numeric option"
        );
        for value in &option.values {
            self.visitor.on_enum_value(option, value)?;
            self.report.enum_values += 1;
        }
        self.visitor.on_numeric_option(option)?;
        self.report.options += 1;
        Ok(())
    }

    fn emit_text(&mut self, option: &TextOption<'a>) -> Result<()> {
        debug!(
            offset = option.offset,
            size = option.size,
            object_id = option.fields.object_id,
            name = option.name.unwrap_or(option.ui_name),
            "decoded text option"
        );
        self.visitor.on_text_option(option)?;
        self.report.options += 1;
        Ok(())
    }

    fn reject(&mut self, offset: usize, tag: u32, err: CfrError) {
        if err.is_structural() {
            error!(offset, tag, error = %err, "malformed CFR record, skipping");
        } else {
            error!(offset, tag, error = %err, "rejected CFR record");
        }
        self.report.skipped += 1;
        self.report.diagnostics.push(Diagnostic {
            tree: self.tree,
            offset,
            tag,
            severity: Severity::Error,
            error: err,
        });
    }
}
