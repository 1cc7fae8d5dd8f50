use cfr_error::CfrError;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Skipped by size without losing anything the walker understands.
    Warning,
    /// A record was rejected.
    Error,
}

/// One problem found while walking.
#[derive(Debug, Serialize)]
pub struct Diagnostic {
    /// Index of the tree in walk order.
    pub tree: usize,
    /// Offset of the offending record within its tree.
    pub offset: usize,
    /// Raw tag of the offending record, 0 if it could not be read.
    pub tag: u32,
    pub severity: Severity,
    #[serde(serialize_with = "serialize_display")]
    pub error: CfrError,
}

fn serialize_display<S: Serializer>(error: &CfrError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of a walk: what was visited and what was not.
#[derive(Debug, Default, Serialize)]
pub struct WalkReport {
    pub forms: usize,
    pub options: usize,
    pub enum_values: usize,
    /// Records skipped by size, for any reason.
    pub skipped: usize,
    /// In walk order.
    pub diagnostics: Vec<Diagnostic>,
}

impl WalkReport {
    /// No warnings and no errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }

    /// Fold another tree's report into this one.
    pub fn merge(&mut self, other: Self) {
        self.forms += other.forms;
        self.options += other.options;
        self.enum_values += other.enum_values;
        self.skipped += other.skipped;
        self.diagnostics.extend(other.diagnostics);
    }
}
