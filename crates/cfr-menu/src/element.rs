//! Menu elements handed to a forms renderer.

use std::fmt;

use cfr_types::OptionFlags;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Visibility {
    pub suppressed: bool,
    pub grayed_out: bool,
}

impl Visibility {
    #[must_use]
    pub const fn from_flags(flags: OptionFlags) -> Self {
        Self {
            suppressed: flags.contains(OptionFlags::SUPPRESS),
            grayed_out: flags.is_grayed_out(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QuestionFlags {
    pub read_only: bool,
    pub reset_required: bool,
}

/// Storage bound to one question; its id equals the question id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarStore {
    pub id: u16,
    pub name: String,
    pub size: usize,
}

/// The parts every editable element shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: u16,
    pub varstore: VarStore,
    pub label: String,
    pub help: Option<String>,
    pub flags: QuestionFlags,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneOfOption {
    pub value: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuElement {
    /// A form heading, or a blank separator.
    Subtitle {
        label: String,
        visibility: Visibility,
    },
    OneOf {
        question: Question,
        default: u32,
        options: Vec<OneOfOption>,
    },
    /// Decimal number entry.
    Numeric {
        question: Question,
        default: u32,
        minimum: u32,
        maximum: u32,
    },
    CheckBox {
        question: Question,
        default: bool,
    },
    String {
        question: Question,
        default: String,
        min_len: usize,
        max_len: usize,
    },
    /// Read-only text line.
    Text {
        label: String,
        help: Option<String>,
        visibility: Visibility,
    },
}

impl MenuElement {
    #[must_use]
    pub const fn question(&self) -> Option<&Question> {
        match self {
            Self::OneOf { question, .. }
            | Self::Numeric { question, .. }
            | Self::CheckBox { question, .. }
            | Self::String { question, .. } => Some(question),
            Self::Subtitle { .. } | Self::Text { .. } => None,
        }
    }

    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        match self {
            Self::Subtitle { visibility, .. } | Self::Text { visibility, .. } => *visibility,
            Self::OneOf { question, .. }
            | Self::Numeric { question, .. }
            | Self::CheckBox { question, .. }
            | Self::String { question, .. } => question.visibility,
        }
    }
}

impl fmt::Display for MenuElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subtitle { label, .. } => write!(f, "subtitle \"{label}\"")?,
            Self::OneOf {
                question,
                default,
                options,
            } => {
                write!(f, "oneof    {question} = {default} {{")?;
                for (index, option) in options.iter().enumerate() {
                    let sep = if index == 0 { "" } else { ", " };
                    write!(f, "{sep}{}: {}", option.value, option.label)?;
                }
                f.write_str("}")?;
            }
            Self::Numeric {
                question,
                default,
                minimum,
                maximum,
            } => write!(f, "numeric  {question} = {default} [{minimum}..={maximum}]")?,
            Self::CheckBox { question, default } => write!(f, "checkbox {question} = {default}")?,
            Self::String {
                question,
                default,
                max_len,
                ..
            } => write!(f, "string   {question} = \"{default}\" (max {max_len})")?,
            Self::Text { label, .. } => write!(f, "text     \"{label}\"")?,
        }
        let visibility = self.visibility();
        if visibility.suppressed {
            f.write_str(" [suppressed]")?;
        }
        if visibility.grayed_out {
            f.write_str(" [grayed out]")?;
        }
        if self.question().is_some_and(|question| question.flags.read_only) {
            f.write_str(" [read-only]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x} {} \"{}\"", self.id, self.varstore.name, self.label)
    }
}
