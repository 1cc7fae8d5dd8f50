use thiserror::Error;

/// Primary error type for CFR decoding and menu materialization.
///
/// Variants are grouped the way the decoder treats them: structural
/// violations abort the enclosing record, oversized fields reject one
/// option, lookup misses are ordinary outcomes of the default resolver,
/// and store errors come from the backing variable store.
#[derive(Error, Debug)]
pub enum CfrError {
    // === Structural Errors ===
    /// A read would cross the end of the enclosing record or buffer.
    #[error("truncated record at offset {offset:#x}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A record's declared size is smaller than its own fixed layout.
    #[error("record tag {tag:#06x} at offset {offset:#x} declares size {size}, minimum is {min}")]
    RecordTooSmall {
        offset: usize,
        tag: u32,
        size: u32,
        min: usize,
    },

    /// A record's declared size runs past the end of its parent.
    #[error("record tag {tag:#06x} at offset {offset:#x} of size {size} overruns parent end {end:#x}")]
    RecordOverrun {
        offset: usize,
        tag: u32,
        size: u32,
        end: usize,
    },

    /// Bytes consumed while decoding a record differ from its declared size.
    #[error("record tag {tag:#06x} at offset {offset:#x}: consumed {consumed} bytes, declared {declared}")]
    SizeMismatch {
        offset: usize,
        tag: u32,
        declared: u32,
        consumed: usize,
    },

    /// A mandatory variable-length field is absent.
    #[error("record at offset {offset:#x} is missing mandatory field {field_tag:#06x}")]
    MissingField { offset: usize, field_tag: u32 },

    /// A record of the wrong kind sits where a specific kind is required.
    #[error("expected tag {expected:#06x} at offset {offset:#x}, found {found:#06x}")]
    UnexpectedTag {
        offset: usize,
        expected: u32,
        found: u32,
    },

    /// A text field is not valid UTF-8.
    #[error("text field at offset {offset:#x} is not valid UTF-8")]
    InvalidText { offset: usize },

    /// Forms nest deeper than the configured limit.
    #[error("form at offset {offset:#x} nests deeper than {max} levels")]
    NestingTooDeep { offset: usize, max: usize },

    // === Skipped Records ===
    /// A record tag the walker does not know; the record is skipped by size.
    #[error("unrecognized record tag {tag:#06x} at offset {offset:#x}")]
    UnknownRecord { offset: usize, tag: u32 },

    // === Rejected Options ===
    /// A variable-length field exceeds its platform maximum.
    #[error("field {field_tag:#06x} at offset {offset:#x} has length {length}, maximum is {max}")]
    FieldTooLong {
        offset: usize,
        field_tag: u32,
        length: u32,
        max: u32,
    },

    /// An option name cannot be encoded as a variable store opcode.
    #[error("option name '{name}' is too long for a variable store ({length} bytes, max {max})")]
    NameTooLong {
        name: String,
        length: usize,
        max: usize,
    },

    /// The derived question id falls outside the runtime component range.
    #[error("object id {object_id} maps outside the runtime component range")]
    QuestionIdOutOfRange { object_id: u64 },

    /// Two options in one tree share an object id, and so a storage binding.
    #[error("object id {object_id} of '{name}' is already bound in this tree")]
    DuplicateObjectId { object_id: u64, name: String },

    // === Lookup Misses ===
    /// No tree contains an option with this name.
    #[error("no option named '{name}'")]
    OptionNotFound { name: String },

    /// The name exists but names a record kind without a default value.
    #[error("'{name}' is a {kind} and has no default value")]
    NoDefault { name: String, kind: &'static str },

    /// No tree is named as requested.
    #[error("no form tree named '{name}'")]
    TreeNotFound { name: String },

    /// A HOB list carries no GUID extension HOB with this GUID.
    #[error("no CFR HOB with GUID {guid}")]
    HobNotFound { guid: String },

    // === Variable Store Errors ===
    /// The backing variable does not exist.
    #[error("variable '{name}' not found")]
    VariableNotFound { name: String },

    /// The backing variable exists with a different size than expected.
    #[error("variable '{name}' has size {actual}, expected {expected}")]
    StoreSizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The backing variable is locked read-only.
    #[error("variable '{name}' is write protected")]
    WriteProtected { name: String },

    /// A configuration request string could not be decoded.
    #[error("malformed config request: {detail}")]
    InvalidConfigRequest { detail: String },

    // === Input Errors ===
    /// Text is not a canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` GUID.
    #[error("invalid GUID '{text}'")]
    InvalidGuid { text: String },

    // === Other ===
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Firmware status codes for callers that speak the boot-services ABI.
///
/// Numeric values are the low bits of the corresponding `EFI_STATUS`
/// error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// Parameter was invalid.
    InvalidParameter = 2,
    /// Operation is not supported.
    Unsupported = 3,
    /// Buffer size was wrong for the request.
    BadBufferSize = 4,
    /// Physical device reported an error.
    DeviceError = 7,
    /// Target is write protected.
    WriteProtected = 8,
    /// Data structures are corrupted.
    VolumeCorrupted = 10,
    /// Item was not found.
    NotFound = 14,
    /// Operation was aborted.
    Aborted = 21,
    /// Protocol or format error.
    ProtocolError = 24,
}

impl CfrError {
    /// Map this error to a firmware status code.
    #[allow(clippy::match_same_arms)]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Truncated { .. }
            | Self::RecordTooSmall { .. }
            | Self::RecordOverrun { .. }
            | Self::SizeMismatch { .. }
            | Self::MissingField { .. }
            | Self::UnexpectedTag { .. }
            | Self::InvalidText { .. }
            | Self::NestingTooDeep { .. } => ErrorCode::VolumeCorrupted,
            Self::FieldTooLong { .. } | Self::NameTooLong { .. } => ErrorCode::BadBufferSize,
            Self::UnknownRecord { .. } | Self::QuestionIdOutOfRange { .. } => {
                ErrorCode::Unsupported
            }
            Self::DuplicateObjectId { .. } => ErrorCode::InvalidParameter,
            Self::OptionNotFound { .. }
            | Self::NoDefault { .. }
            | Self::TreeNotFound { .. }
            | Self::HobNotFound { .. }
            | Self::VariableNotFound { .. } => ErrorCode::NotFound,
            Self::StoreSizeMismatch { .. } => ErrorCode::ProtocolError,
            Self::WriteProtected { .. } => ErrorCode::WriteProtected,
            Self::InvalidConfigRequest { .. } | Self::InvalidGuid { .. } => {
                ErrorCode::InvalidParameter
            }
            Self::Io(_) => ErrorCode::DeviceError,
            Self::Internal(_) => ErrorCode::Aborted,
        }
    }

    /// Whether the buffer itself is malformed.
    ///
    /// Structural errors abort the enclosing record and its subtree; the
    /// walker resumes at the next sibling using the parent's bookkeeping.
    pub const fn is_structural(&self) -> bool {
        matches!(self.error_code(), ErrorCode::VolumeCorrupted)
    }

    /// Whether only the current option is rejected while the record itself
    /// is well framed.
    pub const fn is_record_local(&self) -> bool {
        matches!(
            self,
            Self::FieldTooLong { .. }
                | Self::NameTooLong { .. }
                | Self::QuestionIdOutOfRange { .. }
                | Self::DuplicateObjectId { .. }
        )
    }

    /// Whether this is an expected miss from a default lookup rather than
    /// a fault.
    pub const fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            Self::OptionNotFound { .. }
                | Self::NoDefault { .. }
                | Self::TreeNotFound { .. }
                | Self::HobNotFound { .. }
        )
    }

    /// Get the process exit code for this error (for CLI use).
    ///
    /// Lookup misses and malformed input exit 1, I/O failures 3, anything
    /// else 4. Exit 2 stays reserved for usage errors.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 3,
            _ if self.is_lookup_miss() || self.is_structural() => 1,
            _ if matches!(self.error_code(), ErrorCode::InvalidParameter) => 1,
            _ => 4,
        }
    }

    /// Create a truncation error.
    pub const fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        Self::Truncated {
            offset,
            needed,
            available,
        }
    }

    /// Create an option-not-found miss.
    pub fn option_not_found(name: impl Into<String>) -> Self {
        Self::OptionNotFound { name: name.into() }
    }

    /// Create a found-but-no-default miss.
    pub fn no_default(name: impl Into<String>, kind: &'static str) -> Self {
        Self::NoDefault {
            name: name.into(),
            kind,
        }
    }

    /// Create a variable-not-found error.
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        Self::VariableNotFound { name: name.into() }
    }

    /// Create a config request error.
    pub fn config_request(detail: impl Into<String>) -> Self {
        Self::InvalidConfigRequest {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `CfrError`.
pub type Result<T> = std::result::Result<T, CfrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_truncated() {
        let err = CfrError::truncated(0x40, 12, 3);
        assert_eq!(
            err.to_string(),
            "truncated record at offset 0x40: need 12 bytes, 3 available"
        );
    }

    #[test]
    fn error_display_size_mismatch() {
        let err = CfrError::SizeMismatch {
            offset: 0x1c,
            tag: 0x0104,
            declared: 64,
            consumed: 60,
        };
        assert_eq!(
            err.to_string(),
            "record tag 0x0104 at offset 0x1c: consumed 60 bytes, declared 64"
        );
    }

    #[test]
    fn error_display_no_default() {
        let err = CfrError::no_default("Advanced", "form");
        assert_eq!(err.to_string(), "'Advanced' is a form and has no default value");
    }

    #[test]
    fn error_code_mapping() {
        assert_eq!(
            CfrError::truncated(0, 8, 0).error_code(),
            ErrorCode::VolumeCorrupted
        );
        assert_eq!(
            CfrError::option_not_found("x").error_code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            CfrError::StoreSizeMismatch {
                name: "x".to_owned(),
                expected: 4,
                actual: 2,
            }
            .error_code(),
            ErrorCode::ProtocolError
        );
        assert_eq!(
            CfrError::variable_not_found("x").error_code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            CfrError::WriteProtected {
                name: "x".to_owned()
            }
            .error_code(),
            ErrorCode::WriteProtected
        );
    }

    #[test]
    fn store_mismatch_is_distinct_from_not_found() {
        let mismatch = CfrError::StoreSizeMismatch {
            name: "Foo".to_owned(),
            expected: 4,
            actual: 8,
        };
        let missing = CfrError::variable_not_found("Foo");
        assert_ne!(mismatch.error_code(), missing.error_code());
    }

    #[test]
    fn classification() {
        assert!(CfrError::MissingField {
            offset: 0,
            field_tag: 0x0108
        }
        .is_structural());
        assert!(!CfrError::option_not_found("x").is_structural());

        let too_long = CfrError::FieldTooLong {
            offset: 0,
            field_tag: 0x010a,
            length: 300,
            max: 255,
        };
        assert!(too_long.is_record_local());
        assert!(!too_long.is_structural());

        assert!(CfrError::option_not_found("x").is_lookup_miss());
        assert!(CfrError::no_default("x", "form").is_lookup_miss());
        assert!(!CfrError::variable_not_found("x").is_lookup_miss());
    }

    #[test]
    fn unknown_record_is_not_structural() {
        let err = CfrError::UnknownRecord {
            offset: 0x30,
            tag: 0x0200,
        };
        assert!(!err.is_structural());
        assert!(!err.is_record_local());
        assert_eq!(err.error_code(), ErrorCode::Unsupported);
        assert_eq!(
            err.to_string(),
            "unrecognized record tag 0x0200 at offset 0x30"
        );
    }

    #[test]
    fn exit_code() {
        assert_eq!(CfrError::option_not_found("x").exit_code(), 1);
        assert_eq!(CfrError::truncated(0, 8, 0).exit_code(), 1);
        let hob_miss = CfrError::HobNotFound {
            guid: "00000000-0000-0000-0000-000000000001".to_owned(),
        };
        assert!(hob_miss.is_lookup_miss());
        assert_eq!(hob_miss.exit_code(), 1);
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        assert_eq!(CfrError::from(io_err).exit_code(), 3);
        assert_eq!(CfrError::config_request("x").exit_code(), 1);
        assert_eq!(CfrError::internal("x").exit_code(), 4);
    }

    #[test]
    fn duplicate_object_id_rejects_one_option() {
        let err = CfrError::DuplicateObjectId {
            object_id: 5,
            name: "B".to_owned(),
        };
        assert!(err.is_record_local());
        assert!(!err.is_structural());
        assert_eq!(err.error_code(), ErrorCode::InvalidParameter);
        assert_eq!(err.to_string(), "object id 5 of 'B' is already bound in this tree");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: CfrError = io_err.into();
        assert!(matches!(err, CfrError::Io(_)));
        assert_eq!(err.error_code(), ErrorCode::DeviceError);
    }

    #[test]
    fn error_code_values() {
        assert_eq!(ErrorCode::InvalidParameter as u8, 2);
        assert_eq!(ErrorCode::NotFound as u8, 14);
        assert_eq!(ErrorCode::ProtocolError as u8, 24);
    }
}
