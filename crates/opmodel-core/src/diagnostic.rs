//! Records of recoverable skips.
//!
//! Discovery never aborts because of one operation or argument. Each such
//! event becomes a [`Diagnostic`], is logged, and ends up in the model bundle.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of recoverable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A concrete operation type could not be instantiated.
    InstantiationFailed,
    /// A static function had no usable call target.
    MissingCallTarget,
    /// A static function was excluded as non-introspectable.
    NonIntrospectable,
    /// A function was included only because of the force-include list.
    ForceIncluded,
    /// An enum or format lookup did not resolve.
    LookupMiss,
    /// An array length was inferred from an ambiguous signal.
    AmbiguousArrayLength,
    /// An operation flagged deprecated was skipped.
    Deprecated,
    /// An operation was on the exclusion list.
    Excluded,
    /// An operation was on the skip-generation list.
    SkipGeneration,
    /// An operation collided with an earlier one on its target identifier.
    Duplicate,
    /// A type token was not recognized and fell back to an opaque handle.
    UnknownType,
}

impl DiagnosticKind {
    /// Stable snake-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InstantiationFailed => "instantiation_failed",
            Self::MissingCallTarget => "missing_call_target",
            Self::NonIntrospectable => "non_introspectable",
            Self::ForceIncluded => "force_included",
            Self::LookupMiss => "lookup_miss",
            Self::AmbiguousArrayLength => "ambiguous_array_length",
            Self::Deprecated => "deprecated",
            Self::Excluded => "excluded",
            Self::SkipGeneration => "skip_generation",
            Self::Duplicate => "duplicate",
            Self::UnknownType => "unknown_type",
        }
    }
}

/// One recoverable event: what happened, to which name, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Event kind
    pub kind: DiagnosticKind,
    /// Offending operation, argument or type name
    pub subject: String,
    /// Human-readable detail
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Converts a recoverable error into a diagnostic.
    ///
    /// Returns `None` for fatal errors, which must propagate instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use opmodel_core::{Diagnostic, DiagnosticKind, Error};
    ///
    /// let err = Error::InstantiationFailed { type_name: "VipsBroken".to_string() };
    /// let diag = Diagnostic::from_error(&err).unwrap();
    /// assert_eq!(diag.kind, DiagnosticKind::InstantiationFailed);
    /// assert_eq!(diag.subject, "VipsBroken");
    ///
    /// let fatal = Error::Initialization { message: "no base type".to_string() };
    /// assert!(Diagnostic::from_error(&fatal).is_none());
    /// ```
    #[must_use]
    pub fn from_error(error: &Error) -> Option<Self> {
        let (kind, subject) = match error {
            Error::InstantiationFailed { type_name } => {
                (DiagnosticKind::InstantiationFailed, type_name.clone())
            }
            Error::MissingCallTarget { function } => {
                (DiagnosticKind::MissingCallTarget, function.clone())
            }
            Error::LookupMiss { name, .. } => (DiagnosticKind::LookupMiss, name.clone()),
            Error::AmbiguousArrayLength {
                operation,
                argument,
            } => (
                DiagnosticKind::AmbiguousArrayLength,
                format!("{operation}.{argument}"),
            ),
            Error::MetadataRead { .. }
            | Error::MetadataDecode { .. }
            | Error::Initialization { .. }
            | Error::ConfigError { .. }
            | Error::SerializationError { .. } => return None,
        };
        Some(Self::new(kind, subject, error.to_string()))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.subject, self.message)
    }
}
