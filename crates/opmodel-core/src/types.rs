//! Strong identifier types.
//!
//! Native names flow through every discovery stage next to target names,
//! descriptions and C types. Wrapping the two identifiers that are used as
//! lookup keys keeps them from being mixed up with the rest.
//!
//! # Examples
//!
//! ```
//! use opmodel_core::{OperationName, TypeToken};
//!
//! let op = OperationName::new("extract_area");
//! let token = TypeToken::new("VipsImage");
//! assert_eq!(op.as_str(), "extract_area");
//! assert_eq!(token.as_str(), "VipsImage");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Native operation name (the library's short name, e.g. `"invert"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationName(String);

impl OperationName {
    /// Creates a new operation name.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `OperationName` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OperationName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OperationName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque native type token (e.g. `"VipsImage"`, `"gint"`, `"VipsArrayDouble"`).
///
/// Tokens are compared by exact match; the classifier decides what a token
/// means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeToken(String);

impl TypeToken {
    /// Creates a new type token.
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token is empty (no type information at all).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TypeToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TypeToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
