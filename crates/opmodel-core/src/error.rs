//! Error types for operation model discovery.
//!
//! Discovery distinguishes two classes of failure:
//!
//! - **Fatal** errors abort a discovery run: an unreadable or malformed
//!   metadata document, or a native type system that cannot be initialized.
//! - **Recoverable** errors concern a single operation or argument. They are
//!   never propagated out of a discovery call; the discovery code converts them
//!   into [`Diagnostic`](crate::Diagnostic) records and carries on.
//!
//! # Examples
//!
//! ```
//! use opmodel_core::{Error, Result};
//!
//! fn load_document(path: &str) -> Result<()> {
//!     if path.is_empty() {
//!         return Err(Error::ConfigError {
//!             message: "metadata path cannot be empty".to_string(),
//!             source: None,
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = load_document("").unwrap_err();
//! assert!(err.is_config_error());
//! ```

use thiserror::Error;

/// Main error type for operation model discovery.
///
/// All crates in the workspace use this type so that fatal failures carry a
/// consistent cause chain up to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// The static metadata document could not be read.
    #[error("Failed to read metadata document: {path}")]
    MetadataRead {
        /// Path of the document that failed to load
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The static metadata document is malformed.
    ///
    /// Fatal for the static discovery path.
    #[error("Failed to decode metadata document '{document}': {message}")]
    MetadataDecode {
        /// Name of the document (file name or caller-supplied label)
        document: String,
        /// Short description of the decode failure
        message: String,
        /// Underlying decoder error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The native type system could not be initialized.
    ///
    /// Raised when the abstract base operation type cannot be resolved, which
    /// makes live discovery impossible.
    #[error("Type system initialization failed: {message}")]
    Initialization {
        /// Description of the initialization failure
        message: String,
    },

    /// A candidate operation type could not be instantiated.
    ///
    /// Recoverable: the operation is excluded and discovery continues.
    #[error("Failed to instantiate operation type '{type_name}'")]
    InstantiationFailed {
        /// Native type name of the candidate
        type_name: String,
    },

    /// A function in the static metadata has no usable native call target.
    ///
    /// Recoverable: the function is excluded unless force-included.
    #[error("Function '{function}' has no usable call target")]
    MissingCallTarget {
        /// Name of the function
        function: String,
    },

    /// An enum or format lookup did not resolve.
    ///
    /// Recoverable: the argument falls back to an opaque classification.
    #[error("{kind} lookup failed for '{name}'")]
    LookupMiss {
        /// What was looked up (`enum`, `format`, `type`)
        kind: String,
        /// The name that did not resolve
        name: String,
    },

    /// The length of an array argument could not be determined with certainty.
    ///
    /// Recoverable: the argument is emitted with an unverified length contract.
    #[error("Ambiguous array length for '{argument}' in operation '{operation}'")]
    AmbiguousArrayLength {
        /// Owning operation
        operation: String,
        /// Array argument
        argument: String,
    },

    /// Configuration error.
    ///
    /// Raised when configuration is invalid or cannot be parsed.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
        /// Underlying read or parse error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl Error {
    /// Returns `true` if this error must abort a discovery run.
    ///
    /// # Examples
    ///
    /// ```
    /// use opmodel_core::Error;
    ///
    /// let fatal = Error::Initialization {
    ///     message: "VipsOperation not registered".to_string(),
    /// };
    /// assert!(fatal.is_fatal());
    ///
    /// let recoverable = Error::InstantiationFailed {
    ///     type_name: "VipsForeignLoadJpegFile".to_string(),
    /// };
    /// assert!(!recoverable.is_fatal());
    /// ```
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MetadataRead { .. }
                | Self::MetadataDecode { .. }
                | Self::Initialization { .. }
                | Self::ConfigError { .. }
        )
    }

    /// Returns `true` if this is a metadata read or decode error.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::MetadataRead { .. } | Self::MetadataDecode { .. })
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use opmodel_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "empty prefix".to_string(),
    ///     source: None,
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a lookup miss.
    #[must_use]
    pub const fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::LookupMiss { .. })
    }
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;
