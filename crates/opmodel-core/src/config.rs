//! Discovery configuration.
//!
//! [`ModelConfig`] carries the maintained tables that steer discovery: which
//! operations to drop, which to force-include from static metadata, which
//! image outputs are borrowed views, and the naming prefixes of the wrapped
//! library.
//!
//! # Examples
//!
//! ```
//! use opmodel_core::ModelConfig;
//!
//! // Use default configuration
//! let config = ModelConfig::default();
//! assert!(config.is_excluded("version"));
//! assert!(config.borrows_image_output("tilecache"));
//!
//! // Override a single table from TOML
//! let custom = ModelConfig::from_toml_str(r#"excluded_operations = ["system"]"#).unwrap();
//! assert!(!custom.is_excluded("version"));
//! assert_eq!(custom.namespace, "Vips");
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Configuration for one discovery run.
///
/// Every field has a default, so a partial TOML document overrides only the
/// keys it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Operations that are never emitted.
    ///
    /// Default: `cache`, `system`, `version`
    pub excluded_operations: Vec<String>,

    /// Name fragments that exclude an operation wherever they appear.
    ///
    /// Default: `_source`, `_target`, `_mime`
    pub excluded_fragments: Vec<String>,

    /// Operations discovered but left to hand-written wrappers.
    ///
    /// Default: `jpegsave`, `pngsave`, `webpsave`, `composite`, `composite2`
    pub skip_generation: Vec<String>,

    /// Static-metadata functions included even when non-introspectable or
    /// lacking a call target.
    pub force_include: Vec<String>,

    /// Operations whose image output is a cache or view of the input rather
    /// than a new owned image.
    ///
    /// Default: `copy`, `sequential`, `linecache`, `tilecache`
    pub borrowed_image_outputs: Vec<String>,

    /// Enum types that are never registered.
    ///
    /// Default: `VipsForeignPngFilter`
    pub excluded_enums: Vec<String>,

    /// Namespace prefix stripped from native type names.
    ///
    /// Default: `Vips`
    pub namespace: String,

    /// Secondary prefix stripped after the namespace.
    ///
    /// Default: `Foreign`
    pub sub_prefix: String,

    /// Prefix every native call target must carry.
    ///
    /// Default: `vips_`
    pub call_target_prefix: String,

    /// Native name of the abstract base operation type.
    ///
    /// Default: `VipsOperation`
    pub base_operation_type: String,

    /// Maximum number of values fetched per enum type.
    ///
    /// Default: 100
    pub max_enum_values: usize,

    /// Maximum description length in characters, including the ellipsis.
    ///
    /// Default: 100
    pub description_limit: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            excluded_operations: strings(&["cache", "system", "version"]),
            excluded_fragments: strings(&["_source", "_target", "_mime"]),
            skip_generation: strings(&["jpegsave", "pngsave", "webpsave", "composite", "composite2"]),
            force_include: strings(&[
                "arrayjoin",
                "composite2",
                "linear",
                "linear1",
                "replicate",
                "find_trim",
                "affine",
            ]),
            borrowed_image_outputs: strings(&["copy", "sequential", "linecache", "tilecache"]),
            excluded_enums: strings(&["VipsForeignPngFilter"]),
            namespace: "Vips".to_string(),
            sub_prefix: "Foreign".to_string(),
            call_target_prefix: "vips_".to_string(),
            base_operation_type: "VipsOperation".to_string(),
            max_enum_values: 100,
            description_limit: 100,
        }
    }
}

impl ModelConfig {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use opmodel_core::ModelConfig;
    ///
    /// let config = ModelConfig::builder()
    ///     .exclude_operation("invert")
    ///     .force_include("vips_resize")
    ///     .build();
    ///
    /// assert!(config.is_excluded("invert"));
    /// assert!(config.is_force_included("vips_resize"));
    /// ```
    #[must_use]
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::new()
    }

    /// Parses a configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the document is not valid TOML, does
    /// not match the expected shape, or fails [`validate`](Self::validate).
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let config: Self = toml::from_str(document).map_err(|e| Error::ConfigError {
            message: format!("invalid configuration document: {e}"),
            source: Some(Box::new(e)),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            message: format!("cannot read {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        tracing::debug!(path = %path.display(), "loaded discovery configuration");
        Self::from_toml_str(&document)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if:
    /// - the namespace, call target prefix or base operation type is empty
    /// - an excluded name fragment is empty (it would exclude everything)
    /// - `max_enum_values` or `description_limit` is too small to be useful
    ///
    /// # Examples
    ///
    /// ```
    /// use opmodel_core::ModelConfig;
    ///
    /// let config = ModelConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// let mut invalid = ModelConfig::default();
    /// invalid.namespace.clear();
    /// assert!(invalid.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(Error::ConfigError {
                message: message.to_string(),
                source: None,
            })
        };

        if self.namespace.is_empty() {
            return fail("namespace prefix cannot be empty");
        }
        if self.call_target_prefix.is_empty() {
            return fail("call target prefix cannot be empty");
        }
        if self.base_operation_type.is_empty() {
            return fail("base operation type cannot be empty");
        }
        if self.excluded_fragments.iter().any(String::is_empty) {
            return fail("excluded name fragments cannot be empty");
        }
        if self.max_enum_values == 0 {
            return fail("max_enum_values must be greater than zero");
        }
        if self.description_limit < 4 {
            return fail("description_limit must leave room for an ellipsis");
        }

        Ok(())
    }

    /// Returns `true` if the operation is on the exclusion list or contains
    /// an excluded fragment.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_operations.iter().any(|n| n == name)
            || self.excluded_fragments.iter().any(|f| name.contains(f.as_str()))
    }

    /// Returns `true` if the operation is left to hand-written wrappers.
    #[must_use]
    pub fn is_skip_generation(&self, name: &str) -> bool {
        self.skip_generation.iter().any(|n| n == name)
    }

    /// Returns `true` if the static-metadata function is force-included.
    #[must_use]
    pub fn is_force_included(&self, name: &str) -> bool {
        self.force_include.iter().any(|n| n == name)
    }

    /// Returns `true` if the operation's image output is a borrowed view.
    #[must_use]
    pub fn borrows_image_output(&self, name: &str) -> bool {
        self.borrowed_image_outputs.iter().any(|n| n == name)
    }

    /// Returns `true` if the enum type must not be registered.
    #[must_use]
    pub fn is_excluded_enum(&self, native_name: &str) -> bool {
        self.excluded_enums.iter().any(|n| n == native_name)
    }
}

/// Builder for [`ModelConfig`].
///
/// # Examples
///
/// ```
/// use opmodel_core::ModelConfig;
///
/// let config = ModelConfig::builder()
///     .skip_generation("thumbnail")
///     .borrowed_image_output("buffer_copy")
///     .max_enum_values(10)
///     .build();
///
/// assert!(config.is_skip_generation("thumbnail"));
/// assert_eq!(config.max_enum_values, 10);
/// ```
#[derive(Debug)]
pub struct ModelConfigBuilder {
    config: ModelConfig,
}

impl ModelConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ModelConfig::default(),
        }
    }

    /// Adds an operation to the exclusion list.
    #[must_use]
    pub fn exclude_operation(mut self, name: impl Into<String>) -> Self {
        self.config.excluded_operations.push(name.into());
        self
    }

    /// Adds an excluded name fragment.
    #[must_use]
    pub fn exclude_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.config.excluded_fragments.push(fragment.into());
        self
    }

    /// Adds an operation to the skip-generation list.
    #[must_use]
    pub fn skip_generation(mut self, name: impl Into<String>) -> Self {
        self.config.skip_generation.push(name.into());
        self
    }

    /// Force-includes a static-metadata function.
    #[must_use]
    pub fn force_include(mut self, name: impl Into<String>) -> Self {
        self.config.force_include.push(name.into());
        self
    }

    /// Marks an operation's image output as borrowed.
    #[must_use]
    pub fn borrowed_image_output(mut self, name: impl Into<String>) -> Self {
        self.config.borrowed_image_outputs.push(name.into());
        self
    }

    /// Excludes an enum type from registration.
    #[must_use]
    pub fn exclude_enum(mut self, native_name: impl Into<String>) -> Self {
        self.config.excluded_enums.push(native_name.into());
        self
    }

    /// Sets the namespace prefix.
    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>) -> Self {
        self.config.namespace = prefix.into();
        self
    }

    /// Sets the enum sub-prefix.
    #[must_use]
    pub fn sub_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.sub_prefix = prefix.into();
        self
    }

    /// Sets the call target prefix.
    #[must_use]
    pub fn call_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.call_target_prefix = prefix.into();
        self
    }

    /// Sets the abstract base operation type.
    #[must_use]
    pub fn base_operation_type(mut self, name: impl Into<String>) -> Self {
        self.config.base_operation_type = name.into();
        self
    }

    /// Sets the per-enum value cap.
    #[must_use]
    pub const fn max_enum_values(mut self, max: usize) -> Self {
        self.config.max_enum_values = max;
        self
    }

    /// Sets the description length limit.
    #[must_use]
    pub const fn description_limit(mut self, limit: usize) -> Self {
        self.config.description_limit = limit;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ModelConfig {
        self.config
    }
}

impl Default for ModelConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
