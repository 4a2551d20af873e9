//! Language-neutral operation model.
//!
//! These types are the hand-off format between discovery and code emission.
//! Discovery builds them once per run; the operation classifier fills in the
//! derived fields exactly once; emission reads them without further type
//! interpretation.
//!
//! # Examples
//!
//! ```
//! use opmodel_core::{Argument, Direction, DiscoverySource, Operation, ScalarKind, SemanticType};
//!
//! let mut op = Operation::new("invert", "Invert", "invert an image", DiscoverySource::Live);
//! op.arguments.push(Argument::new("in", "in", SemanticType::Image, "VipsImage", Direction::Input));
//! op.arguments.push(Argument::new("out", "out", SemanticType::Image, "VipsImage", Direction::Output));
//!
//! assert_eq!(op.inputs().count(), 1);
//! assert!(op.argument("out").is_some_and(|a| a.is_image()));
//! assert!(!op.is_classified());
//! # let _ = ScalarKind::Int;
//! ```

use crate::{Diagnostic, Error, OperationName, Result, TypeToken};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which discovery path produced an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// Live introspection of the native runtime type system.
    Live,
    /// Static API description document.
    Static,
}

/// Argument direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Value flows into the operation.
    Input,
    /// Value is produced by the operation.
    Output,
}

impl Direction {
    /// Returns `true` for [`Direction::Output`].
    #[inline]
    #[must_use]
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Output)
    }
}

/// Scalar value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Boolean.
    Bool,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UInt,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Double precision float.
    Double,
    /// Single precision float.
    Float,
    /// NUL-terminated string.
    String,
}

/// Element type of an array argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "scalar", rename_all = "snake_case")]
pub enum ElementType {
    /// Array of scalars.
    Scalar(ScalarKind),
    /// Array of enum values.
    Enum,
}

/// Opaque native handle kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    /// Interpolation handle.
    Interpolate,
    /// Stream source.
    Source,
    /// Stream sink.
    Target,
    /// Anything the classifier did not recognize.
    Pointer,
}

/// Closed set of semantic argument kinds.
///
/// Produced once by the type token classifier and consumed by exhaustive
/// matching everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticType {
    /// Plain scalar value.
    Scalar {
        /// Scalar kind
        scalar: ScalarKind,
    },
    /// Enum or flags value.
    Enum {
        /// `true` for bit-flag types
        flags: bool,
    },
    /// Array of scalars or enums.
    Array {
        /// Element type
        element: ElementType,
    },
    /// Reference to one image.
    Image,
    /// Array of image references.
    ImageArray,
    /// Raw memory buffer.
    Buffer,
    /// Opaque native handle.
    Handle {
        /// Handle kind
        handle: HandleKind,
    },
}

impl SemanticType {
    /// Shorthand for [`SemanticType::Scalar`].
    #[inline]
    #[must_use]
    pub const fn scalar(scalar: ScalarKind) -> Self {
        Self::Scalar { scalar }
    }

    /// Shorthand for [`SemanticType::Array`] of scalars.
    #[inline]
    #[must_use]
    pub const fn array_of(scalar: ScalarKind) -> Self {
        Self::Array {
            element: ElementType::Scalar(scalar),
        }
    }

    /// Shorthand for an unrecognized pointer.
    #[inline]
    #[must_use]
    pub const fn opaque() -> Self {
        Self::Handle {
            handle: HandleKind::Pointer,
        }
    }

    /// Returns `true` for array and image array kinds.
    #[inline]
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::Array { .. } | Self::ImageArray)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { scalar } => write!(f, "{scalar:?}"),
            Self::Enum { flags: false } => write!(f, "enum"),
            Self::Enum { flags: true } => write!(f, "flags"),
            Self::Array {
                element: ElementType::Scalar(scalar),
            } => write!(f, "array<{scalar:?}>"),
            Self::Array {
                element: ElementType::Enum,
            } => write!(f, "array<enum>"),
            Self::Image => write!(f, "image"),
            Self::ImageArray => write!(f, "array<image>"),
            Self::Buffer => write!(f, "buffer"),
            Self::Handle { handle } => write!(f, "handle<{handle:?}>"),
        }
    }
}

/// Length contract of an array (or buffer) argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArrayLength {
    /// Statically known element count.
    Fixed {
        /// Number of elements
        size: usize,
    },
    /// Terminated by a sentinel element.
    ZeroTerminated,
    /// Element count carried by a named integer argument of the same operation.
    Companion {
        /// Native name of the companion argument
        argument: String,
        /// `false` when the companion was inferred from an ambiguous signal
        verified: bool,
    },
}

impl ArrayLength {
    /// Returns the companion argument name, if any.
    #[must_use]
    pub fn companion(&self) -> Option<&str> {
        match self {
            Self::Companion { argument, .. } => Some(argument),
            Self::Fixed { .. } | Self::ZeroTerminated => None,
        }
    }
}

/// Typed default value copied from native metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Int(i64),
    /// Floating-point default.
    Double(f64),
    /// String default.
    String(String),
    /// Enum default: integer value plus owning enum type.
    Enum {
        /// Integer value
        value: i64,
        /// Native name of the enum type
        enum_type: String,
    },
}

/// One parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Native parameter name
    pub name: String,
    /// Target-language identifier
    pub target_name: String,
    /// Human-readable description
    pub description: String,
    /// Semantic classification
    pub semantic: SemanticType,
    /// Native type token
    pub type_token: TypeToken,
    /// Suggested native representation (e.g. `VipsImage**`)
    pub representation: String,
    /// Data flow direction
    pub direction: Direction,
    /// Whether the caller must supply (or always receives) this argument
    pub required: bool,
    /// Native default value, if declared
    pub default: Option<DefaultValue>,
    /// Native name of the enum type for enum and enum-array arguments
    pub enum_type: Option<String>,
    /// Length contract for arrays and buffers
    pub array_length: Option<ArrayLength>,
    /// Set on companion-length arguments: the argument whose length this is
    pub length_of: Option<String>,
    /// Computed at the call site, hidden from the visible parameter list
    pub derived: bool,
}

impl Argument {
    /// Creates a required argument with no default and no companions.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_name: impl Into<String>,
        semantic: SemanticType,
        type_token: impl Into<TypeToken>,
        direction: Direction,
    ) -> Self {
        Self {
            name: name.into(),
            target_name: target_name.into(),
            description: String::new(),
            semantic,
            type_token: type_token.into(),
            representation: String::new(),
            direction,
            required: true,
            default: None,
            enum_type: None,
            array_length: None,
            length_of: None,
            derived: false,
        }
    }

    /// Returns `true` for input arguments.
    #[inline]
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self.direction, Direction::Input)
    }

    /// Returns `true` for output arguments.
    #[inline]
    #[must_use]
    pub const fn is_output(&self) -> bool {
        self.direction.is_output()
    }

    /// Returns `true` for single image references.
    #[inline]
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.semantic, SemanticType::Image)
    }

    /// Returns `true` for arrays of image references.
    #[inline]
    #[must_use]
    pub const fn is_image_array(&self) -> bool {
        matches!(self.semantic, SemanticType::ImageArray)
    }

    /// Returns `true` for raw memory buffers.
    #[inline]
    #[must_use]
    pub const fn is_buffer(&self) -> bool {
        matches!(self.semantic, SemanticType::Buffer)
    }

    /// Returns `true` for arrays of scalars, enums or images.
    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.semantic.is_array()
    }

    /// Returns `true` for enum and flags arguments and arrays of enums.
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(
            self.semantic,
            SemanticType::Enum { .. }
                | SemanticType::Array {
                    element: ElementType::Enum
                }
        )
    }

    /// Returns `true` if the argument belongs in the caller-facing signature.
    #[inline]
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.derived
    }
}

/// Operation category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Pixel arithmetic.
    Arithmetic,
    /// Convolution and edge detection.
    Convolution,
    /// Geometric resampling.
    Resample,
    /// Colour space handling.
    Colour,
    /// Format loaders.
    ForeignLoad,
    /// Format savers.
    ForeignSave,
    /// Band and geometry conversion.
    Conversion,
    /// Histograms and statistics.
    Histogram,
    /// Morphology.
    Morphology,
    /// In-place drawing.
    Draw,
    /// Anything else.
    #[default]
    Operation,
}

impl Category {
    /// Returns the tag as used in emitted code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::Convolution => "convolution",
            Self::Resample => "resample",
            Self::Colour => "colour",
            Self::ForeignLoad => "foreign_load",
            Self::ForeignSave => "foreign_save",
            Self::Conversion => "conversion",
            Self::Histogram => "histogram",
            Self::Morphology => "morphology",
            Self::Draw => "draw",
            Self::Operation => "operation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate capability flags derived from an operation's arguments.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Some input argument is an image reference
    pub has_image_input: bool,
    /// Some output argument is an image reference
    pub has_image_output: bool,
    /// Exactly one output image reference and no image array input
    pub has_one_image_output: bool,
    /// Raw memory input named `buf`/`buffer`
    pub has_buffer_input: bool,
    /// Raw memory output named `buf`/`buffer`
    pub has_buffer_output: bool,
    /// Some input argument is an array of image references
    pub has_array_image_input: bool,
}

/// Argument positions partitioned by direction and requiredness.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArgumentSubsets {
    /// Required inputs
    pub required_inputs: Vec<usize>,
    /// Optional inputs
    pub optional_inputs: Vec<usize>,
    /// Required outputs
    pub required_outputs: Vec<usize>,
    /// Optional outputs
    pub optional_outputs: Vec<usize>,
}

impl ArgumentSubsets {
    /// Partitions `arguments` by (direction × required).
    #[must_use]
    pub fn partition(arguments: &[Argument]) -> Self {
        let mut subsets = Self::default();
        for (index, arg) in arguments.iter().enumerate() {
            let bucket = match (arg.direction, arg.required) {
                (Direction::Input, true) => &mut subsets.required_inputs,
                (Direction::Input, false) => &mut subsets.optional_inputs,
                (Direction::Output, true) => &mut subsets.required_outputs,
                (Direction::Output, false) => &mut subsets.optional_outputs,
            };
            bucket.push(index);
        }
        subsets
    }

    /// Total number of indexed arguments across all four subsets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.required_inputs.len()
            + self.optional_inputs.len()
            + self.required_outputs.len()
            + self.optional_outputs.len()
    }

    /// Returns `true` when no argument has been partitioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One callable unit of the wrapped library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Native operation name
    pub name: OperationName,
    /// Target-language identifier
    pub target_name: String,
    /// Native call target (C symbol) when known
    pub call_target: Option<String>,
    /// Human-readable description
    pub description: String,
    /// Category tag
    pub category: Category,
    /// Arguments in declaration order
    pub arguments: Vec<Argument>,
    /// Derived partition of `arguments`
    pub subsets: ArgumentSubsets,
    /// Derived capability flags
    pub capabilities: Capabilities,
    /// Format enum member for load/save operations
    pub image_type: String,
    /// A varargs marker was present (and dropped) in the native signature
    pub variadic: bool,
    /// Discovery path that produced this operation
    pub source: DiscoverySource,
    #[serde(default)]
    classified: bool,
}

impl Operation {
    /// Creates an unclassified operation with no arguments.
    #[must_use]
    pub fn new(
        name: impl Into<OperationName>,
        target_name: impl Into<String>,
        description: impl Into<String>,
        source: DiscoverySource,
    ) -> Self {
        Self {
            name: name.into(),
            target_name: target_name.into(),
            call_target: None,
            description: description.into(),
            category: Category::Operation,
            arguments: Vec::new(),
            subsets: ArgumentSubsets::default(),
            capabilities: Capabilities::default(),
            image_type: String::from("ImageTypeUnknown"),
            variadic: false,
            source,
            classified: false,
        }
    }

    /// Looks up an argument by native name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Iterates over input arguments.
    pub fn inputs(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|a| a.is_input())
    }

    /// Iterates over output arguments.
    pub fn outputs(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|a| a.is_output())
    }

    /// Iterates over arguments that belong in the caller-facing signature.
    pub fn visible_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|a| a.is_visible())
    }

    /// Required inputs, in declaration order.
    pub fn required_inputs(&self) -> impl Iterator<Item = &Argument> {
        self.subset(&self.subsets.required_inputs)
    }

    /// Optional inputs, in declaration order.
    pub fn optional_inputs(&self) -> impl Iterator<Item = &Argument> {
        self.subset(&self.subsets.optional_inputs)
    }

    /// Required outputs, in declaration order.
    pub fn required_outputs(&self) -> impl Iterator<Item = &Argument> {
        self.subset(&self.subsets.required_outputs)
    }

    /// Optional outputs, in declaration order.
    pub fn optional_outputs(&self) -> impl Iterator<Item = &Argument> {
        self.subset(&self.subsets.optional_outputs)
    }

    fn subset<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a Argument> {
        indices.iter().filter_map(|&i| self.arguments.get(i))
    }

    /// Returns `true` once the operation classifier has run.
    #[inline]
    #[must_use]
    pub const fn is_classified(&self) -> bool {
        self.classified
    }

    /// Marks derived fields as final.
    ///
    /// Called by the operation classifier after it has filled in subsets,
    /// capabilities and category.
    pub const fn mark_classified(&mut self) {
        self.classified = true;
    }
}

/// One member of an enum or flags type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Native member name (e.g. `VIPS_INTERPRETATION_sRGB`)
    pub native_name: String,
    /// Target member name (e.g. `InterpretationSrgb`)
    pub target_name: String,
    /// Integer value
    pub value: i64,
    /// Short description (the native nickname)
    pub description: String,
}

/// A discovered enum or flags type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    /// Native type name, unique within a registry
    pub native_name: String,
    /// Target type name
    pub target_name: String,
    /// `true` for bit-flag types
    pub flags: bool,
    /// Ordered members
    pub values: Vec<EnumValue>,
}

/// A codec format discovered from load/save operation names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Normalized format token (e.g. `jpeg`)
    pub token: String,
    /// Target enum member name (e.g. `ImageTypeJpeg`)
    pub enum_member: String,
    /// MIME type, empty when unknown
    pub mime_type: String,
    /// Position in the emitted enum
    pub ordinal: u32,
    /// A loader variant exists
    pub has_loader: bool,
    /// A saver variant exists
    pub has_saver: bool,
}

/// Everything discovery hands to code emission, read-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Finalized operations
    pub operations: Vec<Operation>,
    /// Registered enum types with their values
    pub enums: Vec<EnumType>,
    /// Discovered formats ordered by ordinal
    pub formats: Vec<FormatInfo>,
    /// Every recoverable skip recorded during the run
    pub diagnostics: Vec<Diagnostic>,
}

impl ModelBundle {
    /// Looks up a finalized operation by native name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name.as_str() == name)
    }

    /// Looks up an enum type by native name.
    #[must_use]
    pub fn enum_type(&self, native_name: &str) -> Option<&EnumType> {
        self.enums.iter().find(|e| e.native_name == native_name)
    }

    /// Serializes the bundle as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::SerializationError {
            message: format!("Failed to serialize model bundle: {e}"),
            source: Some(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, direction: Direction) -> Argument {
        Argument::new(name, name, SemanticType::Image, "VipsImage", direction)
    }

    #[test]
    fn test_partition_covers_every_argument_once() {
        let mut optional = Argument::new(
            "scale",
            "scale",
            SemanticType::scalar(ScalarKind::Double),
            "gdouble",
            Direction::Input,
        );
        optional.required = false;
        let args = vec![
            image("in", Direction::Input),
            optional,
            image("out", Direction::Output),
        ];

        let subsets = ArgumentSubsets::partition(&args);
        assert_eq!(subsets.required_inputs, vec![0]);
        assert_eq!(subsets.optional_inputs, vec![1]);
        assert_eq!(subsets.required_outputs, vec![2]);
        assert!(subsets.optional_outputs.is_empty());
        assert_eq!(subsets.len(), args.len());
    }

    #[test]
    fn test_subset_accessors_follow_indices() {
        let mut op = Operation::new("invert", "Invert", "", DiscoverySource::Live);
        op.arguments.push(image("in", Direction::Input));
        op.arguments.push(image("out", Direction::Output));
        op.subsets = ArgumentSubsets::partition(&op.arguments);

        let names: Vec<_> = op.required_outputs().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["out"]);
        assert_eq!(op.required_inputs().count(), 1);
        assert_eq!(op.optional_inputs().count(), 0);
    }

    #[test]
    fn test_enum_array_counts_as_enum() {
        let arg = Argument::new(
            "mode",
            "mode",
            SemanticType::Array {
                element: ElementType::Enum,
            },
            "VipsArrayInt",
            Direction::Input,
        );
        assert!(arg.is_enum());
        assert!(arg.is_array());
        assert!(!arg.is_image_array());
    }

    #[test]
    fn test_array_length_companion() {
        let len = ArrayLength::Companion {
            argument: "n".to_string(),
            verified: true,
        };
        assert_eq!(len.companion(), Some("n"));
        assert_eq!(ArrayLength::Fixed { size: 3 }.companion(), None);
    }

    #[test]
    fn test_semantic_display() {
        assert_eq!(SemanticType::ImageArray.to_string(), "array<image>");
        assert_eq!(
            SemanticType::array_of(ScalarKind::Double).to_string(),
            "array<Double>"
        );
        assert_eq!(SemanticType::Enum { flags: true }.to_string(), "flags");
    }

    #[test]
    fn test_bundle_json_contains_operations() {
        let bundle = ModelBundle {
            operations: vec![Operation::new(
                "invert",
                "Invert",
                "invert an image",
                DiscoverySource::Static,
            )],
            ..ModelBundle::default()
        };
        let json = bundle.to_json().unwrap();
        assert!(json.contains("\"invert\""));
        assert!(json.contains("\"static\""));
        assert!(bundle.operation("invert").is_some());
    }

    #[test]
    fn test_category_strings() {
        assert_eq!(Category::default(), Category::Operation);
        assert_eq!(Category::ForeignSave.as_str(), "foreign_save");
        assert_eq!(Category::Colour.to_string(), "colour");
    }
}
