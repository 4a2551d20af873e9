//! Type token classifier.
//!
//! Maps an opaque native type token to a [`SemanticType`] and a suggested
//! native representation. Well-known tokens are matched exactly, in table
//! order; enum and flags tokens are recognized through an [`EnumKind`] hint
//! supplied by the caller (runtime predicate on the live path, registry
//! membership on the static path). Anything else is an opaque pointer.
//!
//! # Examples
//!
//! ```
//! use opmodel_core::{Direction, ScalarKind, SemanticType, TypeToken};
//! use opmodel_introspector::classifier::{classify, EnumKind};
//!
//! let input = classify(&TypeToken::new("VipsImage"), Direction::Input, EnumKind::None);
//! assert_eq!(input.semantic, SemanticType::Image);
//! assert_eq!(input.representation, "VipsImage*");
//!
//! let output = classify(&TypeToken::new("VipsImage"), Direction::Output, EnumKind::None);
//! assert_eq!(output.semantic, SemanticType::Image);
//! assert_eq!(output.representation, "VipsImage**");
//!
//! let scalar = classify(&TypeToken::new("gdouble"), Direction::Input, EnumKind::None);
//! assert_eq!(scalar.semantic, SemanticType::scalar(ScalarKind::Double));
//! ```

use opmodel_core::{Direction, ElementType, HandleKind, ScalarKind, SemanticType, TypeToken};

/// Enum-ness of a token as reported by the discovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumKind {
    /// Not an enum or flags type.
    #[default]
    None,
    /// Plain enum.
    Enum,
    /// Bit flags.
    Flags,
}

impl EnumKind {
    /// Returns `true` for [`EnumKind::Enum`] and [`EnumKind::Flags`].
    #[must_use]
    pub const fn is_enum(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Result of classifying one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Semantic kind
    pub semantic: SemanticType,
    /// Suggested native representation, indirection included
    pub representation: String,
    /// `false` when the token fell through to the opaque fallback
    pub recognized: bool,
}

struct Rule {
    token: &'static str,
    semantic: SemanticType,
    representation: &'static str,
}

const fn rule(token: &'static str, semantic: SemanticType, representation: &'static str) -> Rule {
    Rule {
        token,
        semantic,
        representation,
    }
}

const RULES: &[Rule] = &[
    rule("VipsImage", SemanticType::Image, "VipsImage*"),
    rule("gint", SemanticType::scalar(ScalarKind::Int), "int"),
    rule("guint", SemanticType::scalar(ScalarKind::UInt), "guint"),
    rule("gint64", SemanticType::scalar(ScalarKind::Int64), "gint64"),
    rule("guint64", SemanticType::scalar(ScalarKind::UInt64), "guint64"),
    rule("gsize", SemanticType::scalar(ScalarKind::UInt64), "size_t"),
    rule("gdouble", SemanticType::scalar(ScalarKind::Double), "double"),
    rule("gfloat", SemanticType::scalar(ScalarKind::Float), "float"),
    rule("gboolean", SemanticType::scalar(ScalarKind::Bool), "gboolean"),
    rule("gchararray", SemanticType::scalar(ScalarKind::String), "const char*"),
    rule("VipsArrayDouble", SemanticType::array_of(ScalarKind::Double), "double*"),
    rule("VipsArrayInt", SemanticType::array_of(ScalarKind::Int), "int*"),
    rule("VipsArrayImage", SemanticType::ImageArray, "VipsImage**"),
    rule("VipsBlob", SemanticType::Buffer, "void*"),
    rule(
        "VipsInterpolate",
        SemanticType::Handle {
            handle: HandleKind::Interpolate,
        },
        "VipsInterpolate*",
    ),
    rule(
        "VipsSource",
        SemanticType::Handle {
            handle: HandleKind::Source,
        },
        "VipsSource*",
    ),
    rule(
        "VipsTarget",
        SemanticType::Handle {
            handle: HandleKind::Target,
        },
        "VipsTarget*",
    ),
];

/// Adds one level of indirection for output arguments.
///
/// `const` is dropped because the callee writes through the pointer.
#[must_use]
pub fn add_indirection(representation: &str) -> String {
    let base = representation.strip_prefix("const ").unwrap_or(representation);
    format!("{base}*")
}

fn with_direction(representation: &str, direction: Direction) -> String {
    match direction {
        Direction::Input => representation.to_string(),
        Direction::Output => add_indirection(representation),
    }
}

/// Classifies a native type token.
///
/// Never fails: unknown tokens become an opaque pointer with
/// `recognized == false` so the caller can log them.
#[must_use]
pub fn classify(token: &TypeToken, direction: Direction, enum_kind: EnumKind) -> Classification {
    if let Some(rule) = RULES.iter().find(|r| r.token == token.as_str()) {
        return Classification {
            semantic: rule.semantic,
            representation: with_direction(rule.representation, direction),
            recognized: true,
        };
    }

    match enum_kind {
        EnumKind::Enum | EnumKind::Flags => Classification {
            semantic: SemanticType::Enum {
                flags: matches!(enum_kind, EnumKind::Flags),
            },
            representation: with_direction(token.as_str(), direction),
            recognized: true,
        },
        EnumKind::None => Classification {
            semantic: SemanticType::opaque(),
            representation: with_direction("void*", direction),
            recognized: false,
        },
    }
}

/// Classifies the element token of an array.
///
/// Returns [`SemanticType::ImageArray`] for image elements, an array of the
/// element's scalar kind, or an array of enums. Returns `None` when the
/// element is neither.
#[must_use]
pub fn classify_array(element: &TypeToken, enum_kind: EnumKind) -> Option<SemanticType> {
    if enum_kind.is_enum() {
        return Some(SemanticType::Array {
            element: ElementType::Enum,
        });
    }
    match classify(element, Direction::Input, EnumKind::None).semantic {
        SemanticType::Image => Some(SemanticType::ImageArray),
        SemanticType::Scalar { scalar } => Some(SemanticType::array_of(scalar)),
        array @ (SemanticType::Array { .. } | SemanticType::ImageArray) => Some(array),
        SemanticType::Enum { .. } | SemanticType::Buffer | SemanticType::Handle { .. } => None,
    }
}

/// Returns the representation of an array of `semantic` elements.
#[must_use]
pub fn array_representation(semantic: SemanticType, enum_type: Option<&str>) -> String {
    match semantic {
        SemanticType::Array {
            element: ElementType::Scalar(scalar),
        } => format!("{}*", scalar_representation(scalar)),
        SemanticType::Array {
            element: ElementType::Enum,
        } => format!("{}*", enum_type.unwrap_or("int")),
        SemanticType::ImageArray => "VipsImage**".to_string(),
        _ => "void*".to_string(),
    }
}

/// Returns the input representation of a scalar kind.
#[must_use]
pub const fn scalar_representation(scalar: ScalarKind) -> &'static str {
    match scalar {
        ScalarKind::Bool => "gboolean",
        ScalarKind::Int => "int",
        ScalarKind::UInt => "guint",
        ScalarKind::Int64 => "gint64",
        ScalarKind::UInt64 => "guint64",
        ScalarKind::Double => "double",
        ScalarKind::Float => "float",
        ScalarKind::String => "const char*",
    }
}
