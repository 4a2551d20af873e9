//! Argument builder.
//!
//! Turns the native parameter descriptions of one operation into normalized
//! [`Argument`]s. Rules run in a fixed order: direction, array detection,
//! enum resolution and defaults per parameter, then buffer pairing and
//! companion lengths across the whole parameter list.

use crate::classifier::{EnumKind, add_indirection, array_representation, classify, classify_array};
use crate::discovery::DiscoveryContext;
use opmodel_core::naming::argument_target_name;
use opmodel_core::traits::RawDefault;
use opmodel_core::{
    Argument, ArrayLength, DefaultValue, Diagnostic, DiagnosticKind, Direction, ElementType,
    Error, ScalarKind, SemanticType, TypeToken,
};

const OUTPUT_NAME: &str = "out";
const OUTPUT_VECTOR_NAMES: &[&str] = &["vector", "out_array"];
const GENERIC_COUNT_NAMES: &[&str] = &["n", "count"];
const BUFFER_NAMES: &[&str] = &["buf", "buffer"];
const BUFFER_LENGTH_NAMES: &[&str] = &["len", "length", "size"];

/// Declared length of an array parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLengthHint {
    /// Statically known element count.
    Fixed(usize),
    /// Terminated by a sentinel element.
    ZeroTerminated,
    /// Position of the companion length parameter in the same list.
    Index(usize),
}

/// Explicit array metadata of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayHint {
    /// Element type token
    pub element: TypeToken,
    /// Enum-ness of the element type
    pub element_enum: EnumKind,
    /// Declared length, if any
    pub length: Option<ArrayLengthHint>,
}

/// One native parameter, as reported by either discovery path.
///
/// # Examples
///
/// ```
/// use opmodel_core::Direction;
/// use opmodel_introspector::argument::NativeParam;
///
/// let param = NativeParam::new("out", "VipsImage")
///     .with_direction(Direction::Output)
///     .with_c_type("VipsImage**");
/// assert!(param.required);
/// assert_eq!(param.c_type, "VipsImage**");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NativeParam {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Native type token
    pub type_token: TypeToken,
    /// Declared C type, empty when unknown
    pub c_type: String,
    /// Explicit direction, if the metadata declares one
    pub direction: Option<Direction>,
    /// Required flag
    pub required: bool,
    /// Enum-ness of the type token
    pub enum_kind: EnumKind,
    /// Explicit array metadata
    pub array: Option<ArrayHint>,
    /// Declared default
    pub default: Option<RawDefault>,
}

impl NativeParam {
    /// Creates a required parameter with no further metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, type_token: impl Into<TypeToken>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            type_token: type_token.into(),
            c_type: String::new(),
            direction: None,
            required: true,
            enum_kind: EnumKind::None,
            array: None,
            default: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the declared C type.
    #[must_use]
    pub fn with_c_type(mut self, c_type: impl Into<String>) -> Self {
        self.c_type = c_type.into();
        self
    }

    /// Sets an explicit direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Marks the parameter optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the enum-ness of the type token.
    #[must_use]
    pub const fn with_enum_kind(mut self, enum_kind: EnumKind) -> Self {
        self.enum_kind = enum_kind;
        self
    }

    /// Attaches explicit array metadata.
    #[must_use]
    pub fn with_array(mut self, array: ArrayHint) -> Self {
        self.array = Some(array);
        self
    }

    /// Sets the declared default.
    #[must_use]
    pub fn with_default(mut self, default: RawDefault) -> Self {
        self.default = Some(default);
        self
    }

    fn pointer_depth(&self) -> usize {
        self.c_type.matches('*').count() + self.c_type.matches("[]").count()
    }
}

struct ArrayShape {
    semantic: SemanticType,
    element: TypeToken,
    element_enum: EnumKind,
    length: Option<ArrayLength>,
}

/// Builds arguments against a discovery context.
///
/// Registers enum types as a side effect and records a diagnostic for every
/// unknown type token or ambiguous array length.
#[derive(Debug)]
pub struct ArgumentBuilder<'a> {
    ctx: &'a mut DiscoveryContext,
}

impl<'a> ArgumentBuilder<'a> {
    /// Creates a builder writing into `ctx`.
    pub const fn new(ctx: &'a mut DiscoveryContext) -> Self {
        Self { ctx }
    }

    /// Builds a single argument without looking at its siblings.
    ///
    /// Buffer pairing and companion lengths need the whole list; use
    /// [`build_all`](Self::build_all) for complete operations.
    pub fn build(&mut self, operation: &str, param: &NativeParam) -> Argument {
        self.draft(operation, param, std::slice::from_ref(param))
    }

    /// Builds every argument of one operation, in declaration order.
    ///
    /// Synthesized length arguments are inserted right after their buffer
    /// or appended at the end for arrays.
    pub fn build_all(&mut self, operation: &str, params: &[NativeParam]) -> Vec<Argument> {
        let mut arguments: Vec<Argument> = params
            .iter()
            .map(|param| self.draft(operation, param, params))
            .collect();
        link_buffers(operation, &mut arguments);
        self.link_array_lengths(operation, &mut arguments);
        arguments
    }

    fn draft(&mut self, operation: &str, param: &NativeParam, siblings: &[NativeParam]) -> Argument {
        let shape = detect_array(param, siblings);
        let direction = resolve_direction(param, shape.is_some());
        let mut enum_type = None;

        let (semantic, representation, array_length) = if let Some(shape) = shape {
            let mut semantic = shape.semantic;
            if matches!(
                semantic,
                SemanticType::Array {
                    element: ElementType::Enum
                }
            ) {
                let flags = matches!(shape.element_enum, EnumKind::Flags);
                enum_type = self.register_enum(&shape.element, flags);
                if enum_type.is_none() {
                    semantic = SemanticType::array_of(ScalarKind::Int);
                }
            }
            let base = array_representation(semantic, enum_type.as_deref());
            let representation = match direction {
                Direction::Input => base,
                Direction::Output => add_indirection(&base),
            };
            (semantic, representation, shape.length)
        } else {
            let classification = classify(&param.type_token, direction, param.enum_kind);
            if !classification.recognized {
                self.ctx.record(Diagnostic::new(
                    DiagnosticKind::UnknownType,
                    format!("{operation}.{}", param.name),
                    format!("unrecognized type '{}', treated as opaque", param.type_token),
                ));
            }
            let mut semantic = classification.semantic;
            let mut representation = classification.representation;
            if let SemanticType::Enum { flags } = semantic {
                enum_type = self.register_enum(&param.type_token, flags);
                if enum_type.is_none() {
                    semantic = SemanticType::scalar(ScalarKind::Int);
                    representation = classify(&TypeToken::new("gint"), direction, EnumKind::None)
                        .representation;
                }
            }
            (semantic, representation, None)
        };

        let mut argument = Argument::new(
            param.name.as_str(),
            argument_target_name(&param.name),
            semantic,
            param.type_token.clone(),
            direction,
        );
        argument.description.clone_from(&param.description);
        argument.representation = representation;
        argument.required = param.required;
        argument.array_length = array_length;
        argument.default = param
            .default
            .as_ref()
            .and_then(|raw| convert_default(raw, enum_type.as_deref()));
        argument.enum_type = enum_type;

        tracing::trace!(
            operation,
            argument = %argument.name,
            semantic = %argument.semantic,
            representation = %argument.representation,
            direction = ?argument.direction,
            "built argument"
        );
        argument
    }

    fn register_enum(&mut self, token: &TypeToken, flags: bool) -> Option<String> {
        self.ctx
            .enums_mut()
            .register(token.as_str(), flags)
            .map(|_| token.as_str().to_string())
    }

    fn link_array_lengths(&mut self, operation: &str, arguments: &mut Vec<Argument>) {
        let declared: Vec<(String, String)> = arguments
            .iter()
            .filter_map(|a| {
                a.array_length
                    .as_ref()
                    .and_then(ArrayLength::companion)
                    .map(|c| (a.name.clone(), c.to_string()))
            })
            .collect();
        for (owner, companion) in declared {
            if let Some(arg) = arguments.iter_mut().find(|a| a.name == companion) {
                mark_companion(arg, &owner);
            }
        }

        let pending: Vec<usize> = arguments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_array() && a.array_length.is_none())
            .map(|(i, _)| i)
            .collect();
        let existing = arguments.len();
        // One synthesized count per direction, shared by every array in it.
        let mut synthesized: Vec<(Direction, String)> = Vec::new();

        for &index in &pending {
            let owner = arguments[index].name.clone();
            let direction = arguments[index].direction;
            let group = pending
                .iter()
                .filter(|&&i| arguments[i].direction == direction)
                .count();

            let find = |name: &str, shared: bool| {
                arguments[..existing].iter().position(|a| {
                    a.name == name
                        && a.direction == direction
                        && is_integer(a.semantic)
                        && (shared || a.length_of.as_deref().is_none_or(|o| o == owner))
                })
            };
            let specific = [format!("{owner}_n"), format!("{owner}_count")];
            let found = specific
                .iter()
                .find_map(|name| find(name, false))
                .map(|at| (at, true))
                .or_else(|| {
                    GENERIC_COUNT_NAMES
                        .iter()
                        .find_map(|name| find(name, true))
                        .map(|at| (at, group == 1))
                });

            let (companion, verified) = if let Some((at, verified)) = found {
                mark_companion(&mut arguments[at], &owner);
                (arguments[at].name.clone(), verified)
            } else if let Some(name) = shared_count(&synthesized, direction) {
                tracing::trace!(operation, array = %owner, companion = %name, "sharing synthesized array length");
                (name, true)
            } else {
                let name = if arguments.iter().any(|a| a.name == "n") {
                    format!("{owner}_n")
                } else {
                    "n".to_string()
                };
                tracing::debug!(operation, array = %owner, companion = %name, "synthesized array length");
                arguments.push(count_argument(&name, &owner, direction));
                synthesized.push((direction, name.clone()));
                (name, true)
            };

            if !verified {
                self.ctx.record_error(&Error::AmbiguousArrayLength {
                    operation: operation.to_string(),
                    argument: owner.clone(),
                });
            }
            arguments[index].array_length = Some(ArrayLength::Companion {
                argument: companion,
                verified,
            });
        }
    }
}

fn shared_count(synthesized: &[(Direction, String)], direction: Direction) -> Option<String> {
    synthesized
        .iter()
        .find(|(d, _)| *d == direction)
        .map(|(_, name)| name.clone())
}

fn detect_array(param: &NativeParam, siblings: &[NativeParam]) -> Option<ArrayShape> {
    if let Some(hint) = &param.array {
        if let Some(semantic) = classify_array(&hint.element, hint.element_enum) {
            let length = hint.length.and_then(|length| match length {
                ArrayLengthHint::Fixed(size) => Some(ArrayLength::Fixed { size }),
                ArrayLengthHint::ZeroTerminated => Some(ArrayLength::ZeroTerminated),
                ArrayLengthHint::Index(at) => siblings
                    .get(at)
                    .filter(|s| s.name != param.name)
                    .map(|s| ArrayLength::Companion {
                        argument: s.name.clone(),
                        verified: true,
                    }),
            });
            return Some(ArrayShape {
                semantic,
                element: hint.element.clone(),
                element_enum: hint.element_enum,
                length,
            });
        }
    }

    let base = classify(&param.type_token, Direction::Input, EnumKind::None).semantic;
    if base.is_array() {
        return Some(ArrayShape {
            semantic: base,
            element: param.type_token.clone(),
            element_enum: EnumKind::None,
            length: None,
        });
    }

    let SemanticType::Scalar { scalar } = base else {
        return None;
    };
    if matches!(scalar, ScalarKind::String | ScalarKind::Bool) {
        return None;
    }

    // Outputs carry one pointer level for the scalar itself.
    let scalar_depth = usize::from(param.direction.is_some_and(Direction::is_output));
    if param.pointer_depth() <= scalar_depth {
        return None;
    }

    let vector = OUTPUT_VECTOR_NAMES.contains(&param.name.as_str());
    let counted = siblings.iter().any(|s| {
        s.name != param.name
            && (GENERIC_COUNT_NAMES.contains(&s.name.as_str())
                || s.name == format!("{}_n", param.name)
                || s.name == format!("{}_count", param.name))
    });

    (vector || counted).then(|| ArrayShape {
        semantic: SemanticType::array_of(scalar),
        element: param.type_token.clone(),
        element_enum: EnumKind::None,
        length: None,
    })
}

fn resolve_direction(param: &NativeParam, is_array: bool) -> Direction {
    if let Some(direction) = param.direction {
        return direction;
    }
    let name = param.name.as_str();
    let output = name == OUTPUT_NAME
        || (is_array && OUTPUT_VECTOR_NAMES.contains(&name))
        || (!is_array && param.pointer_depth() >= 2);
    if output {
        Direction::Output
    } else {
        Direction::Input
    }
}

fn convert_default(raw: &RawDefault, enum_type: Option<&str>) -> Option<DefaultValue> {
    match raw {
        RawDefault::Bool(value) => Some(DefaultValue::Bool(*value)),
        RawDefault::Int(value) => Some(DefaultValue::Int(*value)),
        RawDefault::UInt(value) => i64::try_from(*value).ok().map(DefaultValue::Int),
        RawDefault::Double(value) => Some(DefaultValue::Double(*value)),
        RawDefault::Float(value) => Some(DefaultValue::Double(f64::from(*value))),
        RawDefault::String(value) => value.clone().map(DefaultValue::String),
        RawDefault::Enum(value) => Some(enum_type.map_or(DefaultValue::Int(*value), |t| {
            DefaultValue::Enum {
                value: *value,
                enum_type: t.to_string(),
            }
        })),
    }
}

const fn is_integer(semantic: SemanticType) -> bool {
    matches!(
        semantic,
        SemanticType::Scalar {
            scalar: ScalarKind::Int | ScalarKind::UInt | ScalarKind::Int64 | ScalarKind::UInt64
        }
    )
}

fn is_named_buffer(argument: &Argument) -> bool {
    argument.is_buffer() && BUFFER_NAMES.contains(&argument.name.as_str())
}

fn mark_companion(argument: &mut Argument, owner: &str) {
    argument.derived = true;
    if argument.length_of.is_none() {
        argument.length_of = Some(owner.to_string());
    }
}

fn count_argument(name: &str, owner: &str, direction: Direction) -> Argument {
    let mut argument = Argument::new(
        name,
        argument_target_name(name),
        SemanticType::scalar(ScalarKind::Int),
        "gint",
        direction,
    );
    argument.representation = classify(&TypeToken::new("gint"), direction, EnumKind::None).representation;
    argument.derived = true;
    argument.length_of = Some(owner.to_string());
    if matches!(direction, Direction::Input) {
        argument.default = Some(DefaultValue::Int(1));
    }
    argument
}

fn length_argument(owner: &str, direction: Direction) -> Argument {
    let mut argument = Argument::new(
        "len",
        "len",
        SemanticType::scalar(ScalarKind::UInt64),
        "gsize",
        direction,
    );
    argument.representation = classify(&TypeToken::new("gsize"), direction, EnumKind::None).representation;
    argument.description = format!("length of {owner} in bytes");
    argument.derived = true;
    argument.length_of = Some(owner.to_string());
    argument
}

/// Pairs raw memory parameters named `buf`/`buffer` with their byte count.
///
/// Inputs take a trailing `len`/`length`/`size`, synthesized for
/// `*_buffer` operations that lack one. Save-to-buffer outputs become a
/// required `void**` plus `size_t*` pair.
fn link_buffers(operation: &str, arguments: &mut Vec<Argument>) {
    let save_to_buffer = operation.ends_with("save_buffer");
    let mut index = 0;

    while index < arguments.len() {
        if !is_named_buffer(&arguments[index]) {
            index += 1;
            continue;
        }

        let direction = arguments[index].direction;
        let promote = direction.is_output() && save_to_buffer;
        if promote {
            arguments[index].required = true;
            arguments[index].representation = "void**".to_string();
        }

        let found = match direction {
            Direction::Input => arguments.get(index + 1).and_then(|a| {
                (BUFFER_LENGTH_NAMES.contains(&a.name.as_str()) && is_integer(a.semantic))
                    .then_some(index + 1)
            }),
            Direction::Output => arguments
                .iter()
                .position(|a| a.name == "len" && is_integer(a.semantic)),
        };

        let owner = arguments[index].name.clone();
        let companion = found.or_else(|| {
            let synthesize = match direction {
                Direction::Input => operation.contains("_buffer"),
                Direction::Output => save_to_buffer,
            };
            synthesize.then(|| {
                tracing::debug!(operation, buffer = %owner, "synthesized buffer length");
                arguments.insert(index + 1, length_argument(&owner, direction));
                index + 1
            })
        });

        if let Some(at) = companion {
            let length = &mut arguments[at];
            mark_companion(length, &owner);
            if promote {
                length.direction = Direction::Output;
                length.required = true;
                length.representation = "size_t*".to_string();
            }
            let argument = length.name.clone();
            arguments[index].array_length = Some(ArrayLength::Companion {
                argument,
                verified: true,
            });
        }
        index += 1;
    }
}
