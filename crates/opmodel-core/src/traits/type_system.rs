//! Live reflection trait.
//!
//! [`TypeSystem`] is the subset of the native runtime's reflection API that
//! discovery needs: enumerate derived types, instantiate them, read class
//! metadata, walk declared parameters, and tell enums from flags.

use crate::TypeToken;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a native runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeHandle(u64);

impl TypeHandle {
    /// Wraps a raw native type id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw native type id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $bit:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            $(
                $(#[$fmeta])*
                pub const $flag: Self = Self($bit);
            )+

            /// Wraps raw native bits.
            #[inline]
            #[must_use]
            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }

            /// Returns the raw bits.
            #[inline]
            #[must_use]
            pub const fn bits(self) -> u32 {
                self.0
            }

            /// Returns `true` if every bit of `other` is set.
            #[inline]
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Returns the union of both sets.
            #[inline]
            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }
    };
}

flag_set! {
    /// Per-argument flags, bit-compatible with the native layout.
    ArgumentFlags {
        /// Must be set by the caller (inputs) or is always produced (outputs)
        REQUIRED = 1,
        /// Construct-time property
        CONSTRUCT = 2,
        /// Can only be set once
        SET_ONCE = 4,
        /// Set even when unchanged
        SET_ALWAYS = 8,
        /// Input argument
        INPUT = 16,
        /// Output argument
        OUTPUT = 32,
        /// Deprecated, skipped during discovery
        DEPRECATED = 64,
        /// Modified in place
        MODIFY = 128,
    }
}

flag_set! {
    /// Per-operation flags, bit-compatible with the native layout.
    OperationFlags {
        /// Sequential access
        SEQUENTIAL = 1,
        /// Results must not be cached
        NOCACHE = 4,
        /// Deprecated, skipped during discovery
        DEPRECATED = 8,
    }
}

/// Class-level metadata of an operation type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Short operation name (e.g. `"invert"`)
    pub nickname: String,
    /// One-line description
    pub description: String,
}

/// Native default value as reported by a parameter spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawDefault {
    /// Boolean default.
    Bool(bool),
    /// Signed integer default (int and int64 specs).
    Int(i64),
    /// Unsigned integer default (uint and uint64 specs).
    UInt(u64),
    /// Double default.
    Double(f64),
    /// Float default.
    Float(f32),
    /// String default; `None` for a null string.
    String(Option<String>),
    /// Enum or flags default.
    Enum(i64),
}

/// One declared parameter of an operation instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Parameter blurb
    pub description: String,
    /// Native type of the value
    pub value_type: TypeHandle,
    /// Name of the value type
    pub type_name: TypeToken,
    /// Argument flags
    pub flags: ArgumentFlags,
    /// Declared default
    pub default: Option<RawDefault>,
}

impl ParamSpec {
    /// Returns `true` if the parameter is an output.
    #[inline]
    #[must_use]
    pub const fn is_output(&self) -> bool {
        self.flags.contains(ArgumentFlags::OUTPUT)
    }

    /// Returns `true` if the parameter is required.
    #[inline]
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.flags.contains(ArgumentFlags::REQUIRED)
    }

    /// Returns `true` if the parameter is deprecated.
    #[inline]
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        self.flags.contains(ArgumentFlags::DEPRECATED)
    }
}

/// One member of a native enum or flags type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEnumValue {
    /// Full native name (e.g. `VIPS_ACCESS_RANDOM`)
    pub name: String,
    /// Nickname (e.g. `random`)
    pub nick: String,
    /// Integer value
    pub value: i64,
}

/// Transient native operation instance.
///
/// Dropping the instance releases the native reference; the walker keeps at
/// most one alive at a time.
pub trait OperationInstance {
    /// Runtime operation flags.
    fn flags(&self) -> OperationFlags;

    /// Calls `visit` once per declared parameter, in declaration order.
    fn walk_arguments(&self, visit: &mut dyn FnMut(&ParamSpec));
}

/// Live reflection API of the native runtime.
///
/// # Examples
///
/// ```
/// use opmodel_core::traits::{
///     ClassInfo, OperationFlags, OperationInstance, ParamSpec, RawEnumValue, TypeHandle,
///     TypeSystem,
/// };
///
/// struct Empty;
/// struct NoInstance;
///
/// impl OperationInstance for NoInstance {
///     fn flags(&self) -> OperationFlags {
///         OperationFlags::default()
///     }
///
///     fn walk_arguments(&self, _visit: &mut dyn FnMut(&ParamSpec)) {}
/// }
///
/// impl TypeSystem for Empty {
///     type Instance = NoInstance;
///
///     fn type_from_name(&self, _name: &str) -> Option<TypeHandle> {
///         None
///     }
///     fn type_name(&self, _ty: TypeHandle) -> Option<String> {
///         None
///     }
///     fn children(&self, _ty: TypeHandle) -> Vec<TypeHandle> {
///         Vec::new()
///     }
///     fn is_abstract(&self, _ty: TypeHandle) -> bool {
///         true
///     }
///     fn class_info(&self, _ty: TypeHandle) -> ClassInfo {
///         ClassInfo::default()
///     }
///     fn instantiate(&self, _ty: TypeHandle) -> Option<NoInstance> {
///         None
///     }
///     fn is_enum(&self, _ty: TypeHandle) -> bool {
///         false
///     }
///     fn is_flags(&self, _ty: TypeHandle) -> bool {
///         false
///     }
///     fn enum_values(&self, _ty: TypeHandle) -> Vec<RawEnumValue> {
///         Vec::new()
///     }
/// }
///
/// assert!(Empty.type_from_name("VipsOperation").is_none());
/// ```
pub trait TypeSystem {
    /// Transient instance type returned by [`instantiate`](Self::instantiate).
    type Instance: OperationInstance;

    /// Resolves a type by native name.
    fn type_from_name(&self, name: &str) -> Option<TypeHandle>;

    /// Returns the native name of a type.
    fn type_name(&self, ty: TypeHandle) -> Option<String>;

    /// Returns the direct descendants of a type.
    fn children(&self, ty: TypeHandle) -> Vec<TypeHandle>;

    /// Returns `true` for abstract types, which cannot be instantiated.
    fn is_abstract(&self, ty: TypeHandle) -> bool;

    /// Returns class nickname and description.
    fn class_info(&self, ty: TypeHandle) -> ClassInfo;

    /// Creates a transient instance, or `None` if instantiation fails.
    fn instantiate(&self, ty: TypeHandle) -> Option<Self::Instance>;

    /// Returns `true` if the type is an enum.
    fn is_enum(&self, ty: TypeHandle) -> bool;

    /// Returns `true` if the type is a flags type.
    fn is_flags(&self, ty: TypeHandle) -> bool;

    /// Returns the ordered members of an enum or flags type.
    fn enum_values(&self, ty: TypeHandle) -> Vec<RawEnumValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_flags_layout() {
        let flags = ArgumentFlags::REQUIRED | ArgumentFlags::INPUT;
        assert_eq!(flags.bits(), 17);
        assert!(flags.contains(ArgumentFlags::INPUT));
        assert!(!flags.contains(ArgumentFlags::OUTPUT));
        assert_eq!(ArgumentFlags::MODIFY.bits(), 128);
    }

    #[test]
    fn test_param_spec_predicates() {
        let spec = ParamSpec {
            name: "out".to_string(),
            description: String::new(),
            value_type: TypeHandle::new(7),
            type_name: TypeToken::new("VipsImage"),
            flags: ArgumentFlags::from_bits(1 | 32 | 64),
            default: None,
        };
        assert!(spec.is_output());
        assert!(spec.is_required());
        assert!(spec.is_deprecated());
    }

    #[test]
    fn test_operation_deprecated_bit() {
        assert!(OperationFlags::from_bits(9).contains(OperationFlags::DEPRECATED));
        assert!(!OperationFlags::default().contains(OperationFlags::DEPRECATED));
    }
}
