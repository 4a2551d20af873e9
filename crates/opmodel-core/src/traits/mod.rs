//! Seams between discovery and its native inputs.
//!
//! # Module Structure
//!
//! - `type_system` - live reflection over the native runtime type system
//! - `enum_source` - lazy enum value lookup shared by both discovery paths
//!
//! Discovery code is written against these traits only, so tests and
//! benches can run without the native library.

mod enum_source;
mod type_system;

pub use enum_source::EnumValueSource;
pub use type_system::{
    ArgumentFlags, ClassInfo, OperationFlags, OperationInstance, ParamSpec, RawDefault,
    RawEnumValue, TypeHandle, TypeSystem,
};
