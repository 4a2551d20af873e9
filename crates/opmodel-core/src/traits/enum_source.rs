//! Lazy enum value lookup.

use super::RawEnumValue;

/// Supplies enum members by native type name.
///
/// Implemented by the live reflection adapter and by the parsed static
/// metadata document, so the registry fetches values the same way on both
/// discovery paths.
pub trait EnumValueSource {
    /// Returns the ordered members of `native_name`, or `None` if the type is
    /// unknown to this source.
    fn enum_values(&self, native_name: &str) -> Option<Vec<RawEnumValue>>;

    /// Returns `true` if `native_name` is a bit-flags type.
    fn is_flags_type(&self, native_name: &str) -> bool;
}

/// A source that knows no enums; every lookup misses.
impl EnumValueSource for () {
    fn enum_values(&self, _native_name: &str) -> Option<Vec<RawEnumValue>> {
        None
    }

    fn is_flags_type(&self, _native_name: &str) -> bool {
        false
    }
}
