//! Run-scoped enum and format registries.
//!
//! The enum registry is shared by both discovery paths through the
//! [`DiscoveryContext`](crate::DiscoveryContext); the format table is
//! computed once from the merged operation names.

mod enums;
mod formats;

pub use enums::EnumRegistry;
pub use formats::{
    BASELINE_FORMATS, FormatTable, UNKNOWN_MEMBER, enum_member, mime_type, normalize_format,
};
