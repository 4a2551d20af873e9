//! Identifier conversion helpers.
//!
//! Every target name in the model is produced here so that the live and
//! static discovery paths agree on spelling.
//!
//! # Examples
//!
//! ```
//! use opmodel_core::naming;
//!
//! assert_eq!(naming::operation_target_name("extract_area"), "ExtractArea");
//! assert_eq!(naming::argument_target_name("out_array"), "outArray");
//! assert_eq!(naming::enum_target_name("VipsForeignKeep", "Vips", "Foreign"), "Keep");
//! ```

/// Words that cannot be used verbatim as target identifiers.
const RESERVED_WORDS: &[&str] = &[
    "type", "func", "map", "range", "select", "case", "default", "fn", "impl", "match", "ref",
    "move", "loop", "struct", "enum", "trait", "where", "use", "mod",
];

/// Converts a snake_case name to camelCase.
///
/// # Examples
///
/// ```
/// use opmodel_core::naming::to_camel_case;
///
/// assert_eq!(to_camel_case("out_array"), "outArray");
/// assert_eq!(to_camel_case("hello"), "hello");
/// ```
#[must_use]
pub fn to_camel_case(snake_case: &str) -> String {
    let mut result = String::with_capacity(snake_case.len());
    let mut capitalize_next = false;

    for ch in snake_case.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(ch.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }

    result
}

/// Converts a snake_case name to PascalCase.
///
/// Only the first character of each part changes case, so mixed-case names
/// such as `Lab2XYZ` keep their spelling.
///
/// # Examples
///
/// ```
/// use opmodel_core::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("extract_area"), "ExtractArea");
/// assert_eq!(to_pascal_case("Lab2XYZ"), "Lab2XYZ");
/// ```
#[must_use]
pub fn to_pascal_case(snake_case: &str) -> String {
    let camel = to_camel_case(snake_case);
    let mut chars = camel.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Target identifier of an operation.
///
/// Two native names that differ only in underscore placement map to the same
/// identifier; the filter stage relies on this to find duplicates.
#[must_use]
pub fn operation_target_name(name: &str) -> String {
    to_pascal_case(name)
}

/// Escapes reserved words and normalizes dashes in a native parameter name.
///
/// # Examples
///
/// ```
/// use opmodel_core::naming::escape_identifier;
///
/// assert_eq!(escape_identifier("type"), "type_");
/// assert_eq!(escape_identifier("page-height"), "page_height");
/// ```
#[must_use]
pub fn escape_identifier(name: &str) -> String {
    if RESERVED_WORDS.contains(&name) {
        return format!("{name}_");
    }
    name.replace('-', "_")
}

/// Target identifier of an argument: escaped, then lower camelCase.
#[must_use]
pub fn argument_target_name(name: &str) -> String {
    let escaped = escape_identifier(name);
    if escaped.ends_with('_') {
        return escaped;
    }
    let camel = to_camel_case(&escaped);
    let mut chars = camel.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Strips the namespace prefix, then the sub-prefix, from a native type name.
#[must_use]
pub fn enum_target_name(native_name: &str, namespace: &str, sub_prefix: &str) -> String {
    let name = native_name.strip_prefix(namespace).unwrap_or(native_name);
    let name = name.strip_prefix(sub_prefix).unwrap_or(name);
    name.to_string()
}

/// Title-cases each underscore-separated part of an upper-case value name.
fn title_parts(value: &str) -> String {
    value
        .to_lowercase()
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect()
}

/// Target name of one enum value.
///
/// The native value name is title-cased part by part. If it already carries
/// the namespace and type name (with or without sub-prefix) those prefixes are
/// stripped; otherwise the owning type's target name is prepended.
///
/// # Examples
///
/// ```
/// use opmodel_core::naming::enum_value_target_name;
///
/// assert_eq!(
///     enum_value_target_name("Interpretation", "VIPS_INTERPRETATION_sRGB", "Vips", "Foreign"),
///     "InterpretationSrgb"
/// );
/// assert_eq!(
///     enum_value_target_name("Keep", "VIPS_FOREIGN_KEEP_EXIF", "Vips", "Foreign"),
///     "KeepExif"
/// );
/// assert_eq!(enum_value_target_name("Access", "random", "Vips", "Foreign"), "AccessRandom");
/// ```
#[must_use]
pub fn enum_value_target_name(
    type_target: &str,
    value_native: &str,
    namespace: &str,
    sub_prefix: &str,
) -> String {
    let camel = title_parts(value_native);
    let lower = camel.to_lowercase();
    let lower_type = type_target.to_lowercase();
    let lower_ns = namespace.to_lowercase();
    let lower_sub = sub_prefix.to_lowercase();

    let prefixed = lower.starts_with(&format!("{lower_ns}{lower_type}"))
        || lower.starts_with(&format!("{lower_ns}{lower_sub}{lower_type}"));
    let stripped = enum_target_name(&camel, namespace, sub_prefix);

    if prefixed {
        stripped
    } else {
        format!("{type_target}{stripped}")
    }
}
