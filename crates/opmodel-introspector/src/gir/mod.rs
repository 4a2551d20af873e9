//! Static metadata discovery from a GIR document.
//!
//! The document is read into memory, its namespaced attribute names are
//! normalized (`c:type` becomes `c-type`), and the result is decoded with
//! `quick-xml`'s serde support. Decoding failures are fatal; every
//! per-function problem is recorded as a diagnostic and skipped.

mod doc;
mod schema;

use crate::argument::{ArrayHint, ArrayLengthHint, NativeParam};
use crate::classifier::EnumKind;
use crate::discovery::{Discovery, DiscoveryContext, build_operation};
use opmodel_core::traits::{EnumValueSource, RawEnumValue};
use opmodel_core::{
    Diagnostic, DiagnosticKind, Direction, DiscoverySource, Error, Operation, Result, TypeToken,
};
use regex::Regex;
use schema::{Enumeration, Function, Parameter, Repository, TypeRef};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static START_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z_][^<>]*>").expect("valid regex"));

static NAMESPACED_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\s)([A-Za-z_][\w.]*):([A-Za-z_][\w.-]*)(\s*=)").expect("valid regex")
});

/// GIR type names and C base types mapped to native type tokens.
const TYPE_ALIASES: &[(&str, &str)] = &[
    ("gint", "gint"),
    ("int", "gint"),
    ("guint", "guint"),
    ("gint64", "gint64"),
    ("guint64", "guint64"),
    ("gsize", "gsize"),
    ("size_t", "gsize"),
    ("gdouble", "gdouble"),
    ("double", "gdouble"),
    ("gfloat", "gfloat"),
    ("float", "gfloat"),
    ("gboolean", "gboolean"),
    ("utf8", "gchararray"),
    ("filename", "gchararray"),
    ("gchararray", "gchararray"),
    ("char", "gchararray"),
    ("gchar", "gchararray"),
    ("Image", "VipsImage"),
    ("VipsImage", "VipsImage"),
    ("Blob", "VipsBlob"),
    ("VipsBlob", "VipsBlob"),
    ("Source", "VipsSource"),
    ("VipsSource", "VipsSource"),
    ("Target", "VipsTarget"),
    ("VipsTarget", "VipsTarget"),
    ("Interpolate", "VipsInterpolate"),
    ("VipsInterpolate", "VipsInterpolate"),
    ("ArrayDouble", "VipsArrayDouble"),
    ("VipsArrayDouble", "VipsArrayDouble"),
    ("ArrayInt", "VipsArrayInt"),
    ("VipsArrayInt", "VipsArrayInt"),
    ("ArrayImage", "VipsArrayImage"),
    ("VipsArrayImage", "VipsArrayImage"),
];

const UNTYPED_POINTERS: &[&str] = &["gpointer", "void"];
const BUFFER_NAMES: &[&str] = &["buf", "buffer"];

/// Rewrites `prefix:name=` attributes to `prefix-name=`.
///
/// Only start tags are touched; text content such as `<doc>` bodies is
/// left as written.
///
/// # Examples
///
/// ```
/// use opmodel_introspector::gir::normalize_attributes;
///
/// let xml = r#"<type name="gint" c:type="int"/>"#;
/// assert_eq!(normalize_attributes(xml), r#"<type name="gint" c-type="int"/>"#);
/// ```
#[must_use]
pub fn normalize_attributes(xml: &str) -> Cow<'_, str> {
    START_TAG.replace_all(xml, |tag: &regex::Captures<'_>| {
        NAMESPACED_ATTRIBUTE
            .replace_all(&tag[0], "${1}${2}-${3}${4}")
            .into_owned()
    })
}

fn strip_c_type(c_type: &str) -> String {
    c_type
        .replace("const ", "")
        .replace(['*', '[', ']'], "")
        .trim()
        .to_string()
}

fn enum_entry(enumeration: &Enumeration, flags: bool) -> (String, EnumEntry) {
    let native = enumeration
        .c_type
        .clone()
        .unwrap_or_else(|| enumeration.name.clone());
    let values = enumeration
        .members
        .iter()
        .filter_map(|member| {
            let value = member.value.as_deref()?.trim().parse::<i64>().ok();
            if value.is_none() {
                tracing::trace!(member = %member.name, "skipping member without integer value");
            }
            Some(RawEnumValue {
                name: member
                    .c_identifier
                    .clone()
                    .unwrap_or_else(|| member.name.to_uppercase()),
                nick: member.nick.clone().unwrap_or_else(|| member.name.clone()),
                value: value?,
            })
        })
        .collect();
    (
        native,
        EnumEntry {
            short_name: enumeration.name.clone(),
            flags,
            values,
        },
    )
}

#[derive(Debug, Clone)]
struct EnumEntry {
    short_name: String,
    flags: bool,
    values: Vec<RawEnumValue>,
}

/// Static discovery path over one parsed GIR document.
///
/// # Examples
///
/// ```
/// use opmodel_core::ModelConfig;
/// use opmodel_introspector::{Discovery, DiscoveryContext, gir::StaticDiscovery};
///
/// let xml = r#"<repository><namespace name="Vips">
///   <function name="invert" c:identifier="vips_invert">
///     <parameters>
///       <parameter name="in"><type name="Image" c:type="VipsImage*"/></parameter>
///       <parameter name="out" direction="out"><type name="Image" c:type="VipsImage**"/></parameter>
///     </parameters>
///   </function>
/// </namespace></repository>"#;
///
/// let discovery = StaticDiscovery::parse("inline", xml)?;
/// let mut ctx = DiscoveryContext::new(ModelConfig::default());
/// let operations = discovery.discover(&mut ctx)?;
///
/// assert_eq!(operations[0].name.as_str(), "invert");
/// assert_eq!(operations[0].call_target.as_deref(), Some("vips_invert"));
/// # Ok::<(), opmodel_core::Error>(())
/// ```
#[derive(Debug)]
pub struct StaticDiscovery {
    document: String,
    repository: Repository,
    enums: HashMap<String, EnumEntry>,
    short_names: HashMap<String, String>,
}

impl StaticDiscovery {
    /// Decodes a GIR document held in memory.
    ///
    /// `document` labels the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MetadataDecode`] if the document is not valid GIR.
    pub fn parse(document: impl Into<String>, xml: &str) -> Result<Self> {
        let document = document.into();
        let normalized = normalize_attributes(xml);
        let repository: Repository =
            quick_xml::de::from_str(&normalized).map_err(|e| Error::MetadataDecode {
                message: e.to_string(),
                document: document.clone(),
                source: Some(Box::new(e)),
            })?;

        if repository.namespaces.is_empty() {
            return Err(Error::MetadataDecode {
                document,
                message: "document declares no namespace".to_string(),
                source: None,
            });
        }

        let mut enums = HashMap::new();
        let mut short_names = HashMap::new();
        for namespace in &repository.namespaces {
            let declared = namespace
                .enumerations
                .iter()
                .map(|e| enum_entry(e, false))
                .chain(namespace.bitfields.iter().map(|e| enum_entry(e, true)));
            for (native, entry) in declared {
                short_names.insert(entry.short_name.clone(), native.clone());
                enums.insert(native, entry);
            }
        }

        tracing::info!(
            document = %document,
            namespaces = repository.namespaces.len(),
            enums = enums.len(),
            "decoded metadata document"
        );
        Ok(Self {
            document,
            repository,
            enums,
            short_names,
        })
    }

    /// Reads and decodes a GIR file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MetadataRead`] if the file cannot be read and
    /// [`Error::MetadataDecode`] if it is not valid GIR.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| Error::MetadataRead {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = xml.len(), "read metadata document");
        Self::parse(path.display().to_string(), &xml)
    }

    /// Label of the decoded document.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    fn resolve_enum(&self, name: &str) -> Option<(&str, EnumKind)> {
        let name = name.rsplit('.').next().unwrap_or(name);
        let (native, entry) = self
            .enums
            .get_key_value(name)
            .or_else(|| {
                self.short_names
                    .get(name)
                    .and_then(|native| self.enums.get_key_value(native))
            })?;
        let kind = if entry.flags {
            EnumKind::Flags
        } else {
            EnumKind::Enum
        };
        Some((native.as_str(), kind))
    }

    /// Maps a GIR type reference to a native token and its enum-ness.
    fn resolve_type(&self, type_ref: &TypeRef, param_name: &str) -> (TypeToken, EnumKind) {
        let name = type_ref
            .name
            .as_deref()
            .map(|n| n.rsplit('.').next().unwrap_or(n))
            .unwrap_or_default();
        let base = type_ref.c_type.as_deref().map(strip_c_type).unwrap_or_default();

        for candidate in [name, base.as_str()] {
            if candidate.is_empty() {
                continue;
            }
            if let Some((_, token)) = TYPE_ALIASES.iter().find(|(alias, _)| *alias == candidate) {
                return (TypeToken::new(*token), EnumKind::None);
            }
            if let Some((native, kind)) = self.resolve_enum(candidate) {
                return (TypeToken::new(native), kind);
            }
        }

        let untyped = [name, base.as_str()]
            .iter()
            .any(|c| UNTYPED_POINTERS.contains(c));
        if untyped && BUFFER_NAMES.contains(&param_name) {
            return (TypeToken::new("VipsBlob"), EnumKind::None);
        }

        let fallback = if base.is_empty() { name } else { base.as_str() };
        (TypeToken::new(fallback), EnumKind::None)
    }

    fn native_param(&self, parameter: &Parameter, index_offset: usize) -> Option<NativeParam> {
        let name = parameter.name.clone()?;
        let mut param = if let Some(array) = &parameter.array {
            let element = array.element.as_ref();
            let (element, element_enum) = element.map_or_else(
                || (TypeToken::new("gpointer"), EnumKind::None),
                |t| self.resolve_type(t, &name),
            );
            let declared_index = array.length.as_deref().and_then(|l| l.parse::<usize>().ok());
            let fixed_size = array.fixed_size.as_deref().and_then(|s| s.parse::<usize>().ok());
            let length = if let Some(index) = declared_index {
                Some(ArrayLengthHint::Index(index + index_offset))
            } else if let Some(size) = fixed_size {
                Some(ArrayLengthHint::Fixed(size))
            } else if array.zero_terminated.as_deref() == Some("1") {
                Some(ArrayLengthHint::ZeroTerminated)
            } else {
                None
            };
            NativeParam::new(name.as_str(), element.clone())
                .with_c_type(array.c_type.clone().unwrap_or_default())
                .with_array(ArrayHint {
                    element,
                    element_enum,
                    length,
                })
        } else {
            let type_ref = parameter.type_ref.as_ref()?;
            let (token, enum_kind) = self.resolve_type(type_ref, &name);
            NativeParam::new(name.as_str(), token)
                .with_c_type(type_ref.c_type.clone().unwrap_or_default())
                .with_enum_kind(enum_kind)
        };

        param.description = parameter
            .doc
            .as_ref()
            .map_or_else(String::new, |d| doc::summary(&d.text).to_string());
        param.direction = match parameter.direction.as_deref() {
            Some("out") => Some(Direction::Output),
            Some("in") => Some(Direction::Input),
            _ => None,
        };
        if parameter.optional.as_deref() == Some("1") {
            param.required = false;
        }
        Some(param)
    }

    fn doc_param(&self, argument: &doc::DocArgument) -> Option<NativeParam> {
        let hint = argument.type_hint.as_deref()?;
        let type_ref = TypeRef {
            name: Some(hint.to_string()),
            c_type: None,
        };
        let (token, mut enum_kind) = self.resolve_type(&type_ref, &argument.name);
        // Referenced types missing from the document are assumed to be enums.
        if argument.type_reference
            && !enum_kind.is_enum()
            && !TYPE_ALIASES.iter().any(|(alias, _)| *alias == hint)
        {
            enum_kind = EnumKind::Enum;
        }
        Some(
            NativeParam::new(argument.name.as_str(), token)
                .with_description(argument.description.as_str())
                .with_direction(Direction::Input)
                .with_enum_kind(enum_kind)
                .optional(),
        )
    }

    /// Decides whether a function becomes an operation and returns its call
    /// target.
    fn accept(ctx: &mut DiscoveryContext, function: &Function) -> Option<String> {
        let name = function.name.as_str();
        let forced = ctx.config().is_force_included(name);
        let mut overrides = Vec::new();

        if !function.is_introspectable() {
            if !forced {
                ctx.record(Diagnostic::new(
                    DiagnosticKind::NonIntrospectable,
                    name,
                    "function is not introspectable",
                ));
                return None;
            }
            overrides.push("introspectable=\"0\"".to_string());
        }

        if function.is_deprecated() && !forced {
            ctx.record(Diagnostic::new(
                DiagnosticKind::Deprecated,
                name,
                "function is deprecated",
            ));
            return None;
        }

        let prefix = ctx.config().call_target_prefix.clone();
        let target = match function.c_identifier.as_deref() {
            Some(target) if target.starts_with(&prefix) => target.to_string(),
            _ if forced => {
                let target = format!("{prefix}{name}");
                overrides.push(format!("synthesized call target '{target}'"));
                target
            }
            _ => {
                ctx.record_error(&Error::MissingCallTarget {
                    function: name.to_string(),
                });
                return None;
            }
        };

        if !overrides.is_empty() {
            ctx.record(Diagnostic::new(
                DiagnosticKind::ForceIncluded,
                name,
                format!("included despite {}", overrides.join("; ")),
            ));
        }
        Some(target)
    }

    fn function_operation(&self, ctx: &mut DiscoveryContext, function: &Function) -> Option<Operation> {
        if ctx.is_discovered(&function.name) {
            tracing::trace!(function = %function.name, "already discovered by an earlier source");
            return None;
        }
        let call_target = Self::accept(ctx, function)?;
        let mut params = Vec::new();
        let mut variadic = false;

        if let Some(parameters) = &function.parameters {
            let offset = usize::from(parameters.instance.is_some());
            if let Some(instance) = &parameters.instance {
                let name = instance.name.clone().unwrap_or_else(|| "in".to_string());
                params.push(
                    NativeParam::new(name, "VipsImage")
                        .with_c_type("VipsImage*")
                        .with_direction(Direction::Input),
                );
            }
            for parameter in &parameters.parameters {
                if parameter.varargs.is_some() {
                    variadic = true;
                    continue;
                }
                match self.native_param(parameter, offset) {
                    Some(param) => params.push(param),
                    None => tracing::trace!(function = %function.name, "skipping untyped parameter"),
                }
            }
        }

        for argument in doc::optional_arguments(function.doc_text()) {
            if params.iter().any(|p| p.name == argument.name) {
                continue;
            }
            if let Some(param) = self.doc_param(&argument) {
                params.push(param);
            }
        }

        let description = doc::summary(function.doc_text());
        let mut operation =
            build_operation(ctx, DiscoverySource::Static, &function.name, description, &params);
        operation.call_target = Some(call_target);
        operation.variadic = variadic;
        Some(operation)
    }
}

impl EnumValueSource for StaticDiscovery {
    fn enum_values(&self, native_name: &str) -> Option<Vec<RawEnumValue>> {
        self.enums.get(native_name).map(|e| e.values.clone())
    }

    fn is_flags_type(&self, native_name: &str) -> bool {
        self.enums.get(native_name).is_some_and(|e| e.flags)
    }
}

impl Discovery for StaticDiscovery {
    fn source(&self) -> DiscoverySource {
        DiscoverySource::Static
    }

    fn discover(&self, ctx: &mut DiscoveryContext) -> Result<Vec<Operation>> {
        let mut operations = Vec::new();

        for namespace in &self.repository.namespaces {
            tracing::debug!(namespace = ?namespace.name, "walking namespace");
            let containers = namespace
                .classes
                .iter()
                .chain(&namespace.interfaces)
                .chain(&namespace.records);

            let mut functions: Vec<&Function> = namespace.functions.iter().collect();
            for container in containers {
                tracing::trace!(container = ?container.name, "walking container");
                functions.extend(container.methods.iter().chain(&container.functions));
            }

            operations.extend(
                functions
                    .into_iter()
                    .filter_map(|function| self.function_operation(ctx, function)),
            );
        }

        tracing::info!(
            document = %self.document,
            operations = operations.len(),
            "static discovery complete"
        );
        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opmodel_core::{ArrayLength, ModelConfig, ScalarKind, SemanticType};

    fn discover(xml: &str) -> (Vec<Operation>, DiscoveryContext) {
        let discovery = StaticDiscovery::parse("test", xml).unwrap();
        let mut ctx = DiscoveryContext::new(ModelConfig::default());
        let operations = discovery.discover(&mut ctx).unwrap();
        (operations, ctx)
    }

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<repository version="1.2" xmlns="http://www.gtk.org/introspection/core/1.0" xmlns:c="http://www.gtk.org/introspection/c/1.0">
  <namespace name="Vips" c:identifier-prefixes="Vips">{body}</namespace>
</repository>"#
        )
    }

    #[test]
    fn test_normalize_leaves_text_alone() {
        let xml = r#"<doc xml:space="preserve">ratio a:b</doc>"#;
        assert_eq!(
            normalize_attributes(xml),
            r#"<doc xml-space="preserve">ratio a:b</doc>"#
        );
    }

    #[test]
    fn test_normalize_skips_attribute_like_doc_text() {
        let xml = "<doc xml:space=\"preserve\">set c:type= or glib:nick = \"x\" here</doc>\n<type name=\"gint\" c:type=\"int\"/>";
        assert_eq!(
            normalize_attributes(xml),
            "<doc xml-space=\"preserve\">set c:type= or glib:nick = \"x\" here</doc>\n<type name=\"gint\" c-type=\"int\"/>"
        );
    }

    #[test]
    fn test_doc_text_survives_decoding() {
        let xml = wrap(
            r#"<function name="invert" c:identifier="vips_invert">
  <doc xml:space="preserve">invert an image with c:type= in prose</doc>
</function>"#,
        );
        let discovery = StaticDiscovery::parse("test", &xml).unwrap();
        let function = &discovery.repository.namespaces[0].functions[0];
        assert!(function.doc_text().contains("c:type= in prose"));
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let err = StaticDiscovery::parse("broken", "<repository><namespace>").unwrap_err();
        assert!(err.is_decode_error());
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = StaticDiscovery::from_file("/nonexistent/Vips-8.0.gir").unwrap_err();
        assert!(matches!(err, Error::MetadataRead { .. }));
    }

    #[test]
    fn test_method_instance_parameter_and_varargs() {
        let xml = wrap(
            r#"<class name="Image" c:type="VipsImage">
  <method name="invert" c:identifier="vips_invert">
    <doc xml:space="preserve">Invert an image.</doc>
    <parameters>
      <instance-parameter name="in"><type name="Image" c:type="VipsImage*"/></instance-parameter>
      <parameter name="out" direction="out"><type name="Image" c:type="VipsImage**"/></parameter>
      <parameter name="..."><varargs/></parameter>
    </parameters>
  </method>
  <constructor name="new_from_file" c:identifier="vips_image_new_from_file"/>
</class>"#,
        );
        let (ops, _) = discover(&xml);
        assert_eq!(ops.len(), 1);
        let invert = &ops[0];
        assert!(invert.variadic);
        assert_eq!(invert.description, "Invert an image.");
        assert_eq!(invert.arguments.len(), 2);
        assert!(invert.arguments[0].is_image() && invert.arguments[0].is_input());
        assert!(invert.arguments[1].is_image() && invert.arguments[1].is_output());
    }

    #[test]
    fn test_introspection_filters() {
        let xml = wrap(
            r#"<function name="hidden" c:identifier="vips_hidden" introspectable="0"/>
<function name="linear" introspectable="0"/>
<function name="nosymbol"/>
<function name="foreign_symbol" c:identifier="g_foreign_symbol"/>"#,
        );
        let (ops, ctx) = discover(&xml);
        let names: Vec<_> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["linear"]);
        assert_eq!(ops[0].call_target.as_deref(), Some("vips_linear"));

        assert!(ctx.diagnostics()[1].message.contains("synthesized call target 'vips_linear'"));
        let kinds: Vec<_> = ctx.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::NonIntrospectable,
                DiagnosticKind::ForceIncluded,
                DiagnosticKind::MissingCallTarget,
                DiagnosticKind::MissingCallTarget,
            ]
        );
    }

    #[test]
    fn test_enum_parameter_and_values() {
        let xml = wrap(
            r#"<enumeration name="Kernel" c:type="VipsKernel">
  <member name="nearest" value="0" c:identifier="VIPS_KERNEL_NEAREST" glib:nick="nearest"/>
  <member name="lanczos3" value="5" c:identifier="VIPS_KERNEL_LANCZOS3" glib:nick="lanczos3"/>
</enumeration>
<function name="reduce" c:identifier="vips_reduce">
  <parameters>
    <parameter name="in"><type name="Image" c:type="VipsImage*"/></parameter>
    <parameter name="kernel"><type name="Kernel" c:type="VipsKernel"/></parameter>
  </parameters>
</function>"#,
        );
        let discovery = StaticDiscovery::parse("test", &xml).unwrap();
        let mut ctx = DiscoveryContext::new(ModelConfig::default());
        let ops = discovery.discover(&mut ctx).unwrap();

        let kernel = ops[0].argument("kernel").unwrap();
        assert!(kernel.is_enum());
        assert_eq!(kernel.enum_type.as_deref(), Some("VipsKernel"));

        let values = ctx.enums_mut().values("VipsKernel", &discovery).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].target_name, "KernelLanczos3");
        assert_eq!(values[1].value, 5);
        assert!(!discovery.is_flags_type("VipsKernel"));
    }

    #[test]
    fn test_fixed_size_array_needs_no_companion() {
        let xml = wrap(
            r#"<function name="draw_point" c:identifier="vips_draw_point">
  <parameters>
    <parameter name="image"><type name="Image" c:type="VipsImage*"/></parameter>
    <parameter name="ink">
      <array fixed-size="3" c:type="double*"><type name="gdouble" c:type="double"/></array>
    </parameter>
  </parameters>
</function>"#,
        );
        let (ops, ctx) = discover(&xml);
        let ink = ops[0].argument("ink").unwrap();
        assert_eq!(ink.semantic, SemanticType::array_of(ScalarKind::Double));
        assert_eq!(ink.array_length, Some(ArrayLength::Fixed { size: 3 }));
        assert_eq!(ops[0].arguments.len(), 2);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_array_length_index_accounts_for_instance() {
        let xml = wrap(
            r#"<class name="Image">
  <method name="getpoint" c:identifier="vips_getpoint">
    <parameters>
      <instance-parameter name="in"><type name="Image" c:type="VipsImage*"/></instance-parameter>
      <parameter name="vector" direction="out">
        <array length="1" c:type="double**"><type name="gdouble" c:type="double"/></array>
      </parameter>
      <parameter name="n" direction="out"><type name="gint" c:type="int*"/></parameter>
      <parameter name="x"><type name="gint" c:type="int"/></parameter>
    </parameters>
  </method>
</class>"#,
        );
        let (ops, _) = discover(&xml);
        let vector = ops[0].argument("vector").unwrap();
        assert_eq!(vector.semantic, SemanticType::array_of(ScalarKind::Double));
        assert_eq!(vector.representation, "double**");
        assert_eq!(
            vector.array_length,
            Some(ArrayLength::Companion {
                argument: "n".to_string(),
                verified: true
            })
        );
        assert!(ops[0].argument("n").unwrap().derived);
    }

    #[test]
    fn test_doc_optional_arguments() {
        let xml = wrap(
            r#"<function name="jpegsave" c:identifier="vips_jpegsave">
  <doc xml:space="preserve">Save as JPEG.

Optional arguments:

* @Q: %gint, quality factor
* @keep: #VipsForeignKeep, which metadata to retain</doc>
  <parameters>
    <parameter name="in"><type name="Image" c:type="VipsImage*"/></parameter>
    <parameter name="filename"><type name="utf8" c:type="const char*"/></parameter>
    <parameter name="..."><varargs/></parameter>
  </parameters>
</function>"#,
        );
        let (ops, ctx) = discover(&xml);
        let op = &ops[0];
        let q = op.argument("Q").unwrap();
        assert!(!q.required);
        assert_eq!(q.semantic, SemanticType::scalar(ScalarKind::Int));
        let keep = op.argument("keep").unwrap();
        assert!(keep.is_enum());
        assert!(ctx.enums().contains("VipsForeignKeep"));
        assert_eq!(
            op.argument("filename").unwrap().semantic,
            SemanticType::scalar(ScalarKind::String)
        );
    }

    #[test]
    fn test_void_buffer_becomes_blob() {
        let xml = wrap(
            r#"<function name="jpegload_buffer" c:identifier="vips_jpegload_buffer">
  <parameters>
    <parameter name="buf"><type name="gpointer" c:type="void*"/></parameter>
    <parameter name="len"><type name="gsize" c:type="size_t"/></parameter>
    <parameter name="out" direction="out"><type name="Image" c:type="VipsImage**"/></parameter>
  </parameters>
</function>"#,
        );
        let (ops, _) = discover(&xml);
        let op = &ops[0];
        assert!(op.argument("buf").unwrap().is_buffer());
        let len = op.argument("len").unwrap();
        assert!(len.derived);
        assert_eq!(len.length_of.as_deref(), Some("buf"));
        assert_eq!(op.arguments.len(), 3);
    }
}
