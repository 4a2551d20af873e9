//! In-memory [`TypeSystem`] for tests, benches and offline use.
//!
//! Mirrors the shape of the native runtime: an abstract base operation type,
//! optional abstract intermediate classes, concrete operation types with
//! declared parameters, and enum/flags types with values. Instance counts are
//! tracked so callers can check that discovery never holds two instances at
//! once.

use opmodel_core::naming::to_pascal_case;
use opmodel_core::traits::{
    ArgumentFlags, ClassInfo, OperationFlags, OperationInstance, ParamSpec, RawDefault,
    RawEnumValue, TypeHandle, TypeSystem,
};
use opmodel_core::TypeToken;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Name of the abstract root every fixture operation descends from.
pub const BASE_OPERATION: &str = "VipsOperation";

#[derive(Debug, Clone)]
struct FixtureParam {
    name: String,
    description: String,
    type_name: String,
    flags: ArgumentFlags,
    default: Option<RawDefault>,
}

/// Declarative description of one concrete operation type.
///
/// # Examples
///
/// ```
/// use opmodel_introspector::fixture::FixtureOperation;
///
/// let op = FixtureOperation::new("embed", "embed an image in a larger image")
///     .input("in", "VipsImage")
///     .output("out", "VipsImage")
///     .input("x", "gint");
/// assert_eq!(op.nickname(), "embed");
/// ```
#[derive(Debug, Clone)]
pub struct FixtureOperation {
    nickname: String,
    description: String,
    type_name: Option<String>,
    flags: OperationFlags,
    params: Vec<FixtureParam>,
    instantiable: bool,
}

impl FixtureOperation {
    /// Creates an instantiable operation with no parameters.
    #[must_use]
    pub fn new(nickname: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            description: description.into(),
            type_name: None,
            flags: OperationFlags::default(),
            params: Vec::new(),
            instantiable: true,
        }
    }

    /// Operation nickname.
    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    fn param(
        mut self,
        name: &str,
        type_name: &str,
        flags: ArgumentFlags,
        default: Option<RawDefault>,
    ) -> Self {
        self.params.push(FixtureParam {
            name: name.to_string(),
            description: name.replace('_', " "),
            type_name: type_name.to_string(),
            flags,
            default,
        });
        self
    }

    /// Adds a required input.
    #[must_use]
    pub fn input(self, name: &str, type_name: &str) -> Self {
        self.param(
            name,
            type_name,
            ArgumentFlags::REQUIRED | ArgumentFlags::INPUT,
            None,
        )
    }

    /// Adds an optional input with an optional default.
    #[must_use]
    pub fn optional_input(self, name: &str, type_name: &str, default: Option<RawDefault>) -> Self {
        self.param(name, type_name, ArgumentFlags::INPUT, default)
    }

    /// Adds a required output.
    #[must_use]
    pub fn output(self, name: &str, type_name: &str) -> Self {
        self.param(
            name,
            type_name,
            ArgumentFlags::REQUIRED | ArgumentFlags::OUTPUT,
            None,
        )
    }

    /// Adds an optional output.
    #[must_use]
    pub fn optional_output(self, name: &str, type_name: &str) -> Self {
        self.param(name, type_name, ArgumentFlags::OUTPUT, None)
    }

    /// Adds a deprecated input, which discovery must skip.
    #[must_use]
    pub fn deprecated_input(self, name: &str, type_name: &str) -> Self {
        self.param(
            name,
            type_name,
            ArgumentFlags::INPUT | ArgumentFlags::DEPRECATED,
            None,
        )
    }

    /// Flags the operation deprecated.
    #[must_use]
    pub const fn deprecated(mut self) -> Self {
        self.flags = self.flags.union(OperationFlags::DEPRECATED);
        self
    }

    /// Makes instantiation fail.
    #[must_use]
    pub const fn uninstantiable(mut self) -> Self {
        self.instantiable = false;
        self
    }

    /// Overrides the native type name (default `Vips` + PascalCase nickname).
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

#[derive(Debug, Clone)]
enum TypeKind {
    AbstractOperation,
    Operation {
        class: ClassInfo,
        flags: OperationFlags,
        params: Vec<ParamSpec>,
        instantiable: bool,
    },
    Enum {
        flags: bool,
        values: Vec<RawEnumValue>,
    },
    Value,
}

#[derive(Debug, Clone)]
struct TypeEntry {
    name: String,
    children: Vec<TypeHandle>,
    kind: TypeKind,
}

/// Transient instance handed out by [`FixtureTypeSystem::instantiate`].
#[derive(Debug)]
pub struct FixtureInstance {
    flags: OperationFlags,
    params: Vec<ParamSpec>,
    live: Rc<Cell<usize>>,
}

impl OperationInstance for FixtureInstance {
    fn flags(&self) -> OperationFlags {
        self.flags
    }

    fn walk_arguments(&self, visit: &mut dyn FnMut(&ParamSpec)) {
        for spec in &self.params {
            visit(spec);
        }
    }
}

impl Drop for FixtureInstance {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// In-memory type system.
#[derive(Debug)]
pub struct FixtureTypeSystem {
    types: Vec<TypeEntry>,
    by_name: HashMap<String, TypeHandle>,
    live: Rc<Cell<usize>>,
    peak: Rc<Cell<usize>>,
}

impl Default for FixtureTypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureTypeSystem {
    /// Creates a type system holding only the abstract base operation type.
    #[must_use]
    pub fn new() -> Self {
        let mut system = Self {
            types: Vec::new(),
            by_name: HashMap::new(),
            live: Rc::new(Cell::new(0)),
            peak: Rc::new(Cell::new(0)),
        };
        system.insert(BASE_OPERATION, None, TypeKind::AbstractOperation);
        system
    }

    fn insert(&mut self, name: &str, parent: Option<TypeHandle>, kind: TypeKind) -> TypeHandle {
        if let Some(&existing) = self.by_name.get(name) {
            if let Some(entry) = self.entry_mut(existing) {
                entry.kind = kind;
            }
            return existing;
        }
        let handle = TypeHandle::new(u64::try_from(self.types.len()).unwrap_or(u64::MAX));
        self.types.push(TypeEntry {
            name: name.to_string(),
            children: Vec::new(),
            kind,
        });
        self.by_name.insert(name.to_string(), handle);
        if let Some(parent) = parent.and_then(|p| self.entry_mut(p)) {
            parent.children.push(handle);
        }
        handle
    }

    fn entry(&self, ty: TypeHandle) -> Option<&TypeEntry> {
        usize::try_from(ty.raw()).ok().and_then(|i| self.types.get(i))
    }

    fn entry_mut(&mut self, ty: TypeHandle) -> Option<&mut TypeEntry> {
        usize::try_from(ty.raw())
            .ok()
            .and_then(|i| self.types.get_mut(i))
    }

    fn handle_or_value(&mut self, name: &str) -> TypeHandle {
        match self.by_name.get(name) {
            Some(&handle) => handle,
            None => self.insert(name, None, TypeKind::Value),
        }
    }

    /// Adds an abstract intermediate operation class under `parent`.
    ///
    /// An unknown parent is created as an abstract child of the base type.
    pub fn add_abstract(&mut self, name: &str, parent: &str) -> TypeHandle {
        let parent = self.parent_handle(parent);
        self.insert(name, Some(parent), TypeKind::AbstractOperation)
    }

    fn parent_handle(&mut self, parent: &str) -> TypeHandle {
        match self.by_name.get(parent) {
            Some(&handle) => handle,
            None => {
                let base = self.by_name.get(BASE_OPERATION).copied();
                self.insert(parent, base, TypeKind::AbstractOperation)
            }
        }
    }

    /// Adds a concrete operation directly under the base type.
    pub fn add_operation(&mut self, operation: FixtureOperation) -> TypeHandle {
        self.add_operation_under(BASE_OPERATION, operation)
    }

    /// Adds a concrete operation under an abstract class.
    pub fn add_operation_under(&mut self, parent: &str, operation: FixtureOperation) -> TypeHandle {
        let parent = self.parent_handle(parent);
        let params = operation
            .params
            .iter()
            .map(|p| ParamSpec {
                name: p.name.clone(),
                description: p.description.clone(),
                value_type: self.handle_or_value(&p.type_name),
                type_name: TypeToken::new(p.type_name.as_str()),
                flags: p.flags,
                default: p.default.clone(),
            })
            .collect();
        let type_name = operation
            .type_name
            .clone()
            .unwrap_or_else(|| format!("Vips{}", to_pascal_case(&operation.nickname)));
        self.insert(
            &type_name,
            Some(parent),
            TypeKind::Operation {
                class: ClassInfo {
                    nickname: operation.nickname,
                    description: operation.description,
                },
                flags: operation.flags,
                params,
                instantiable: operation.instantiable,
            },
        )
    }

    /// Adds an enum type with `(name, nick, value)` members.
    pub fn add_enum(&mut self, name: &str, values: &[(&str, &str, i64)]) -> TypeHandle {
        self.add_enum_type(name, false, values)
    }

    /// Adds a flags type with `(name, nick, value)` members.
    pub fn add_flags(&mut self, name: &str, values: &[(&str, &str, i64)]) -> TypeHandle {
        self.add_enum_type(name, true, values)
    }

    fn add_enum_type(&mut self, name: &str, flags: bool, values: &[(&str, &str, i64)]) -> TypeHandle {
        let values = values
            .iter()
            .map(|(name, nick, value)| RawEnumValue {
                name: (*name).to_string(),
                nick: (*nick).to_string(),
                value: *value,
            })
            .collect();
        self.insert(name, None, TypeKind::Enum { flags, values })
    }

    /// Number of instances currently alive.
    #[must_use]
    pub fn live_instances(&self) -> usize {
        self.live.get()
    }

    /// Highest number of simultaneously alive instances seen so far.
    #[must_use]
    pub fn peak_instances(&self) -> usize {
        self.peak.get()
    }
}

impl TypeSystem for FixtureTypeSystem {
    type Instance = FixtureInstance;

    fn type_from_name(&self, name: &str) -> Option<TypeHandle> {
        self.by_name.get(name).copied()
    }

    fn type_name(&self, ty: TypeHandle) -> Option<String> {
        self.entry(ty).map(|e| e.name.clone())
    }

    fn children(&self, ty: TypeHandle) -> Vec<TypeHandle> {
        self.entry(ty).map(|e| e.children.clone()).unwrap_or_default()
    }

    fn is_abstract(&self, ty: TypeHandle) -> bool {
        self.entry(ty)
            .is_none_or(|e| !matches!(e.kind, TypeKind::Operation { .. }))
    }

    fn class_info(&self, ty: TypeHandle) -> ClassInfo {
        match self.entry(ty).map(|e| &e.kind) {
            Some(TypeKind::Operation { class, .. }) => class.clone(),
            _ => ClassInfo::default(),
        }
    }

    fn instantiate(&self, ty: TypeHandle) -> Option<FixtureInstance> {
        let Some(TypeKind::Operation {
            flags,
            params,
            instantiable: true,
            ..
        }) = self.entry(ty).map(|e| &e.kind)
        else {
            return None;
        };
        self.live.set(self.live.get() + 1);
        self.peak.set(self.peak.get().max(self.live.get()));
        Some(FixtureInstance {
            flags: *flags,
            params: params.clone(),
            live: Rc::clone(&self.live),
        })
    }

    fn is_enum(&self, ty: TypeHandle) -> bool {
        matches!(
            self.entry(ty).map(|e| &e.kind),
            Some(TypeKind::Enum { flags: false, .. })
        )
    }

    fn is_flags(&self, ty: TypeHandle) -> bool {
        matches!(
            self.entry(ty).map(|e| &e.kind),
            Some(TypeKind::Enum { flags: true, .. })
        )
    }

    fn enum_values(&self, ty: TypeHandle) -> Vec<RawEnumValue> {
        match self.entry(ty).map(|e| &e.kind) {
            Some(TypeKind::Enum { values, .. }) => values.clone(),
            _ => Vec::new(),
        }
    }
}

/// A small but realistic library: arithmetic, resampling, colour, codecs,
/// buffers, arrays, caches, plus one deprecated and one broken operation.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn sample_library() -> FixtureTypeSystem {
    let mut types = FixtureTypeSystem::new();

    types.add_enum(
        "VipsKernel",
        &[
            ("VIPS_KERNEL_NEAREST", "nearest", 0),
            ("VIPS_KERNEL_LINEAR", "linear", 1),
            ("VIPS_KERNEL_CUBIC", "cubic", 2),
            ("VIPS_KERNEL_MITCHELL", "mitchell", 3),
            ("VIPS_KERNEL_LANCZOS2", "lanczos2", 4),
            ("VIPS_KERNEL_LANCZOS3", "lanczos3", 5),
        ],
    );
    types.add_enum(
        "VipsInterpretation",
        &[
            ("VIPS_INTERPRETATION_MULTIBAND", "multiband", 0),
            ("VIPS_INTERPRETATION_B_W", "b-w", 1),
            ("VIPS_INTERPRETATION_LAB", "lab", 10),
            ("VIPS_INTERPRETATION_sRGB", "srgb", 22),
        ],
    );
    types.add_enum(
        "VipsAccess",
        &[
            ("VIPS_ACCESS_RANDOM", "random", 0),
            ("VIPS_ACCESS_SEQUENTIAL", "sequential", 1),
        ],
    );
    types.add_enum(
        "VipsForeignHeifCompression",
        &[
            ("VIPS_FOREIGN_HEIF_COMPRESSION_HEVC", "hevc", 1),
            ("VIPS_FOREIGN_HEIF_COMPRESSION_AVC", "avc", 2),
            ("VIPS_FOREIGN_HEIF_COMPRESSION_JPEG", "jpeg", 3),
            ("VIPS_FOREIGN_HEIF_COMPRESSION_AV1", "av1", 4),
        ],
    );
    types.add_enum(
        "VipsBlendMode",
        &[
            ("VIPS_BLEND_MODE_CLEAR", "clear", 0),
            ("VIPS_BLEND_MODE_OVER", "over", 2),
        ],
    );
    types.add_flags(
        "VipsForeignKeep",
        &[
            ("VIPS_FOREIGN_KEEP_NONE", "none", 0),
            ("VIPS_FOREIGN_KEEP_EXIF", "exif", 1),
            ("VIPS_FOREIGN_KEEP_XMP", "xmp", 2),
            ("VIPS_FOREIGN_KEEP_ICC", "icc", 8),
        ],
    );
    types.add_flags(
        "VipsForeignPngFilter",
        &[
            ("VIPS_FOREIGN_PNG_FILTER_NONE", "none", 8),
            ("VIPS_FOREIGN_PNG_FILTER_ALL", "all", 248),
        ],
    );

    types.add_abstract("VipsArithmetic", BASE_OPERATION);
    types.add_abstract("VipsUnary", "VipsArithmetic");
    types.add_abstract("VipsConversion", BASE_OPERATION);
    types.add_abstract("VipsResample", BASE_OPERATION);
    types.add_abstract("VipsColour", BASE_OPERATION);
    types.add_abstract("VipsForeign", BASE_OPERATION);
    types.add_abstract("VipsForeignLoad", "VipsForeign");
    types.add_abstract("VipsForeignSave", "VipsForeign");

    let image_op = |name: &str, description: &str| {
        FixtureOperation::new(name, description)
            .input("in", "VipsImage")
            .output("out", "VipsImage")
    };

    types.add_operation_under("VipsUnary", image_op("invert", "invert an image"));
    types.add_operation_under(
        "VipsArithmetic",
        image_op("linear", "calculate (a * in + b)")
            .input("a", "VipsArrayDouble")
            .input("b", "VipsArrayDouble")
            .optional_input("uchar", "gboolean", Some(RawDefault::Bool(false))),
    );
    types.add_operation_under(
        "VipsArithmetic",
        FixtureOperation::new("avg", "find image average")
            .input("in", "VipsImage")
            .output("out", "gdouble"),
    );
    types.add_operation_under(
        "VipsArithmetic",
        FixtureOperation::new("getpoint", "read a point from an image")
            .input("in", "VipsImage")
            .output("out_array", "VipsArrayDouble")
            .input("x", "gint")
            .input("y", "gint"),
    );

    types.add_operation_under(
        "VipsConversion",
        FixtureOperation::new("extract_area", "extract an area from an image")
            .input("input", "VipsImage")
            .output("out", "VipsImage")
            .input("left", "gint")
            .input("top", "gint")
            .input("width", "gint")
            .input("height", "gint"),
    );
    types.add_operation_under(
        "VipsConversion",
        image_op("embed", "embed an image in a larger image")
            .input("x", "gint")
            .input("y", "gint")
            .input("width", "gint")
            .input("height", "gint"),
    );
    types.add_operation_under(
        "VipsConversion",
        FixtureOperation::new("bandjoin", "bandwise join a set of images")
            .input("in", "VipsArrayImage")
            .output("out", "VipsImage"),
    );
    types.add_operation_under(
        "VipsConversion",
        FixtureOperation::new("arrayjoin", "join an array of images")
            .input("in", "VipsArrayImage")
            .output("out", "VipsImage")
            .optional_input("across", "gint", Some(RawDefault::Int(1))),
    );
    types.add_operation_under(
        "VipsConversion",
        FixtureOperation::new("composite2", "blend a pair of images with a blend mode")
            .input("base", "VipsImage")
            .input("overlay", "VipsImage")
            .output("out", "VipsImage")
            .input("mode", "VipsBlendMode"),
    );
    types.add_operation_under(
        "VipsConversion",
        image_op("copy", "copy an image").optional_input("width", "gint", Some(RawDefault::Int(0))),
    );
    types.add_operation_under(
        "VipsConversion",
        image_op("tilecache", "cache an image as a set of tiles").optional_input(
            "tile_width",
            "gint",
            Some(RawDefault::Int(128)),
        ),
    );
    types.add_operation(image_op("cache", "cache an image"));

    types.add_operation_under(
        "VipsResample",
        image_op("resize", "resize an image")
            .input("scale", "gdouble")
            .optional_input("kernel", "VipsKernel", Some(RawDefault::Enum(5)))
            .optional_input("vscale", "gdouble", Some(RawDefault::Double(0.0)))
            .deprecated_input("idx", "gdouble"),
    );
    types.add_operation_under(
        "VipsResample",
        FixtureOperation::new("thumbnail_buffer", "generate thumbnail from buffer")
            .input("buffer", "VipsBlob")
            .output("out", "VipsImage")
            .input("width", "gint"),
    );
    types.add_operation_under(
        "VipsColour",
        image_op("colourspace", "convert to a new colorspace")
            .input("space", "VipsInterpretation")
            .optional_input("source_space", "VipsInterpretation", Some(RawDefault::Enum(22))),
    );

    let loader = |name: &str, source: (&str, &str)| {
        FixtureOperation::new(name, format!("load {name}"))
            .input(source.0, source.1)
            .output("out", "VipsImage")
            .optional_input("access", "VipsAccess", Some(RawDefault::Enum(0)))
    };
    for (name, source) in [
        ("jpegload", ("filename", "gchararray")),
        ("jpegload_buffer", ("buffer", "VipsBlob")),
        ("jpegload_source", ("source", "VipsSource")),
        ("pngload", ("filename", "gchararray")),
        ("gifload", ("filename", "gchararray")),
        ("heifload", ("filename", "gchararray")),
    ] {
        types.add_operation_under("VipsForeignLoad", loader(name, source));
    }

    let saver = |name: &str, target: Option<(&str, &str)>| {
        let op = FixtureOperation::new(name, format!("save image to {name}")).input("in", "VipsImage");
        let op = match target {
            Some((arg, ty)) => op.input(arg, ty),
            None => op.output("buffer", "VipsBlob"),
        };
        op.optional_input("keep", "VipsForeignKeep", Some(RawDefault::Enum(15)))
    };
    types.add_operation_under("VipsForeignSave", saver("jpegsave", Some(("filename", "gchararray"))));
    types.add_operation_under("VipsForeignSave", saver("jpegsave_buffer", None));
    types.add_operation_under(
        "VipsForeignSave",
        saver("pngsave", Some(("filename", "gchararray"))).optional_input(
            "filter",
            "VipsForeignPngFilter",
            Some(RawDefault::Enum(248)),
        ),
    );
    types.add_operation_under(
        "VipsForeignSave",
        saver("heifsave", Some(("filename", "gchararray"))).optional_input(
            "compression",
            "VipsForeignHeifCompression",
            Some(RawDefault::Enum(1)),
        ),
    );
    types.add_operation_under("VipsForeignSave", saver("magicksave", Some(("filename", "gchararray"))));

    types.add_operation(
        FixtureOperation::new("profile_load", "load named ICC profile")
            .input("name", "gchararray")
            .output("profile", "VipsBlob"),
    );
    types.add_operation(image_op("im_old", "legacy operation").deprecated());
    types.add_operation(image_op("broken", "cannot be constructed").uninstantiable());

    types
}
