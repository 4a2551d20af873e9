//! Codec format discovery from operation names.
//!
//! Every operation name is matched against `<format>load[...]` and
//! `<format>save[...]`. The captured token is normalized (aliases merged,
//! non-format matches rejected) and each format records whether a plain,
//! buffer or stream variant exists for loading and for saving.

use super::EnumRegistry;
use opmodel_core::FormatInfo;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

static LOAD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_]+?)(?:load|load_buffer|load_source)(?:_(.+))?$")
        .expect("valid regex")
});

static SAVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_]+?)(?:save|save_buffer|save_target)(?:_(.+))?$")
        .expect("valid regex")
});

static LOAD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_]+?)load").expect("valid regex"));

static SAVE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_]+?)save").expect("valid regex"));

/// Formats that always get the same ordinal, after `unknown` at 0.
pub const BASELINE_FORMATS: &[&str] = &[
    "jpeg", "gif", "png", "webp", "heif", "svg", "tiff", "jp2k", "avif", "pdf", "bmp", "magick",
];

const REJECTED: &[&str] = &["profile", "foreign", "icc", "colourspace", "colorspace"];

const LOAD_VARIANTS: &[&str] = &["load", "load_buffer", "load_source"];
const SAVE_VARIANTS: &[&str] = &["save", "save_buffer", "save_target"];

const MIME_TYPES: &[(&str, &str)] = &[
    ("gif", "image/gif"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("tiff", "image/tiff"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("heif", "image/heif"),
    ("heic", "image/heic"),
    ("avif", "image/avif"),
    ("pdf", "application/pdf"),
    ("jp2k", "image/jp2"),
    ("jxl", "image/jxl"),
    ("exr", "image/x-exr"),
    ("openexr", "image/openexr"),
    ("fits", "image/fits"),
    ("ppm", "image/x-portable-pixmap"),
    ("pgm", "image/x-portable-graymap"),
    ("pbm", "image/x-portable-bitmap"),
    ("pnm", "image/x-portable-anymap"),
    ("dz", "image/x-deepzoom"),
    ("vips", "image/vnd.libvips"),
    ("mat", "application/x-matlab-data"),
    ("nii", "application/x-nifti"),
    ("analyze", "application/x-analyze"),
    ("openslide", "application/x-openslide"),
    ("csv", "text/csv"),
    ("matrix", "application/x-matrix"),
    ("rad", "image/rad"),
    ("raw", "image/raw"),
];

/// Enum member name used for operations without a format.
pub const UNKNOWN_MEMBER: &str = "ImageTypeUnknown";

/// Normalizes a captured format token.
///
/// Returns `None` for captures that are not formats.
///
/// # Examples
///
/// ```
/// use opmodel_introspector::registry::normalize_format;
///
/// assert_eq!(normalize_format("jpg").as_deref(), Some("jpeg"));
/// assert_eq!(normalize_format("j2k").as_deref(), Some("jp2k"));
/// assert_eq!(normalize_format("profile"), None);
/// assert_eq!(normalize_format("profile_"), None);
/// ```
#[must_use]
pub fn normalize_format(token: &str) -> Option<String> {
    let token = token.to_lowercase();
    if token.is_empty() || token.ends_with('_') || REJECTED.contains(&token.as_str()) {
        return None;
    }

    let normalized = match token.as_str() {
        "jpg" => "jpeg",
        "tif" => "tiff",
        "j2k" | "jp2" => "jp2k",
        "matlab" => "mat",
        "nifti" => "nii",
        other => other.strip_prefix("foreign").unwrap_or(other),
    };

    (!normalized.is_empty()).then(|| normalized.to_string())
}

/// MIME type of a normalized format, or an empty string.
#[must_use]
pub fn mime_type(format: &str) -> &'static str {
    MIME_TYPES
        .iter()
        .find(|(name, _)| *name == format)
        .map_or("", |(_, mime)| *mime)
}

/// Enum member name for a format token, e.g. `ImageTypeJpeg`.
#[must_use]
pub fn enum_member(format: &str) -> String {
    let mut chars = format.chars();
    chars.next().map_or_else(
        || UNKNOWN_MEMBER.to_string(),
        |first| format!("ImageType{}{}", first.to_uppercase(), chars.as_str()),
    )
}

#[derive(Debug, Default)]
struct Capability {
    has_loader: bool,
    has_saver: bool,
}

/// Result of one format discovery pass.
///
/// # Examples
///
/// ```
/// use opmodel_core::ModelConfig;
/// use opmodel_introspector::registry::{EnumRegistry, FormatTable};
///
/// let enums = EnumRegistry::new(&ModelConfig::default());
/// let table = FormatTable::discover(["jpegload", "jpegsave_buffer", "fitsload"], &enums);
///
/// let jpeg = table.get("jpeg").unwrap();
/// assert!(jpeg.has_loader && jpeg.has_saver);
/// assert_eq!(jpeg.ordinal, 1);
///
/// // Extras follow the baseline
/// assert_eq!(table.get("fits").unwrap().ordinal, 13);
/// assert_eq!(table.member_for_operation("jpegload_buffer"), "ImageTypeJpeg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTable {
    formats: Vec<FormatInfo>,
}

impl FormatTable {
    /// Scans operation names and builds the ordered format table.
    ///
    /// The result depends only on the set of names and on the enum values
    /// already loaded into `enums`, so repeated runs over the same input
    /// yield the same ordinals and flags.
    pub fn discover<'a>(names: impl IntoIterator<Item = &'a str>, enums: &EnumRegistry) -> Self {
        let names: HashSet<&str> = names.into_iter().collect();

        // normalized format -> raw tokens seen for it
        let mut tokens: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        for name in &names {
            for pattern in [&*LOAD_PATTERN, &*SAVE_PATTERN] {
                if let Some(raw) = pattern.captures(name).and_then(|c| c.get(1)) {
                    if let Some(format) = normalize_format(raw.as_str()) {
                        tokens.entry(format).or_default().insert(raw.as_str());
                    }
                }
            }
        }

        let has_variant = |raw: &BTreeSet<&str>, variants: &[&str]| {
            raw.iter()
                .any(|r| variants.iter().any(|v| names.contains(format!("{r}{v}").as_str())))
        };

        let mut capabilities: BTreeMap<String, Capability> = BASELINE_FORMATS
            .iter()
            .map(|f| ((*f).to_string(), Capability::default()))
            .collect();

        for (format, raw) in &tokens {
            let capability = Capability {
                has_loader: has_variant(raw, LOAD_VARIANTS),
                has_saver: has_variant(raw, SAVE_VARIANTS),
            };
            let baseline = BASELINE_FORMATS.contains(&format.as_str());
            if baseline || capability.has_loader || capability.has_saver {
                capabilities.insert(format.clone(), capability);
            }
        }

        apply_piggybacks(&mut capabilities, &names, enums);

        let mut formats = vec![FormatInfo {
            token: "unknown".to_string(),
            enum_member: UNKNOWN_MEMBER.to_string(),
            mime_type: String::new(),
            ordinal: 0,
            has_loader: false,
            has_saver: false,
        }];

        let extras: Vec<String> = capabilities
            .keys()
            .filter(|f| !BASELINE_FORMATS.contains(&f.as_str()))
            .cloned()
            .collect();
        let ordered = BASELINE_FORMATS
            .iter()
            .map(|f| (*f).to_string())
            .chain(extras);

        for (ordinal, format) in (1u32..).zip(ordered) {
            let capability = capabilities.remove(&format).unwrap_or_default();
            tracing::debug!(
                format = %format,
                ordinal,
                loader = capability.has_loader,
                saver = capability.has_saver,
                "discovered format"
            );
            formats.push(FormatInfo {
                enum_member: enum_member(&format),
                mime_type: mime_type(&format).to_string(),
                token: format,
                ordinal,
                has_loader: capability.has_loader,
                has_saver: capability.has_saver,
            });
        }

        tracing::info!(count = formats.len(), "format discovery complete");
        Self { formats }
    }

    /// Looks up a format by normalized token.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&FormatInfo> {
        self.formats.iter().find(|f| f.token == token)
    }

    /// Resolves a load or save operation to its format.
    #[must_use]
    pub fn format_for_operation(&self, operation: &str) -> Option<&FormatInfo> {
        [&*LOAD_PREFIX, &*SAVE_PREFIX]
            .iter()
            .find_map(|p| p.captures(operation).and_then(|c| c.get(1)))
            .and_then(|raw| normalize_format(raw.as_str()))
            .and_then(|format| self.get(&format))
    }

    /// Enum member for an operation, `ImageTypeUnknown` when it has no format.
    #[must_use]
    pub fn member_for_operation(&self, operation: &str) -> String {
        self.format_for_operation(operation)
            .map_or_else(|| UNKNOWN_MEMBER.to_string(), |f| f.enum_member.clone())
    }

    /// All formats ordered by ordinal.
    #[must_use]
    pub fn formats(&self) -> &[FormatInfo] {
        &self.formats
    }

    /// Consumes the table and returns the ordered formats.
    #[must_use]
    pub fn into_formats(self) -> Vec<FormatInfo> {
        self.formats
    }
}

fn apply_piggybacks(
    capabilities: &mut BTreeMap<String, Capability>,
    names: &HashSet<&str>,
    enums: &EnumRegistry,
) {
    let heif = capabilities
        .get("heif")
        .map(|c| (c.has_loader, c.has_saver));
    if let Some((has_loader, has_saver)) = heif {
        if enums.has_value(
            "VipsForeignHeifCompression",
            "VIPS_FOREIGN_HEIF_COMPRESSION_AV1",
        ) {
            tracing::debug!("avif capability inherited from heif with AV1 compression");
            capabilities.insert(
                "avif".to_string(),
                Capability {
                    has_loader,
                    has_saver,
                },
            );
        }
    }

    if let Some(gif) = capabilities.get_mut("gif") {
        if !gif.has_saver && (names.contains("magicksave") || names.contains("magicksave_buffer")) {
            tracing::debug!("gif save capability provided by magicksave");
            gif.has_saver = true;
        }
    }
}
