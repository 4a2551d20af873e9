//! Operation classifier.
//!
//! Fills in the derived fields of an [`Operation`] once all of its arguments
//! are attached: the four argument subsets, the capability flags and the
//! category tag. Runs at most once per operation.

use opmodel_core::{
    ArgumentSubsets, Capabilities, Category, ModelConfig, Operation, SemanticType,
};

const BUFFER_NAMES: [&str; 2] = ["buf", "buffer"];

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Prefix(&'static str),
    Suffix(&'static str),
}

impl Pattern {
    fn matches(self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => name.starts_with(prefix),
            Self::Suffix(suffix) => name.ends_with(suffix),
        }
    }
}

/// Ordered category rules; the first matching pattern wins.
const CATEGORY_RULES: &[(Category, &[Pattern])] = {
    use Pattern::{Prefix, Suffix};
    &[
        (
            Category::Arithmetic,
            &[
                Prefix("add"),
                Prefix("subtract"),
                Prefix("multiply"),
                Prefix("divide"),
                Prefix("linear"),
                Prefix("math"),
                Prefix("abs"),
                Prefix("sign"),
                Prefix("round"),
                Prefix("floor"),
                Prefix("ceil"),
                Prefix("max"),
                Prefix("min"),
                Prefix("avg"),
                Prefix("invert"),
                Prefix("getpoint"),
            ],
        ),
        (
            Category::Convolution,
            &[
                Prefix("conv"),
                Prefix("sharpen"),
                Prefix("gaussblur"),
                Prefix("sobel"),
                Prefix("canny"),
            ],
        ),
        (
            Category::Resample,
            &[
                Prefix("resize"),
                Prefix("shrink"),
                Prefix("reduce"),
                Prefix("thumbnail"),
                Prefix("affine"),
                Prefix("similarity"),
            ],
        ),
        (
            Category::Colour,
            &[
                Prefix("colourspace"),
                Prefix("icc"),
                Prefix("Lab2XYZ"),
                Prefix("XYZ2Lab"),
                Prefix("Lab2LCh"),
                Prefix("LCh2Lab"),
                Prefix("sRGB2HSV"),
                Prefix("HSV2sRGB"),
            ],
        ),
        (
            Category::ForeignLoad,
            &[Suffix("load"), Suffix("load_buffer"), Suffix("load_source")],
        ),
        (
            Category::ForeignSave,
            &[Suffix("save"), Suffix("save_buffer"), Suffix("save_target")],
        ),
        (
            Category::Conversion,
            &[
                Prefix("flip"),
                Prefix("rot"),
                Prefix("extract"),
                Prefix("embed"),
                Prefix("crop"),
                Prefix("join"),
                Prefix("bandjoin"),
                Prefix("bandmean"),
                Prefix("arrayjoin"),
                Prefix("replicate"),
                Prefix("find_trim"),
                Prefix("composite"),
            ],
        ),
        (
            Category::Histogram,
            &[
                Prefix("hist_"),
                Prefix("stdif"),
                Prefix("percent"),
                Prefix("profile"),
            ],
        ),
        (
            Category::Morphology,
            &[
                Prefix("morph"),
                Prefix("rank"),
                Prefix("erode"),
                Prefix("dilate"),
            ],
        ),
        (Category::Draw, &[Prefix("draw_"), Prefix("text")]),
    ]
};

/// Category of an operation name by first-match rule lookup.
///
/// # Examples
///
/// ```
/// use opmodel_core::Category;
/// use opmodel_introspector::category_for;
///
/// assert_eq!(category_for("jpegload_buffer"), Category::ForeignLoad);
/// assert_eq!(category_for("draw_line"), Category::Draw);
/// assert_eq!(category_for("black"), Category::Operation);
/// ```
#[must_use]
pub fn category_for(name: &str) -> Category {
    CATEGORY_RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.matches(name)))
        .map_or(Category::Operation, |(category, _)| *category)
}

fn capabilities(operation: &Operation, config: &ModelConfig) -> Capabilities {
    let is_raw_buffer = |name: &str, semantic: SemanticType| {
        semantic == SemanticType::Buffer && BUFFER_NAMES.contains(&name)
    };

    let mut caps = Capabilities::default();
    let mut image_outputs = 0_usize;
    for arg in &operation.arguments {
        if arg.is_input() {
            caps.has_image_input |= arg.is_image();
            caps.has_array_image_input |= arg.is_image_array();
            caps.has_buffer_input |= is_raw_buffer(&arg.name, arg.semantic);
        } else {
            if arg.is_image() {
                image_outputs += 1;
            }
            caps.has_buffer_output |= is_raw_buffer(&arg.name, arg.semantic);
        }
    }

    caps.has_image_output = image_outputs > 0;
    caps.has_one_image_output = image_outputs == 1 && !caps.has_array_image_input;
    if caps.has_one_image_output && config.borrows_image_output(operation.name.as_str()) {
        tracing::trace!(operation = %operation.name, "image output is borrowed");
        caps.has_one_image_output = false;
    }
    caps
}

/// Fills subsets, capabilities and category.
///
/// A second call on the same operation is a no-op.
///
/// # Examples
///
/// ```
/// use opmodel_core::{Argument, Category, Direction, DiscoverySource, ModelConfig, Operation, SemanticType};
/// use opmodel_introspector::classify;
///
/// let mut op = Operation::new("invert", "Invert", "invert an image", DiscoverySource::Live);
/// op.arguments.push(Argument::new("in", "in", SemanticType::Image, "VipsImage", Direction::Input));
/// op.arguments.push(Argument::new("out", "out", SemanticType::Image, "VipsImage", Direction::Output));
///
/// classify(&mut op, &ModelConfig::default());
///
/// assert!(op.is_classified());
/// assert!(op.capabilities.has_one_image_output);
/// assert_eq!(op.category, Category::Arithmetic);
/// ```
pub fn classify(operation: &mut Operation, config: &ModelConfig) {
    if operation.is_classified() {
        tracing::trace!(operation = %operation.name, "already classified");
        return;
    }

    operation.subsets = ArgumentSubsets::partition(&operation.arguments);
    operation.capabilities = capabilities(operation, config);
    operation.category = category_for(operation.name.as_str());
    operation.mark_classified();

    tracing::trace!(
        operation = %operation.name,
        category = %operation.category,
        capabilities = ?operation.capabilities,
        "classified operation"
    );
}
