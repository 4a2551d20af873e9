//! Full discovery run.

use crate::classify::classify;
use crate::discovery::{Discovery, DiscoveryContext};
use crate::filter::finalize;
use crate::registry::FormatTable;
use opmodel_core::traits::{EnumValueSource, RawEnumValue};
use opmodel_core::{Category, ModelBundle, ModelConfig, Operation, Result};
use std::collections::HashSet;

/// Merges a fallback operation list into a primary one.
///
/// Operations present in both keep the primary version; fallback-only
/// operations are appended in their original order.
///
/// # Examples
///
/// ```
/// use opmodel_core::{DiscoverySource, Operation};
/// use opmodel_introspector::converge;
///
/// let live = vec![Operation::new("invert", "Invert", "", DiscoverySource::Live)];
/// let gir = vec![
///     Operation::new("invert", "Invert", "", DiscoverySource::Static),
///     Operation::new("linear", "Linear", "", DiscoverySource::Static),
/// ];
///
/// let merged = converge(live, gir);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0].source, DiscoverySource::Live);
/// assert_eq!(merged[1].name.as_str(), "linear");
/// ```
#[must_use]
pub fn converge(primary: Vec<Operation>, fallback: Vec<Operation>) -> Vec<Operation> {
    let known: HashSet<String> = primary.iter().map(|op| op.name.to_string()).collect();
    let mut merged = primary;
    let before = merged.len();
    merged.extend(
        fallback
            .into_iter()
            .filter(|op| !known.contains(op.name.as_str())),
    );
    tracing::debug!(appended = merged.len() - before, "converged discovery paths");
    merged
}

/// Enum value lookup across every source of a run; the first hit wins.
struct ChainedSource<'a> {
    sources: &'a [&'a dyn Discovery],
}

impl EnumValueSource for ChainedSource<'_> {
    fn enum_values(&self, native_name: &str) -> Option<Vec<RawEnumValue>> {
        self.sources.iter().find_map(|s| s.enum_values(native_name))
    }

    fn is_flags_type(&self, native_name: &str) -> bool {
        self.sources.iter().any(|s| s.is_flags_type(native_name))
    }
}

/// Drives discovery, convergence, classification, registry population and
/// filtering, and hands back one read-only [`ModelBundle`].
///
/// # Examples
///
/// ```
/// use opmodel_core::ModelConfig;
/// use opmodel_introspector::fixture::sample_library;
/// use opmodel_introspector::{LiveDiscovery, ModelBuilder};
///
/// let types = sample_library();
/// let live = LiveDiscovery::new(&types);
///
/// let bundle = ModelBuilder::new(ModelConfig::default()).build(&[&live])?;
///
/// assert!(bundle.operation("invert").is_some());
/// assert!(bundle.operation("cache").is_none());
/// assert_eq!(bundle.formats[0].token, "unknown");
/// # Ok::<(), opmodel_core::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: ModelConfig,
}

impl ModelBuilder {
    /// Creates a builder.
    #[must_use]
    pub const fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Runs every source in order against one shared context.
    ///
    /// The first source is ground truth; later sources only contribute
    /// operations the earlier ones did not find, and skip the others before
    /// building them, so their diagnostics and enum registrations never
    /// reach the bundle.
    ///
    /// # Errors
    ///
    /// Returns [`opmodel_core::Error::ConfigError`] for an invalid
    /// configuration, and any fatal error a source reports. Recoverable
    /// problems end up in [`ModelBundle::diagnostics`].
    pub fn build(&self, sources: &[&dyn Discovery]) -> Result<ModelBundle> {
        self.config.validate()?;
        let mut ctx = DiscoveryContext::new(self.config.clone());

        let mut operations = Vec::new();
        for source in sources {
            let discovered = source.discover(&mut ctx)?;
            tracing::info!(
                source = ?source.source(),
                operations = discovered.len(),
                "discovery path finished"
            );
            ctx.mark_discovered(discovered.iter().map(|op| op.name.as_str()));
            operations = converge(operations, discovered);
        }

        for operation in &mut operations {
            classify(operation, ctx.config());
        }

        load_enum_values(&mut ctx, sources);

        let formats = FormatTable::discover(
            operations.iter().map(|op| op.name.as_str()),
            ctx.enums(),
        );

        let mut operations = finalize(operations, &mut ctx);
        for operation in &mut operations {
            if matches!(operation.category, Category::ForeignLoad | Category::ForeignSave) {
                operation.image_type = formats.member_for_operation(operation.name.as_str());
            }
        }

        let bundle = ModelBundle {
            operations,
            enums: ctx.enums().enum_types(),
            formats: formats.into_formats(),
            diagnostics: ctx.take_diagnostics(),
        };
        tracing::info!(
            operations = bundle.operations.len(),
            enums = bundle.enums.len(),
            formats = bundle.formats.len(),
            diagnostics = bundle.diagnostics.len(),
            "model bundle ready"
        );
        Ok(bundle)
    }
}

fn load_enum_values(ctx: &mut DiscoveryContext, sources: &[&dyn Discovery]) {
    let chain = ChainedSource { sources };
    let names: Vec<String> = ctx.enums().native_names().map(str::to_string).collect();
    for name in names {
        if let Err(error) = ctx.enums_mut().values(&name, &chain) {
            ctx.record_error(&error);
        }
    }
}
