//! Shared discovery interface and run context.

use crate::argument::{ArgumentBuilder, NativeParam};
use crate::registry::EnumRegistry;
use opmodel_core::naming::operation_target_name;
use opmodel_core::traits::EnumValueSource;
use opmodel_core::{Diagnostic, DiscoverySource, Error, ModelConfig, Operation, Result};
use std::collections::HashSet;

/// State shared by every discovery call of one run.
///
/// Holds the configuration, the enum registry, the names earlier sources
/// already discovered, and every recoverable diagnostic recorded so far.
/// Passed by reference into each discovery path; there is no global
/// registry.
///
/// # Examples
///
/// ```
/// use opmodel_core::{Diagnostic, DiagnosticKind, ModelConfig};
/// use opmodel_introspector::DiscoveryContext;
///
/// let mut ctx = DiscoveryContext::new(ModelConfig::default());
/// ctx.record(Diagnostic::new(DiagnosticKind::Excluded, "cache", "on the exclusion list"));
///
/// assert_eq!(ctx.diagnostics().len(), 1);
/// assert!(ctx.enums().is_empty());
/// ```
#[derive(Debug)]
pub struct DiscoveryContext {
    config: ModelConfig,
    enums: EnumRegistry,
    discovered: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl DiscoveryContext {
    /// Creates a context with an empty registry.
    #[must_use]
    pub fn new(config: ModelConfig) -> Self {
        let enums = EnumRegistry::new(&config);
        Self {
            config,
            enums,
            discovered: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Enum registry.
    #[must_use]
    pub const fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// Mutable enum registry.
    pub const fn enums_mut(&mut self) -> &mut EnumRegistry {
        &mut self.enums
    }

    /// Marks operation names as owned by a source that already ran.
    pub fn mark_discovered<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        self.discovered.extend(names.into_iter().map(str::to_string));
    }

    /// Whether an earlier source already produced `name`.
    ///
    /// Later sources skip such names before building or recording anything.
    #[must_use]
    pub fn is_discovered(&self, name: &str) -> bool {
        self.discovered.contains(name)
    }

    /// Records a recoverable event and logs it.
    ///
    /// A second event of the same kind for the same subject is dropped; the
    /// first message is kept.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        let seen = self
            .diagnostics
            .iter()
            .any(|d| d.kind == diagnostic.kind && d.subject == diagnostic.subject);
        if seen {
            tracing::trace!(subject = %diagnostic.subject, "diagnostic already recorded");
            return;
        }
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            subject = %diagnostic.subject,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    /// Records a recoverable error. Fatal errors are ignored here; they are
    /// returned to the caller instead.
    pub fn record_error(&mut self, error: &Error) {
        if let Some(diagnostic) = Diagnostic::from_error(error) {
            self.record(diagnostic);
        }
    }

    /// Diagnostics recorded so far, in order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Removes and returns every recorded diagnostic.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// One way of discovering operations.
///
/// Implemented by the live reflection walker and the static metadata parser.
/// Both return the common [`Operation`] model and act as the enum value
/// source for the types they registered.
pub trait Discovery: EnumValueSource {
    /// Which path this is.
    fn source(&self) -> DiscoverySource;

    /// Discovers every operation, in a deterministic order.
    ///
    /// # Errors
    ///
    /// Returns only fatal errors (initialization or document decode
    /// failures). Per-operation problems are recorded on `ctx`.
    fn discover(&self, ctx: &mut DiscoveryContext) -> Result<Vec<Operation>>;
}

/// Truncates a description to `limit` characters, ending with `...`.
pub fn truncate_description(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Builds an unclassified operation from normalized native parameters.
pub fn build_operation(
    ctx: &mut DiscoveryContext,
    source: DiscoverySource,
    name: &str,
    description: &str,
    params: &[NativeParam],
) -> Operation {
    let description = truncate_description(description, ctx.config().description_limit);
    let mut operation = Operation::new(name, operation_target_name(name), description, source);
    operation.arguments = ArgumentBuilder::new(ctx).build_all(name, params);
    tracing::debug!(
        operation = name,
        source = ?source,
        arguments = operation.arguments.len(),
        "discovered operation"
    );
    operation
}

#[cfg(test)]
mod tests {
    use super::*;
    use opmodel_core::DiagnosticKind;

    #[test]
    fn test_record_error_skips_fatal() {
        let mut ctx = DiscoveryContext::new(ModelConfig::default());
        ctx.record_error(&Error::Initialization {
            message: "missing".to_string(),
        });
        ctx.record_error(&Error::MissingCallTarget {
            function: "thing".to_string(),
        });
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].kind, DiagnosticKind::MissingCallTarget);
    }

    #[test]
    fn test_take_diagnostics_drains() {
        let mut ctx = DiscoveryContext::new(ModelConfig::default());
        ctx.record(Diagnostic::new(DiagnosticKind::Duplicate, "x", "dup"));
        assert_eq!(ctx.take_diagnostics().len(), 1);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_repeated_diagnostic_recorded_once() {
        let mut ctx = DiscoveryContext::new(ModelConfig::default());
        ctx.record(Diagnostic::new(DiagnosticKind::Deprecated, "im_old", "flagged deprecated"));
        ctx.record(Diagnostic::new(DiagnosticKind::Deprecated, "im_old", "function is deprecated"));
        ctx.record(Diagnostic::new(DiagnosticKind::Excluded, "im_old", "excluded"));
        assert_eq!(ctx.diagnostics().len(), 2);
        assert_eq!(ctx.diagnostics()[0].message, "flagged deprecated");
    }

    #[test]
    fn test_discovered_names() {
        let mut ctx = DiscoveryContext::new(ModelConfig::default());
        ctx.mark_discovered(["invert", "linear"]);
        assert!(ctx.is_discovered("linear"));
        assert!(!ctx.is_discovered("gaussblur"));
    }

    #[test]
    fn test_truncate_description() {
        assert_eq!(truncate_description("  short  ", 10), "short");
        assert_eq!(truncate_description("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate_description("exactly8", 8), "exactly8");
    }
}
