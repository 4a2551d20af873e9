//! Dedup/filter stage run right before hand-off.

use crate::discovery::DiscoveryContext;
use opmodel_core::{Diagnostic, DiagnosticKind, Operation};
use std::collections::HashMap;

/// Drops excluded, skip-generation and colliding operations.
///
/// Operations are checked in order against the exclusion list (names and
/// fragments), then the skip-generation list, then target identifier
/// uniqueness; on a collision the first operation wins. Every drop is
/// recorded on `ctx`.
///
/// # Examples
///
/// ```
/// use opmodel_core::{DiscoverySource, ModelConfig, Operation};
/// use opmodel_introspector::{DiscoveryContext, finalize};
///
/// let ops = vec![
///     Operation::new("draw_line", "DrawLine", "", DiscoverySource::Live),
///     Operation::new("draw__line", "DrawLine", "", DiscoverySource::Live),
///     Operation::new("cache", "Cache", "", DiscoverySource::Live),
/// ];
///
/// let mut ctx = DiscoveryContext::new(ModelConfig::default());
/// let kept = finalize(ops, &mut ctx);
///
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].name.as_str(), "draw_line");
/// assert_eq!(ctx.diagnostics().len(), 2);
/// ```
pub fn finalize(operations: Vec<Operation>, ctx: &mut DiscoveryContext) -> Vec<Operation> {
    let before = operations.len();
    let mut first_by_target: HashMap<String, String> = HashMap::new();
    let mut kept = Vec::with_capacity(before);

    for operation in operations {
        let name = operation.name.as_str();
        if ctx.config().is_excluded(name) {
            ctx.record(Diagnostic::new(
                DiagnosticKind::Excluded,
                name,
                "operation is on the exclusion list",
            ));
            continue;
        }
        if ctx.config().is_skip_generation(name) {
            ctx.record(Diagnostic::new(
                DiagnosticKind::SkipGeneration,
                name,
                "operation is wrapped by hand",
            ));
            continue;
        }
        if let Some(first) = first_by_target.get(&operation.target_name) {
            ctx.record(Diagnostic::new(
                DiagnosticKind::Duplicate,
                name,
                format!(
                    "target identifier {} already taken by {first}",
                    operation.target_name
                ),
            ));
            continue;
        }

        first_by_target.insert(operation.target_name.clone(), name.to_string());
        kept.push(operation);
    }

    tracing::info!(kept = kept.len(), dropped = before - kept.len(), "finalized operation list");
    kept
}
