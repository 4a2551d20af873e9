//! Live discovery over the native runtime type system.
//!
//! Starting at the abstract base operation type, descendants are visited
//! breadth-first with an explicit queue. Each concrete type is instantiated,
//! inspected and released before the next one is touched, so at most one
//! native instance is alive at any time.

use crate::argument::NativeParam;
use crate::classifier::EnumKind;
use crate::discovery::{Discovery, DiscoveryContext, build_operation};
use opmodel_core::traits::{
    EnumValueSource, OperationFlags, OperationInstance, ParamSpec, RawEnumValue, TypeHandle,
    TypeSystem,
};
use opmodel_core::{
    Diagnostic, DiagnosticKind, Direction, DiscoverySource, Error, Operation, Result,
};
use std::collections::{HashSet, VecDeque};

/// Live discovery path.
///
/// # Examples
///
/// ```
/// use opmodel_core::ModelConfig;
/// use opmodel_introspector::fixture::{FixtureOperation, FixtureTypeSystem};
/// use opmodel_introspector::{Discovery, DiscoveryContext, LiveDiscovery};
///
/// let mut types = FixtureTypeSystem::new();
/// types.add_operation(
///     FixtureOperation::new("invert", "invert an image")
///         .input("in", "VipsImage")
///         .output("out", "VipsImage"),
/// );
///
/// let mut ctx = DiscoveryContext::new(ModelConfig::default());
/// let operations = LiveDiscovery::new(&types).discover(&mut ctx)?;
///
/// assert_eq!(operations.len(), 1);
/// assert_eq!(operations[0].call_target.as_deref(), Some("vips_invert"));
/// # Ok::<(), opmodel_core::Error>(())
/// ```
#[derive(Debug)]
pub struct LiveDiscovery<'t, T> {
    types: &'t T,
}

impl<'t, T: TypeSystem> LiveDiscovery<'t, T> {
    /// Creates a walker over `types`.
    #[must_use]
    pub const fn new(types: &'t T) -> Self {
        Self { types }
    }

    /// Concrete descendants of `base` in breadth-first order.
    fn operation_types(&self, base: TypeHandle) -> Vec<TypeHandle> {
        let mut queue: VecDeque<TypeHandle> = self.types.children(base).into();
        let mut seen: HashSet<TypeHandle> = queue.iter().copied().collect();
        seen.insert(base);
        let mut concrete = Vec::new();

        while let Some(ty) = queue.pop_front() {
            for child in self.types.children(ty) {
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
            if self.types.is_abstract(ty) {
                continue;
            }
            concrete.push(ty);
        }

        concrete
    }

    fn enum_kind(&self, ty: TypeHandle) -> EnumKind {
        if self.types.is_flags(ty) {
            EnumKind::Flags
        } else if self.types.is_enum(ty) {
            EnumKind::Enum
        } else {
            EnumKind::None
        }
    }

    fn native_param(&self, spec: &ParamSpec) -> NativeParam {
        let direction = if spec.is_output() {
            Direction::Output
        } else {
            Direction::Input
        };
        let mut param = NativeParam::new(spec.name.as_str(), spec.type_name.clone())
            .with_description(spec.description.as_str())
            .with_direction(direction)
            .with_enum_kind(self.enum_kind(spec.value_type));
        param.required = spec.is_required();
        param.default.clone_from(&spec.default);
        param
    }

    /// Instantiates one concrete type and converts it, or records why not.
    fn inspect(&self, ctx: &mut DiscoveryContext, ty: TypeHandle) -> Option<Operation> {
        let type_name = self.types.type_name(ty).unwrap_or_else(|| ty.to_string());
        let class = self.types.class_info(ty);
        if class.nickname.is_empty() {
            ctx.record(Diagnostic::new(
                DiagnosticKind::MissingCallTarget,
                type_name,
                "operation class has no nickname",
            ));
            return None;
        }
        if ctx.is_discovered(&class.nickname) {
            tracing::trace!(operation = %class.nickname, "already discovered by an earlier source");
            return None;
        }

        let Some(instance) = self.types.instantiate(ty) else {
            ctx.record_error(&Error::InstantiationFailed { type_name });
            return None;
        };

        let flags = instance.flags();
        let mut specs = Vec::new();
        if !flags.contains(OperationFlags::DEPRECATED) {
            instance.walk_arguments(&mut |spec: &ParamSpec| {
                if spec.is_deprecated() {
                    tracing::trace!(operation = %class.nickname, argument = %spec.name, "skipping deprecated argument");
                } else {
                    specs.push(spec.clone());
                }
            });
        }
        drop(instance);

        if flags.contains(OperationFlags::DEPRECATED) {
            ctx.record(Diagnostic::new(
                DiagnosticKind::Deprecated,
                class.nickname,
                "operation is flagged deprecated",
            ));
            return None;
        }

        let params: Vec<NativeParam> = specs.iter().map(|spec| self.native_param(spec)).collect();
        let mut operation = build_operation(
            ctx,
            DiscoverySource::Live,
            &class.nickname,
            &class.description,
            &params,
        );
        operation.call_target = Some(format!(
            "{}{}",
            ctx.config().call_target_prefix,
            class.nickname
        ));
        tracing::trace!(operation = %class.nickname, native_type = %type_name, flags = flags.bits(), "inspected operation type");
        Some(operation)
    }
}

impl<T: TypeSystem> EnumValueSource for LiveDiscovery<'_, T> {
    fn enum_values(&self, native_name: &str) -> Option<Vec<RawEnumValue>> {
        let ty = self.types.type_from_name(native_name)?;
        (self.types.is_enum(ty) || self.types.is_flags(ty)).then(|| self.types.enum_values(ty))
    }

    fn is_flags_type(&self, native_name: &str) -> bool {
        self.types
            .type_from_name(native_name)
            .is_some_and(|ty| self.types.is_flags(ty))
    }
}

impl<T: TypeSystem> Discovery for LiveDiscovery<'_, T> {
    fn source(&self) -> DiscoverySource {
        DiscoverySource::Live
    }

    fn discover(&self, ctx: &mut DiscoveryContext) -> Result<Vec<Operation>> {
        let base_name = ctx.config().base_operation_type.clone();
        let base = self
            .types
            .type_from_name(&base_name)
            .ok_or_else(|| Error::Initialization {
                message: format!("base operation type '{base_name}' is not registered"),
            })?;

        let candidates = self.operation_types(base);
        tracing::debug!(candidates = candidates.len(), "enumerated concrete operation types");

        let operations: Vec<Operation> = candidates
            .into_iter()
            .filter_map(|ty| self.inspect(ctx, ty))
            .collect();

        tracing::info!(operations = operations.len(), "live discovery complete");
        Ok(operations)
    }
}
