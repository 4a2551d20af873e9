//! Model invariants checked over every operation of a full run.

mod support;

use opmodel_core::traits::EnumValueSource;
use opmodel_core::{ArrayLength, ModelBundle, ModelConfig, ScalarKind, SemanticType};
use opmodel_introspector::fixture::sample_library;
use opmodel_introspector::registry::{EnumRegistry, FormatTable};
use opmodel_introspector::{Discovery, DiscoveryContext, LiveDiscovery};
use std::collections::HashSet;
use support::{converged_bundle, gir, live_bundle, static_bundle};

fn is_integer(semantic: SemanticType) -> bool {
    matches!(
        semantic,
        SemanticType::Scalar {
            scalar: ScalarKind::Int | ScalarKind::UInt | ScalarKind::Int64 | ScalarKind::UInt64
        }
    )
}

fn bundles() -> Vec<ModelBundle> {
    vec![
        live_bundle(&sample_library()),
        static_bundle(),
        converged_bundle(),
    ]
}

/// Tests that the four subsets cover every argument exactly once
#[test]
fn test_subsets_partition_arguments() {
    for bundle in bundles() {
        for operation in &bundle.operations {
            let subsets = &operation.subsets;
            let mut indices: Vec<usize> = subsets
                .required_inputs
                .iter()
                .chain(&subsets.optional_inputs)
                .chain(&subsets.required_outputs)
                .chain(&subsets.optional_outputs)
                .copied()
                .collect();
            indices.sort_unstable();
            let expected: Vec<usize> = (0..operation.arguments.len()).collect();
            assert_eq!(indices, expected, "subsets of {}", operation.name);
        }
    }
}

/// Tests that one image output never coexists with an image array input
#[test]
fn test_one_image_output_implies_single_owned_output() {
    for bundle in bundles() {
        for operation in &bundle.operations {
            if !operation.capabilities.has_one_image_output {
                continue;
            }
            let image_outputs = operation.outputs().filter(|a| a.is_image()).count();
            assert_eq!(image_outputs, 1, "{}", operation.name);
            assert!(!operation.capabilities.has_array_image_input, "{}", operation.name);
        }
    }
}

/// Tests that every array has a length contract that resolves in its operation
#[test]
fn test_array_lengths_resolve() {
    for bundle in bundles() {
        for operation in &bundle.operations {
            for argument in operation.arguments.iter().filter(|a| a.is_array()) {
                let length = argument
                    .array_length
                    .as_ref()
                    .unwrap_or_else(|| panic!("{}.{} has no length", operation.name, argument.name));
                if let ArrayLength::Companion { argument: companion, .. } = length {
                    let count = operation
                        .argument(companion)
                        .unwrap_or_else(|| panic!("{}.{companion} missing", operation.name));
                    assert!(is_integer(count.semantic), "{}.{companion}", operation.name);
                    assert!(count.derived, "{}.{companion}", operation.name);
                }
            }
        }
    }
}

/// Tests that every registered enum has a distinct target name
#[test]
fn test_enum_target_names_injective() {
    for bundle in bundles() {
        let mut seen = HashSet::new();
        for enum_type in &bundle.enums {
            assert!(
                seen.insert(enum_type.target_name.clone()),
                "{} collides",
                enum_type.native_name
            );
        }
    }

    let mut registry = EnumRegistry::new(&ModelConfig::default());
    let names = ["VipsKeep", "VipsForeignKeep", "ForeignKeep", "Keep"];
    let targets: HashSet<String> = names
        .iter()
        .filter_map(|name| registry.register(name, false))
        .collect();
    assert_eq!(targets.len(), names.len());
}

/// Tests that re-registration keeps the target name and the loaded values
#[test]
fn test_enum_registration_idempotent() {
    let types = sample_library();
    let live = LiveDiscovery::new(&types);
    let mut registry = EnumRegistry::new(&ModelConfig::default());

    let first = registry.register("VipsKernel", false);
    let count = registry.values("VipsKernel", &live).unwrap().len();
    let second = registry.register("VipsKernel", false);

    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.values("VipsKernel", &live).unwrap().len(), count);
    assert_eq!(registry.enum_types()[0].values.len(), count);
}

/// Tests that format discovery gives the same table on repeated runs
#[test]
fn test_format_discovery_idempotent() {
    let types = sample_library();
    let live = LiveDiscovery::new(&types);
    let mut ctx = DiscoveryContext::new(ModelConfig::default());
    let operations = live.discover(&mut ctx).unwrap();
    ctx.enums_mut()
        .values("VipsForeignHeifCompression", &live)
        .unwrap();

    let names: Vec<&str> = operations.iter().map(|o| o.name.as_str()).collect();
    let first = FormatTable::discover(names.iter().copied(), ctx.enums());
    let second = FormatTable::discover(names.iter().rev().copied(), ctx.enums());

    assert_eq!(first.formats(), second.formats());
    let ordinals: Vec<u32> = first.formats().iter().map(|f| f.ordinal).collect();
    let expected: Vec<u32> = (0..).take(ordinals.len()).collect();
    assert_eq!(ordinals, expected);
}

/// Tests that every operation carries a call target and a description limit
#[test]
fn test_operations_fully_populated() {
    let limit = ModelConfig::default().description_limit;
    for bundle in bundles() {
        for operation in &bundle.operations {
            assert!(operation.is_classified(), "{}", operation.name);
            assert!(
                operation
                    .call_target
                    .as_deref()
                    .is_some_and(|t| t.starts_with("vips_")),
                "{}",
                operation.name
            );
            assert!(operation.description.chars().count() <= limit);
            assert!(!operation.target_name.is_empty());
            for argument in &operation.arguments {
                let subject = format!("{}.{}", operation.name, argument.name);
                assert!(!argument.representation.is_empty(), "{subject}");
                assert_eq!(argument.is_enum(), argument.enum_type.is_some(), "{subject}");
            }
        }
    }
}

/// Tests that the GIR document exposes its enums as a value source
#[test]
fn test_gir_enum_source() {
    let gir = gir();
    assert!(gir.is_flags_type("VipsForeignKeep"));
    assert!(!gir.is_flags_type("VipsKernel"));
    let kernel = gir.enum_values("VipsKernel").unwrap();
    assert_eq!(kernel[5].name, "VIPS_KERNEL_LANCZOS3");
    assert_eq!(kernel[5].value, 5);
}
