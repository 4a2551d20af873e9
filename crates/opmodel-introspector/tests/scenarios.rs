//! End-to-end scenarios over the fixture library and GIR document.
//!
//! Covers:
//! - plain image-to-image operations
//! - save-to-buffer pairing
//! - array detection across both discovery paths
//! - format discovery exclusions
//! - target identifier collisions

mod support;

use opmodel_core::{
    ArrayLength, Category, DiagnosticKind, Direction, DiscoverySource, Error, ScalarKind,
    SemanticType,
};
use opmodel_introspector::fixture::{FixtureOperation, FixtureTypeSystem, sample_library};
use opmodel_introspector::StaticDiscovery;
use support::{arg, converged_bundle, live_bundle, op, static_bundle};

/// Tests that invert has one image in and one owned image out
#[test]
fn test_invert_image_in_image_out() {
    let bundle = live_bundle(&sample_library());
    let invert = op(&bundle, "invert");

    assert!(invert.capabilities.has_image_input);
    assert!(invert.capabilities.has_image_output);
    assert!(invert.capabilities.has_one_image_output);
    assert_eq!(invert.required_inputs().count(), 1);
    assert_eq!(invert.required_outputs().count(), 1);
    assert_eq!(invert.category, Category::Arithmetic);
    assert_eq!(invert.call_target.as_deref(), Some("vips_invert"));
}

/// Tests that the static path agrees on invert
#[test]
fn test_invert_from_gir() {
    let bundle = static_bundle();
    let invert = op(&bundle, "invert");

    assert_eq!(invert.source, DiscoverySource::Static);
    assert!(invert.capabilities.has_one_image_output);
    assert_eq!(invert.subsets.required_inputs.len(), 1);
    assert_eq!(invert.subsets.required_outputs.len(), 1);
    assert!(invert.variadic);
}

/// Tests that buf and len of jpegsave_buffer form one logical buffer output
#[test]
fn test_save_buffer_pairs_buf_and_len() {
    let bundle = static_bundle();
    let save = op(&bundle, "jpegsave_buffer");

    assert!(save.capabilities.has_buffer_output);
    assert!(save.capabilities.has_image_input);
    assert!(!save.capabilities.has_image_output);

    let buf = arg(save, "buf");
    assert_eq!(buf.semantic, SemanticType::Buffer);
    assert_eq!(buf.direction, Direction::Output);
    assert!(buf.required);
    assert_eq!(buf.representation, "void**");
    assert_eq!(
        buf.array_length,
        Some(ArrayLength::Companion {
            argument: "len".to_string(),
            verified: true
        })
    );

    let len = arg(save, "len");
    assert_eq!(len.direction, Direction::Output);
    assert!(len.required && len.derived);
    assert_eq!(len.representation, "size_t*");
    assert_eq!(len.length_of.as_deref(), Some("buf"));

    let visible: Vec<_> = save.visible_arguments().map(|a| a.name.as_str()).collect();
    assert_eq!(visible, vec!["in", "buf", "keep"]);
}

/// Tests that the live path synthesizes the byte count of a buffer output
#[test]
fn test_save_buffer_live_synthesizes_len() {
    let bundle = live_bundle(&sample_library());
    let save = op(&bundle, "jpegsave_buffer");

    assert!(save.capabilities.has_buffer_output);
    let names: Vec<_> = save.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["in", "buffer", "len", "keep"]);
    assert!(arg(save, "len").derived);
}

/// Tests that linear's coefficients are arrays only on the live path, and
/// that the converged model keeps the live version
#[test]
fn test_linear_arrays_converge_to_live() {
    let gir_only = static_bundle();
    let static_linear = op(&gir_only, "linear");
    assert_eq!(
        arg(static_linear, "a").semantic,
        SemanticType::scalar(ScalarKind::Double)
    );

    let bundle = converged_bundle();
    let linear = op(&bundle, "linear");
    assert_eq!(linear.source, DiscoverySource::Live);

    let a = arg(linear, "a");
    let b = arg(linear, "b");
    assert_eq!(a.semantic, SemanticType::array_of(ScalarKind::Double));
    assert_eq!(b.semantic, SemanticType::array_of(ScalarKind::Double));
    assert_eq!(a.array_length.as_ref().and_then(ArrayLength::companion), Some("n"));
    assert_eq!(b.array_length.as_ref().and_then(ArrayLength::companion), Some("n"));
    assert!(arg(linear, "n").derived);

    let names: Vec<_> = linear.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["in", "out", "a", "b", "uchar", "n"]);
}

/// Tests that arrays without a declared count share one synthesized count
#[test]
fn test_arrays_share_synthesized_count() {
    let mut types = FixtureTypeSystem::new();
    types.add_operation(
        FixtureOperation::new("blend_all", "blend an array of images")
            .input("in", "VipsArrayImage")
            .output("out", "VipsImage")
            .input("mode", "VipsArrayInt"),
    );

    let bundle = live_bundle(&types);
    let blend = op(&bundle, "blend_all");
    let names: Vec<_> = blend.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["in", "out", "mode", "n"]);

    let shared = Some(ArrayLength::Companion {
        argument: "n".to_string(),
        verified: true,
    });
    assert_eq!(arg(blend, "in").array_length, shared);
    assert_eq!(arg(blend, "mode").array_length, shared);
    assert_eq!(blend.visible_arguments().count(), 3);
}

/// Tests that profile_load is an operation but not a format
#[test]
fn test_profile_load_not_a_format() {
    for bundle in [live_bundle(&sample_library()), static_bundle()] {
        let profile = op(&bundle, "profile_load");
        assert_eq!(profile.image_type, "ImageTypeUnknown");
        assert!(!bundle.formats.iter().any(|f| f.token.contains("profile")));
        assert!(bundle.formats.iter().any(|f| f.token == "jpeg"));
    }
}

/// Tests that the first of two colliding target identifiers survives
#[test]
fn test_target_collision_first_wins() {
    let mut types = FixtureTypeSystem::new();
    types.add_operation(
        FixtureOperation::new("draw_line", "draw a line on an image").input("image", "VipsImage"),
    );
    types.add_operation(
        FixtureOperation::new("draw__line", "draw a line, again")
            .input("image", "VipsImage")
            .with_type_name("VipsDrawLineAgain"),
    );

    let bundle = live_bundle(&types);
    assert_eq!(bundle.operations.len(), 1);
    assert_eq!(bundle.operations[0].name.as_str(), "draw_line");
    assert_eq!(bundle.operations[0].target_name, "DrawLine");

    let duplicate = bundle
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::Duplicate)
        .unwrap();
    assert_eq!(duplicate.subject, "draw__line");
}

/// Tests that static-only operations are appended after live ones
#[test]
fn test_static_only_operation_appended() {
    let bundle = converged_bundle();
    let gaussblur = op(&bundle, "gaussblur");

    assert_eq!(gaussblur.source, DiscoverySource::Static);
    assert_eq!(gaussblur.category, Category::Convolution);
    assert!(!arg(gaussblur, "min_ampl").required);

    let last_live = bundle
        .operations
        .iter()
        .rposition(|o| o.source == DiscoverySource::Live)
        .unwrap();
    let first_static = bundle
        .operations
        .iter()
        .position(|o| o.source == DiscoverySource::Static)
        .unwrap();
    assert!(last_live < first_static);
}

/// Tests the recoverable events of one converged run
#[test]
fn test_recoverable_events_recorded() {
    let bundle = converged_bundle();
    let has = |kind: DiagnosticKind, subject: &str| {
        bundle
            .diagnostics
            .iter()
            .any(|d| d.kind == kind && d.subject == subject)
    };

    assert!(has(DiagnosticKind::InstantiationFailed, "VipsBroken"));
    assert!(has(DiagnosticKind::Deprecated, "im_old"));
    assert!(has(DiagnosticKind::MissingCallTarget, "type_find"));
    assert!(has(DiagnosticKind::Excluded, "cache"));
    assert!(has(DiagnosticKind::Excluded, "jpegload_source"));
    assert!(has(DiagnosticKind::SkipGeneration, "composite2"));

    assert!(bundle.operation("broken").is_none());
    assert!(bundle.operation("im_old").is_none());
    assert!(bundle.operation("type_find").is_none());
}

/// Tests that the static path reports force-included functions
#[test]
fn test_force_included_reported_by_static_path() {
    let bundle = static_bundle();
    for name in ["arrayjoin", "linear"] {
        assert!(
            bundle
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::ForceIncluded && d.subject == name),
            "{name}"
        );
    }
}

/// Tests that the fallback path adds nothing about operations the live path
/// already provided, and that no event is reported twice
#[test]
fn test_converged_diagnostics_belong_to_emitted_sources() {
    let bundle = converged_bundle();

    for diagnostic in &bundle.diagnostics {
        let operation = diagnostic.subject.split('.').next().unwrap_or_default();
        if let Some(found) = bundle.operation(operation) {
            assert_ne!(found.source, DiscoverySource::Live, "{diagnostic}");
        }
    }

    let mut seen = std::collections::HashSet::new();
    for diagnostic in &bundle.diagnostics {
        assert!(
            seen.insert((diagnostic.kind, diagnostic.subject.clone())),
            "{diagnostic} reported twice"
        );
    }
    let deprecated = bundle
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Deprecated && d.subject == "im_old")
        .count();
    assert_eq!(deprecated, 1);
}

/// Tests format ordinals, piggybacks and per-operation image types
#[test]
fn test_formats_and_image_types() {
    let bundle = converged_bundle();
    let format = |token: &str| bundle.formats.iter().find(|f| f.token == token).unwrap();

    assert_eq!(bundle.formats[0].token, "unknown");
    assert_eq!(format("jpeg").ordinal, 1);
    assert!(format("jpeg").has_loader && format("jpeg").has_saver);
    assert_eq!(format("jpeg").mime_type, "image/jpeg");

    // gif has no saver of its own in the library
    assert!(format("gif").has_saver);
    assert!(format("avif").has_loader && format("avif").has_saver);
    assert!(format("magick").has_saver);

    assert_eq!(op(&bundle, "jpegload_buffer").image_type, "ImageTypeJpeg");
    assert_eq!(op(&bundle, "heifsave").image_type, "ImageTypeHeif");
    assert_eq!(op(&bundle, "resize").image_type, "ImageTypeUnknown");
}

/// Tests that the bundle serializes to JSON for the emission layer
#[test]
fn test_bundle_serializes() {
    let bundle = converged_bundle();
    let json = bundle.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["operations"].as_array().is_some_and(|ops| !ops.is_empty()));
    assert!(value["formats"].as_array().is_some());
}

/// Tests that a GIR file on disk without a namespace is rejected
#[test]
fn test_gir_file_without_namespace_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Empty-1.0.gir");
    std::fs::write(&path, r#"<?xml version="1.0"?><repository version="1.2"></repository>"#)
        .unwrap();

    let err = StaticDiscovery::from_file(&path).unwrap_err();
    assert!(matches!(err, Error::MetadataDecode { .. }), "{err}");
    assert!(err.to_string().contains("Empty-1.0.gir"));
}
