//! Shared helpers for the integration suites.

#![allow(dead_code)]

use opmodel_core::{Argument, ModelBundle, ModelConfig, Operation};
use opmodel_introspector::fixture::{FixtureTypeSystem, sample_library};
use opmodel_introspector::{Discovery, LiveDiscovery, ModelBuilder, StaticDiscovery};

/// Path of the GIR document mirroring [`sample_library`].
pub const GIR_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/vips-mini.gir");

/// Installs a test subscriber once; output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn gir() -> StaticDiscovery {
    StaticDiscovery::from_file(GIR_FIXTURE).unwrap()
}

pub fn build(sources: &[&dyn Discovery]) -> ModelBundle {
    init_tracing();
    ModelBuilder::new(ModelConfig::default()).build(sources).unwrap()
}

pub fn live_bundle(types: &FixtureTypeSystem) -> ModelBundle {
    build(&[&LiveDiscovery::new(types)])
}

pub fn static_bundle() -> ModelBundle {
    build(&[&gir()])
}

/// Live sample library first, GIR fixture as fallback.
pub fn converged_bundle() -> ModelBundle {
    let types = sample_library();
    let gir = gir();
    build(&[&LiveDiscovery::new(&types), &gir])
}

pub fn op<'a>(bundle: &'a ModelBundle, name: &str) -> &'a Operation {
    bundle
        .operation(name)
        .unwrap_or_else(|| panic!("operation {name} missing from bundle"))
}

pub fn arg<'a>(operation: &'a Operation, name: &str) -> &'a Argument {
    operation
        .argument(name)
        .unwrap_or_else(|| panic!("argument {name} missing from {}", operation.name))
}
