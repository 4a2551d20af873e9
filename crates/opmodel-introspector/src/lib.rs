//! Operation discovery for native image-processing libraries.
//!
//! Discovers every callable operation either by walking the library's live
//! runtime type system or by parsing its GIR API description, and normalizes
//! both into the [`opmodel_core`] model.
//!
//! # Architecture
//!
//! - [`classifier`] maps type tokens to semantic kinds
//! - [`registry`] holds the run's enum types and codec formats
//! - [`argument`] turns native parameters into model arguments
//! - [`LiveDiscovery`] and [`StaticDiscovery`] are the two discovery paths
//! - [`classify`] and [`finalize`] derive flags and filter the result
//! - [`ModelBuilder`] runs all of the above and returns a [`opmodel_core::ModelBundle`]
//!
//! # Examples
//!
//! ```
//! use opmodel_core::ModelConfig;
//! use opmodel_introspector::fixture::sample_library;
//! use opmodel_introspector::{LiveDiscovery, ModelBuilder};
//!
//! let types = sample_library();
//! let bundle = ModelBuilder::new(ModelConfig::default()).build(&[&LiveDiscovery::new(&types)])?;
//!
//! let resize = bundle.operation("resize").expect("resize is discovered");
//! assert!(resize.capabilities.has_one_image_output);
//! # Ok::<(), opmodel_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod builder;
mod classify;
mod discovery;
mod filter;
mod walker;

pub mod argument;
pub mod classifier;
pub mod fixture;
pub mod gir;
pub mod registry;

pub use builder::{ModelBuilder, converge};
pub use classify::{category_for, classify};
pub use discovery::{Discovery, DiscoveryContext};
pub use filter::finalize;
pub use gir::StaticDiscovery;
pub use walker::LiveDiscovery;
