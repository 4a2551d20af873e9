//! Core types, traits, and errors for operation model discovery.
//!
//! This crate provides the language-neutral model that discovery produces and
//! code emission consumes, together with the seams discovery reads from.
//!
//! # Architecture
//!
//! The core consists of:
//! - Strong identifier types (`OperationName`, `TypeToken`)
//! - The operation model (`Operation`, `Argument`, `EnumType`, `FormatInfo`)
//! - Error hierarchy with fatal/recoverable classification and `Diagnostic`
//! - The live reflection seam (`traits::TypeSystem`)
//! - Configuration (`ModelConfig`) and naming helpers

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod diagnostic;
mod error;
mod model;
mod types;

pub mod naming;
pub mod traits;

pub use config::{ModelConfig, ModelConfigBuilder};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use model::{
    Argument, ArgumentSubsets, ArrayLength, Capabilities, Category, DefaultValue, Direction,
    DiscoverySource, ElementType, EnumType, EnumValue, FormatInfo, HandleKind, ModelBundle,
    Operation, ScalarKind, SemanticType,
};
pub use types::{OperationName, TypeToken};
