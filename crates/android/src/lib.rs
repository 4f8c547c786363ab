//! Android build-variant tooling for SmartOne
//!
//! This crate provides the Android-specific functionality:
//! - Flavor and build type dimensions
//! - Variant resolution with an explicit release-signing policy
//! - Resource packaging rules
//! - Gradle task naming and invocation

#![warn(missing_docs)]

pub mod gradle;
pub mod packaging;
pub mod resolver;
pub mod variant;

pub use resolver::{resolve, ResolvedConfig, VariantResolver};
pub use variant::{BuildType, Flavor, Variant};
