//! Core utilities for SmartOne build tools
//!
//! This crate provides the shared foundation for the Android build tooling:
//!
//! - **Error handling**: Errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML description of flavors, build types and signing
//! - **Validation**: Android rules applied to a build configuration
//! - **Process execution**: Running the Gradle wrapper and other tools
//!
//! # Example
//!
//! ```rust,no_run
//! use smartone_core::config::Config;
//! use smartone_core::validation::validate_project;
//!
//! let config = Config::load(None).expect("Failed to load configuration");
//! let report = validate_project(&config.project);
//!
//! if !report.is_valid() {
//!     eprintln!("Configuration issues detected!");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};
