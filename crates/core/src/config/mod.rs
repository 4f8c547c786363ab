//! Build configuration loading and schema definitions
//!
//! The TOML description of the Android app: base settings, flavors, build
//! types, signing identities and packaging policy.

mod loader;
mod schema;

pub use loader::{parse_config, Config, CONFIG_CANDIDATES};
pub use schema::*;
