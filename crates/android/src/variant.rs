//! Variant dimensions
//!
//! Flavors and build types are closed sets. Selectors arriving as strings are
//! parsed here and anything outside the set is rejected with
//! [`ErrorCode::InvalidVariant`](smartone_core::ErrorCode::InvalidVariant).

use serde::{Deserialize, Serialize};
use smartone_core::config::{BuildTypeConfig, FlavorConfig, ProjectConfig};
use smartone_core::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Product flavor (branding and identifier dimension)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Development build, `.dev` application id
    Dev,
    /// Store build
    Prod,
}

impl Flavor {
    /// Every flavor, in declaration order
    pub const ALL: [Flavor; 2] = [Flavor::Dev, Flavor::Prod];

    /// Gradle name
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Dev => "dev",
            Flavor::Prod => "prod",
        }
    }

    /// This flavor's settings in `project`
    pub fn config<'a>(&self, project: &'a ProjectConfig) -> &'a FlavorConfig {
        match self {
            Flavor::Dev => &project.flavors.dev,
            Flavor::Prod => &project.flavors.prod,
        }
    }
}

/// Build type (optimization and debuggability dimension)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// Debuggable, unoptimized
    Debug,
    /// Optimized and signed for distribution
    Release,
}

impl BuildType {
    /// Every build type, in declaration order
    pub const ALL: [BuildType; 2] = [BuildType::Debug, BuildType::Release];

    /// Gradle name
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
        }
    }

    /// This build type's settings in `project`
    pub fn config<'a>(&self, project: &'a ProjectConfig) -> &'a BuildTypeConfig {
        match self {
            BuildType::Debug => &project.build_types.debug,
            BuildType::Release => &project.build_types.release,
        }
    }

    /// Whether artifacts of this type are meant for distribution
    pub fn is_release(&self) -> bool {
        matches!(self, BuildType::Release)
    }
}

fn names<const N: usize, T: Copy>(all: [T; N], name: fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(name).collect()
}

impl FromStr for Flavor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Flavor::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::invalid_variant("flavor", s, &names(Flavor::ALL, Flavor::as_str)))
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BuildType::ALL.into_iter().find(|b| b.as_str() == s).ok_or_else(|| {
            Error::invalid_variant("build type", s, &names(BuildType::ALL, BuildType::as_str))
        })
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flavor combined with one build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variant {
    /// Flavor dimension
    pub flavor: Flavor,
    /// Build type dimension
    pub build_type: BuildType,
}

impl Variant {
    /// Combine two dimensions
    pub fn new(flavor: Flavor, build_type: BuildType) -> Self {
        Self { flavor, build_type }
    }

    /// Parse both selectors, failing on the first one outside its set
    pub fn parse(flavor: &str, build_type: &str) -> Result<Self> {
        Ok(Self::new(flavor.parse()?, build_type.parse()?))
    }

    /// Every variant, flavor-major
    pub fn all() -> impl Iterator<Item = Variant> {
        Flavor::ALL
            .into_iter()
            .flat_map(|flavor| BuildType::ALL.into_iter().map(move |bt| Variant::new(flavor, bt)))
    }

    /// camelCase name, e.g. `devRelease`
    pub fn name(&self) -> String {
        format!("{}{}", self.flavor.as_str(), capitalize(self.build_type.as_str()))
    }

    /// PascalCase name used in Gradle task names, e.g. `DevRelease`
    pub fn task_suffix(&self) -> String {
        format!("{}{}", capitalize(self.flavor.as_str()), capitalize(self.build_type.as_str()))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
