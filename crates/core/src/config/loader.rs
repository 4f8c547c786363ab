//! Configuration file loading

use super::schema::ProjectConfig;
use crate::error::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};

/// Standard locations searched when no path is given
pub const CONFIG_CANDIDATES: [&str; 3] = [
    "smartone-build.toml",
    ".smartone-build.toml",
    "android/smartone-build.toml",
];

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed configuration
    pub project: ProjectConfig,
    /// File it was read from, `None` for built-in defaults
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path that does not exist is an error. Without one, the
    /// standard locations are searched relative to the working directory and
    /// the built-in defaults apply when none exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Path::new("."))
    }

    /// Like [`Config::load`], searching the standard locations under `root`
    pub fn load_from(path: Option<&Path>, root: &Path) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(root),
        };

        let project = match config_path {
            Some(ref p) => {
                tracing::info!(path = %p.display(), "Loading build configuration");
                load_config_file(p)?
            }
            None => {
                tracing::debug!("No build configuration found, using defaults");
                ProjectConfig::default()
            }
        };

        Ok(Self {
            project,
            path: config_path,
        })
    }

    /// Directory relative paths in the configuration resolve against
    pub fn base_dir(&self) -> &Path {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }

    /// Wrap an in-memory configuration
    pub fn from_project(project: ProjectConfig) -> Self {
        Self {
            project,
            path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_project(ProjectConfig::default())
    }
}

/// Find configuration file in standard locations
fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|candidate| candidate.is_file())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Reading {}", path.display()))?;

    parse_config(&content)
        .context(format!("Parsing {}", path.display()))
        .with_suggestion("Flavors, build types and keys are fixed; check the table and key names")
}

/// Parse configuration text, naming each signing identity after its table key
pub fn parse_config(content: &str) -> Result<ProjectConfig> {
    let mut project: ProjectConfig = toml::from_str(content)?;
    for (name, identity) in project.signing.iter_mut() {
        identity.name = name.clone();
    }
    Ok(project)
}
