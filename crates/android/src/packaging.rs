//! Resource packaging policy
//!
//! Decides which archive entries are dropped when the app is packaged. The
//! exclusion globs use Gradle's syntax: `*` stays within one path segment,
//! `{a,b}` alternation is allowed, and a leading `/` is optional.

use glob::{MatchOptions, Pattern};
use smartone_core::config::PackagingConfig;
use smartone_core::error::{Error, Result};
use smartone_core::validation::{ValidationResult, Validator};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled exclusion rules
#[derive(Debug, Clone)]
pub struct PackagingPolicy {
    globs: Vec<String>,
    patterns: Vec<Pattern>,
}

impl PackagingPolicy {
    /// Compile a list of exclusion globs
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self> {
        let mut patterns = Vec::new();
        for glob in globs {
            patterns.extend(compile(glob.as_ref())?);
        }

        Ok(Self {
            globs: globs.iter().map(|g| g.as_ref().to_string()).collect(),
            patterns,
        })
    }

    /// Compile the policy from configuration
    pub fn from_config(config: &PackagingConfig) -> Result<Self> {
        Self::new(&config.resource_excludes)
    }

    /// Check every exclude of `config` without keeping the policy
    pub fn validate(config: &PackagingConfig) -> ValidationResult {
        config
            .resource_excludes
            .iter()
            .fold(Validator::new(), |validator, glob| {
                validator.custom("packaging.resource_excludes", || {
                    compile(glob).err().map(|e| e.message)
                })
            })
            .validate()
    }

    /// The globs as configured
    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    /// Whether an archive entry is excluded from the package
    pub fn is_excluded(&self, path: &str) -> bool {
        let path = normalize(path);
        self.patterns
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }

    /// Entries that survive packaging, in input order
    pub fn filter_entries<'p, I>(&self, paths: I) -> Vec<&'p str>
    where
        I: IntoIterator<Item = &'p str>,
    {
        paths.into_iter().filter(|p| !self.is_excluded(p)).collect()
    }
}

fn compile(glob: &str) -> Result<Vec<Pattern>> {
    expand_braces(normalize(glob))
        .iter()
        .map(|expanded| {
            Pattern::new(expanded).map_err(|e| {
                Error::config(format!("Invalid packaging exclude '{}': {}", glob, e))
                    .with_suggestion("Excludes use Gradle glob syntax, e.g. META-INF/*.version")
            })
        })
        .collect()
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Expand the first `{a,b}` group, recursively
fn expand_braces(glob: &str) -> Vec<String> {
    let Some(open) = glob.find('{') else {
        return vec![glob.to_string()];
    };
    let Some(close) = glob[open..].find('}').map(|i| open + i) else {
        return vec![glob.to_string()];
    };

    let (prefix, rest) = (&glob[..open], &glob[close + 1..]);
    glob[open + 1..close]
        .split(',')
        .flat_map(|alt| expand_braces(&format!("{}{}{}", prefix, alt, rest)))
        .collect()
}
