//! Build configuration validation
//!
//! A fluent [`Validator`] collects errors and warnings, and
//! [`validate_project`] applies the Android rules to a whole
//! [`ProjectConfig`]:
//! - Application ids and namespaces are dotted Java package names
//! - SDK levels are ordered `min <= target <= compile`
//! - Version codes fit the Play Store range
//! - Signing references point at declared identities, and release builds
//!   only use the debug keystore when the signing policy allows it
//! - Java and Kotlin targets agree, and desugaring has its library
//!
//! # Example
//!
//! ```rust
//! use smartone_core::config::ProjectConfig;
//! use smartone_core::validation::validate_project;
//!
//! let result = validate_project(&ProjectConfig::default());
//! assert!(result.is_valid());
//! ```

use crate::config::{BuildTypeConfig, DependencyConfiguration, ProjectConfig};
use crate::error::{Error, ErrorCode, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ABIs the Android NDK can package
pub const KNOWN_ABIS: [&str; 4] = ["armeabi-v7a", "arm64-v8a", "x86", "x86_64"];

/// Highest version code Google Play accepts
pub const MAX_VERSION_CODE: u32 = 2_100_000_000;

/// Java language levels the Android Gradle plugin accepts
pub const JAVA_VERSIONS: [&str; 4] = ["1.8", "11", "17", "21"];

const ANDROID_APPLICATION_PLUGIN: &str = "com.android.application";
const KAPT_PLUGIN: &str = "kotlin-kapt";

static NDK_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid NDK version regex"));

static PACKAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*(\.[a-zA-Z][a-zA-Z0-9_]*)+$").expect("valid package regex")
});

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::new(
                ErrorCode::ConfigValidationError,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    fn error(
        mut self,
        field: &str,
        message: String,
        code: &str,
        expected: Option<String>,
        actual: Option<String>,
    ) -> Self {
        self.result.add_error(ValidationError {
            field: field.to_string(),
            message,
            code: code.to_string(),
            expected,
            actual,
        });
        self
    }

    /// Validate that a field is not empty
    pub fn required(self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            return self.error(
                field,
                "Field is required".to_string(),
                "REQUIRED",
                Some("non-empty value".to_string()),
                Some("empty".to_string()),
            );
        }
        self
    }

    /// Validate against a precompiled pattern
    pub fn matches(self, field: &str, value: &str, pattern: &Regex, description: &str) -> Self {
        if !pattern.is_match(value) {
            return self.error(
                field,
                format!("Must be {}", description),
                "PATTERN",
                Some(description.to_string()),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate that a value is a dotted Java package name
    pub fn package_name(self, field: &str, value: &str) -> Self {
        self.matches(field, value, &PACKAGE_NAME, "a dotted package name (e.g. com.example.app)")
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of(self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            return self.error(
                field,
                format!("Must be one of: {}", allowed.join(", ")),
                "ONE_OF",
                Some(allowed.join(", ")),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate a numeric range
    pub fn range<T: PartialOrd + std::fmt::Display>(
        self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            return self.error(
                field,
                format!("Must be between {} and {}", min, max),
                "RANGE",
                Some(format!("{} - {}", min, max)),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate that `lower <= upper`
    pub fn ordered<T: PartialOrd + std::fmt::Display>(
        self,
        field: &str,
        lower: (&str, T),
        upper: (&str, T),
    ) -> Self {
        if lower.1 > upper.1 {
            return self.error(
                field,
                format!("{} ({}) must not exceed {} ({})", lower.0, lower.1, upper.0, upper.1),
                "ORDER",
                Some(format!("{} <= {}", lower.0, upper.0)),
                Some(format!("{} > {}", lower.1, upper.1)),
            );
        }
        self
    }

    /// Add a custom validation
    pub fn custom<F>(self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        match f() {
            Some(message) => self.error(field, message, "CUSTOM", None, None),
            None => self,
        }
    }

    /// Add a warning (non-blocking)
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Validate a complete build configuration
pub fn validate_project(project: &ProjectConfig) -> ValidationResult {
    let app = &project.app;

    let mut validator = Validator::new()
        .package_name("app.application_id", &app.application_id)
        .package_name("app.namespace", &app.namespace)
        .required("app.app_name", &app.app_name)
        .required("app.version_name", &app.version_name)
        .range("app.version_code", app.version_code, 1, MAX_VERSION_CODE)
        .ordered("app.min_sdk", ("min_sdk", app.min_sdk), ("target_sdk", app.target_sdk))
        .ordered(
            "app.target_sdk",
            ("target_sdk", app.target_sdk),
            ("compile_sdk", app.compile_sdk),
        )
        .matches("app.ndk_version", &app.ndk_version, &NDK_VERSION, "an NDK release (e.g. 25.1.8937393)")
        .required("app.test_instrumentation_runner", &app.test_instrumentation_runner)
        .custom("app.abi_filters", || {
            app.abi_filters
                .is_empty()
                .then(|| "At least one ABI must be packaged".to_string())
        });

    for abi in &app.abi_filters {
        validator = validator.one_of("app.abi_filters", abi, &KNOWN_ABIS);
    }

    for (name, flavor) in [("dev", &project.flavors.dev), ("prod", &project.flavors.prod)] {
        validator = check_suffix(
            validator,
            &format!("flavors.{}.application_id_suffix", name),
            &app.application_id,
            flavor.application_id_suffix.as_deref(),
        );
    }

    for (name, build_type) in [
        ("debug", &project.build_types.debug),
        ("release", &project.build_types.release),
    ] {
        validator = check_build_type(validator, project, name, build_type);
    }

    for (name, identity) in &project.signing {
        validator = validator
            .required(&format!("signing.{}.store_file", name), &identity.store_file)
            .required(&format!("signing.{}.key_alias", name), &identity.key_alias);
    }

    check_toolchain(validator, project)
        .warn_if(
            "build_types.release.signing_config",
            project.build_types.release.signing_config.is_none(),
            "Release builds have no signing identity and cannot be resolved",
        )
        .warn_if(
            "signing_policy.allow_debug_signing_for_release",
            project.signing_policy.allow_debug_signing_for_release,
            "Release builds may be signed with the debug keystore",
        )
        .warn_if(
            "lint.abort_on_error",
            !project.lint.abort_on_error,
            "Lint errors will not fail the build",
        )
        .validate()
}

/// Warn about declared keystores missing on disk
///
/// Relative paths resolve against `base_dir`. The SDK debug keystore is
/// skipped since Gradle creates it on first use.
pub fn validate_keystores(project: &ProjectConfig, base_dir: &Path) -> ValidationResult {
    let mut validator = Validator::new();
    for (name, identity) in &project.signing {
        if identity.is_debug() || identity.store_file.trim().is_empty() {
            continue;
        }
        let store_file = PathBuf::from(identity.expanded_store_file());
        let store_file = if store_file.is_absolute() {
            store_file
        } else {
            base_dir.join(store_file)
        };
        tracing::debug!(identity = %name, path = %store_file.display(), "Checking keystore");
        validator = validator.warn_if(
            &format!("signing.{}.store_file", name),
            !store_file.is_file(),
            &format!("Keystore not found at {}", store_file.display()),
        );
    }
    validator.validate()
}

fn check_build_type(
    validator: Validator,
    project: &ProjectConfig,
    name: &str,
    build_type: &BuildTypeConfig,
) -> Validator {
    let validator = check_suffix(
        validator,
        &format!("build_types.{}.application_id_suffix", name),
        &project.app.application_id,
        build_type.application_id_suffix.as_deref(),
    )
    .warn_if(
        &format!("build_types.{}.shrink_resources", name),
        build_type.shrink_resources && !build_type.minify_enabled,
        "Resource shrinking has no effect without minify_enabled",
    );

    let Some(reference) = build_type.signing_config.as_deref() else {
        return validator;
    };
    let field = format!("build_types.{}.signing_config", name);
    match project.signing_identity(reference) {
        None => validator.custom(&field, || {
            Some(format!("Unknown signing identity '{}'", reference))
        }),
        Some(identity)
            if name == "release"
                && identity.is_debug()
                && !project.signing_policy.allow_debug_signing_for_release =>
        {
            validator.custom(&field, || {
                Some(
                    "Release builds cannot use the debug keystore unless \
                     signing_policy.allow_debug_signing_for_release is set"
                        .to_string(),
                )
            })
        }
        Some(_) => validator,
    }
}

/// A suffix must start with `.` and keep the application id a package name
fn check_suffix(validator: Validator, field: &str, application_id: &str, suffix: Option<&str>) -> Validator {
    match suffix {
        None => validator,
        Some(s) if !s.starts_with('.') || s.len() < 2 => validator.custom(field, || {
            Some(format!("Application id suffix '{}' must start with '.'", s))
        }),
        Some(s) => validator.package_name(field, &format!("{}{}", application_id, s)),
    }
}

fn check_toolchain(validator: Validator, project: &ProjectConfig) -> Validator {
    let compile = &project.compile;
    let desugaring_declared = project.declares(DependencyConfiguration::CoreLibraryDesugaring);
    let kapt_declared = project.declares(DependencyConfiguration::Kapt);

    validator
        .one_of(
            "compile.java_source_compatibility",
            &compile.java_source_compatibility,
            &JAVA_VERSIONS,
        )
        .one_of(
            "compile.java_target_compatibility",
            &compile.java_target_compatibility,
            &JAVA_VERSIONS,
        )
        .one_of("compile.kotlin_jvm_target", &compile.kotlin_jvm_target, &JAVA_VERSIONS)
        .custom("compile.kotlin_jvm_target", || {
            (compile.kotlin_jvm_target != compile.java_target_compatibility).then(|| {
                format!(
                    "Kotlin jvm target {} must match the Java target {}",
                    compile.kotlin_jvm_target, compile.java_target_compatibility
                )
            })
        })
        .custom("compile.core_library_desugaring", || {
            (compile.core_library_desugaring && !desugaring_declared).then(|| {
                "Desugaring is enabled but no coreLibraryDesugaring dependency is declared"
                    .to_string()
            })
        })
        .warn_if(
            "dependencies",
            desugaring_declared && !compile.core_library_desugaring,
            "A coreLibraryDesugaring dependency is declared but desugaring is disabled",
        )
        .custom("plugins", || {
            (!project.has_plugin(ANDROID_APPLICATION_PLUGIN))
                .then(|| format!("The {} plugin must be applied", ANDROID_APPLICATION_PLUGIN))
        })
        .custom("plugins", || {
            (kapt_declared && !project.has_plugin(KAPT_PLUGIN))
                .then(|| format!("kapt dependencies need the {} plugin", KAPT_PLUGIN))
        })
}
