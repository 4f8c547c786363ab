//! Structured errors with codes, context and recovery suggestions
//!
//! Every failure in the build tools is an [`Error`] carrying:
//! - An [`ErrorCode`] for programmatic handling and exit codes
//! - A human-readable message
//! - Optional context and a recovery suggestion
//! - A serializable [`ErrorReport`] form for `--json` output

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    /// Unclassified failure
    Unknown = 1000,
    /// Bug in the tooling itself
    Internal = 1001,

    // IO errors (2xxx)
    /// Other filesystem failure
    IoError = 2000,
    /// A required file does not exist
    FileNotFound = 2001,
    /// A file exists but cannot be read
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    /// Configuration is well-formed but unusable
    ConfigError = 3000,
    /// An explicit configuration path does not exist
    ConfigNotFound = 3001,
    /// Configuration is not valid TOML or has unknown keys
    ConfigParseError = 3002,
    /// Configuration breaks a validation rule
    ConfigValidationError = 3003,

    // Variant resolution errors (4xxx)
    /// Other variant resolution failure
    VariantError = 4000,
    /// Flavor or build type outside its closed set
    InvalidVariant = 4001,
    /// Release variant with no signing identity
    MissingSigningIdentity = 4002,
    /// Reference to an undeclared signing identity
    UnknownSigningIdentity = 4003,
    /// Release variant naming the debug keystore without the policy opt-in
    DebugSigningForRelease = 4004,

    // Process errors (5xxx)
    /// A child process could not be run
    ProcessError = 5000,
    /// Program not found
    CommandNotFound = 5001,
    /// A child process exited unsuccessfully
    CommandFailed = 5002,

    // Validation errors (6xxx)
    /// Input failed validation
    ValidationError = 6000,

    // Platform-specific errors (8xxx)
    /// Android toolchain failure
    PlatformError = 8000,
    /// A Gradle task failed
    GradleError = 8002,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Variant",
            5 => "Process",
            6 => "Validation",
            8 => "Platform",
            _ => "Unknown",
        }
    }

    /// Map the code onto a process exit code
    pub fn exit_code(&self) -> i32 {
        match self.code() / 1000 {
            3 => exit_codes::CONFIG_ERROR,
            4 => exit_codes::VARIANT_ERROR,
            6 => exit_codes::VALIDATION_ERROR,
            _ if *self == ErrorCode::CommandNotFound => exit_codes::COMMAND_NOT_FOUND,
            _ => exit_codes::FAILURE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    /// Configuration that parsed but cannot be used
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// An explicit configuration path that does not exist
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a smartone-build.toml file or use --config to specify a path")
    }

    /// A flavor or build type selector outside its closed set
    pub fn invalid_variant(dimension: &str, value: &str, allowed: &[&str]) -> Self {
        Self::new(
            ErrorCode::InvalidVariant,
            format!("Invalid {}: '{}'", dimension, value),
        )
        .with_suggestion(format!("Use one of: {}", allowed.join(", ")))
    }

    /// A release variant resolved without an explicit signing identity
    pub fn missing_signing_identity(variant: &str) -> Self {
        Self::new(
            ErrorCode::MissingSigningIdentity,
            format!("No signing identity configured for {}", variant),
        )
        .with_suggestion(
            "Declare a [signing.<name>] identity and reference it from build_types.release.signing_config",
        )
    }

    /// A signing reference to an undeclared identity
    pub fn unknown_signing_identity(variant: &str, name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownSigningIdentity,
            format!("{} references undeclared signing identity '{}'", variant, name),
        )
        .with_suggestion(format!("Add a [signing.{}] section to the configuration", name))
    }

    /// A release variant naming the debug keystore without the policy opt-in
    pub fn debug_signing_for_release(variant: &str) -> Self {
        Self::new(
            ErrorCode::DebugSigningForRelease,
            format!("{} is configured to sign with the debug keystore", variant),
        )
        .with_suggestion(
            "Use a release keystore, or set signing_policy.allow_debug_signing_for_release for internal tracks",
        )
    }

    /// A child process that could not be run
    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessError, message)
    }

    /// A program missing from `PATH` or the project
    pub fn command_not_found(cmd: &str) -> Self {
        Self::new(
            ErrorCode::CommandNotFound,
            format!("Command not found: {}", cmd),
        )
        .with_suggestion(format!("Install {} and ensure it's in your PATH", cmd))
    }

    /// A failed Gradle task
    pub fn gradle(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GradleError, message)
    }
}

/// Serializable error report for logging and JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Code as displayed, e.g. `E4002`
    pub code_str: String,
    /// Category name, e.g. `Variant`
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// Additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Recovery suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Underlying error, rendered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// Any failure without a dedicated code
    pub const FAILURE: i32 = 1;
    /// `check` found errors
    pub const VALIDATION_ERROR: i32 = 2;
    /// Configuration missing, malformed or unusable
    pub const CONFIG_ERROR: i32 = 3;
    /// Variant could not be resolved
    pub const VARIANT_ERROR: i32 = 6;
    /// Gradle wrapper or another program missing
    pub const COMMAND_NOT_FOUND: i32 = 127;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error
    fn context(self, context: impl Into<String>) -> Result<T>;
    /// Attach a recovery suggestion to the error
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}
