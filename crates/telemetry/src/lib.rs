//! Structured logging for SmartOne build tools
//!
//! Installs a `tracing` subscriber writing to stderr, so stdout stays free
//! for command output such as resolved configurations in JSON. `RUST_LOG`
//! overrides the configured level.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Install the global subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer.compact()).try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Logging initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Map a `-v` count and `--quiet` flag onto a level filter
pub fn level_for_verbosity(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub log_level: String,
    /// Include the event target (module path)
    pub show_target: bool,
    pub show_file: bool,
    pub show_line_number: bool,
    /// Emit JSON lines instead of compact text
    pub json: bool,
}

impl TelemetryConfig {
    /// Configuration for a CLI invocation
    pub fn for_cli(verbose: u8, quiet: bool) -> Self {
        Self {
            log_level: level_for_verbosity(verbose, quiet).to_string(),
            show_target: verbose >= 2,
            ..Self::default()
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            show_target: false,
            show_file: false,
            show_line_number: false,
            json: false,
        }
    }
}
