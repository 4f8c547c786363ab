//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::OwoColorize;
use serde::Serialize;
use smartone_core::error::Error;
use smartone_core::validation::ValidationError;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an aligned `key: value` line
    pub fn field(key: &str, value: impl std::fmt::Display) {
        println!("  {:<24} {}", format!("{}:", key).dimmed(), value);
    }
}

/// Print a core error with its code, context and suggestion
pub fn print_error(err: &Error) {
    Status::error(&format!("[{}] {}", err.code, err.message));
    if let Some(context) = &err.context {
        eprintln!("  {} {}", "context:".dimmed(), context);
    }
    if let Some(suggestion) = &err.suggestion {
        eprintln!("  {} {}", "hint:".cyan(), suggestion);
    }
}

/// Print validation findings, errors first
pub fn print_findings(errors: &[ValidationError], warnings: &[ValidationError]) {
    for error in errors {
        Status::error(&error.to_string());
    }
    for warning in warnings {
        Status::warning(&warning.to_string());
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a flag as `yes` / `no`
pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
