//! Error message formatting with actionable suggestions.
//!
//! Parser diagnostics point at their source span; every error gets its
//! `help:` suggestion and cause chain when it has one.

use able_core::error::{AbleError, DiagnosticLocation};
use super::colors::ColorSupport;
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format a loader error with location, suggestion and causes
    pub fn format_error(&self, error: &AbleError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        match error {
            AbleError::Parse { diagnostic } => output.push_str(&diagnostic.message),
            other => output.push_str(&other.to_string()),
        }
        output.push('\n');

        if let Some(location) = error.location() {
            output.push_str("  ");
            output.push_str(&self.format_location(location));
            output.push('\n');
        }

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            source = err.source();
        }

        output
    }

    /// Format any error reaching the CLI boundary
    pub fn format_any(&self, error: &anyhow::Error) -> String {
        match error.downcast_ref::<AbleError>() {
            Some(able) => self.format_error(able),
            None => self.format_simple(&format!("{:#}", error)),
        }
    }

    /// Format a simple error message
    pub fn format_simple(&self, message: &str) -> String {
        format!("{}: {}", self.colors.red("error"), message)
    }

    /// Format a source span as `--> path:line:column`
    pub fn format_location(&self, location: &DiagnosticLocation) -> String {
        format!(
            "{} {}:{}:{}",
            self.colors.dim("-->"),
            location.path,
            location.line,
            location.column
        )
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
