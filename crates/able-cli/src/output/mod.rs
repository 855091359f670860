//! Terminal output formatting and utilities.
//!
//! Keeps command output consistent: results go to stdout, warnings to
//! stderr. Errors are printed by `main` through `ErrorFormatter`.

pub mod colors;
pub mod errors;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
    quiet: bool,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
            quiet: false,
        }
    }

    /// Handler that prints nothing, for tests
    pub fn quiet() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
            quiet: true,
        }
    }

    pub fn colors(&self) -> &colors::ColorSupport {
        &self.colors
    }

    /// Print a result line
    pub fn print(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.colors.green("✓"), message);
        }
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", self.colors.yellow("⚠"), message);
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
