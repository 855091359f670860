//! Error types and result aliases for Able loader operations.
//!
//! Provides a unified error type that covers every way a load can fail,
//! with actionable error messages. Every variant aborts the load.

use camino::Utf8PathBuf;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Source span of a parser diagnostic (1-based lines and columns)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticLocation {
    pub path: Utf8PathBuf,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

/// Parser failure attributed to a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserDiagnostic {
    pub message: String,
    pub location: DiagnosticLocation,
}

impl fmt::Display for DiagnosticLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

impl fmt::Display for ParserDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Unified error type for all Able loader operations
#[derive(Error, Debug)]
pub enum AbleError {
    // Parser errors
    #[error("Parse error: {diagnostic}")]
    Parse { diagnostic: ParserDiagnostic },

    // Root discovery errors
    #[error("Failed to discover package root from {path}: {reason}")]
    RootDiscovery { path: Utf8PathBuf, reason: String },

    #[error("Entry file {entry} is outside package root {root}")]
    EntryOutsideRoot { entry: Utf8PathBuf, root: Utf8PathBuf },

    #[error("Entry file {path} does not exist")]
    EntryNotFound { path: Utf8PathBuf },

    #[error("Entry path {path} is a directory")]
    EntryIsDirectory { path: Utf8PathBuf },

    #[error("Entry file {path} does not belong to any indexed package")]
    EntryNotIndexed { path: Utf8PathBuf },

    #[error("Search path '{path}' is invalid: {reason}")]
    InvalidSearchPath { path: String, reason: String },

    #[error("Package namespace 'able.*' is reserved for the standard library (path: {path})")]
    ReservedNamespace { path: Utf8PathBuf },

    // Indexing errors
    #[error("Package declaration must be unqualified in {path}")]
    QualifiedPackageDeclaration { path: Utf8PathBuf },

    #[error("Path {path} is not valid UTF-8")]
    NonUtf8Path { path: String },

    #[error("Package {name} found in multiple roots ({first_root}, {second_root})")]
    PackageConflict {
        name: String,
        first_root: Utf8PathBuf,
        second_root: Utf8PathBuf,
    },

    // Resolution errors
    #[error("Package {name} not found")]
    PackageNotFound { name: String },

    #[error("File {path} resolves to package {found}, expected {expected}")]
    PackageMismatch {
        path: Utf8PathBuf,
        found: String,
        expected: String,
    },

    #[error("Import cycle detected at package {package} ({})", .chain.join(" -> "))]
    ImportCycle { package: String, chain: Vec<String> },

    #[error("Package {package} imports unknown package {import}")]
    UnknownImport { package: String, import: String },

    // Lockfile errors
    #[error("Lockfile error in {path}: {message}")]
    Lockfile { path: Utf8PathBuf, message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal loader error: {message}")]
    Internal { message: String },
}

/// Result type alias for Able loader operations
pub type AbleResult<T> = Result<T, AbleError>;

impl AbleError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create an internal error for broken loader invariants
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Source location of the failure, when the error carries one
    pub fn location(&self) -> Option<&DiagnosticLocation> {
        match self {
            AbleError::Parse { diagnostic } => Some(&diagnostic.location),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AbleError::RootDiscovery { .. } => {
                Some("Add a 'name:' entry to package.yml or remove the manifest")
            },
            AbleError::PackageNotFound { .. } | AbleError::UnknownImport { .. } => {
                Some("Check the package name or add its root with --search-path")
            },
            AbleError::PackageConflict { .. } => {
                Some("Rename one of the packages or drop one root from the search path")
            },
            AbleError::ImportCycle { .. } => {
                Some("Break the cycle by moving shared code into a separate package")
            },
            AbleError::QualifiedPackageDeclaration { .. } => {
                Some("Declare a single segment; directories supply the rest of the name")
            },
            AbleError::PackageMismatch { .. } => {
                Some("Make the package declaration match the file's directory")
            },
            AbleError::EntryNotIndexed { .. } => {
                Some("Entry files must use the .able extension outside quarantine directories")
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic() -> ParserDiagnostic {
        ParserDiagnostic {
            message: "unexpected token".to_string(),
            location: DiagnosticLocation {
                path: Utf8PathBuf::from("/src/main.able"),
                line: 3,
                column: 7,
                end_line: 3,
                end_column: 9,
            },
        }
    }

    #[test]
    fn test_parse_error_display() {
        let err = AbleError::Parse {
            diagnostic: diagnostic(),
        };
        assert_eq!(
            err.to_string(),
            "Parse error: /src/main.able:3:7: unexpected token"
        );
        assert_eq!(err.location().map(|loc| loc.line), Some(3));
    }

    #[test]
    fn test_cycle_display() {
        let err = AbleError::ImportCycle {
            package: "a".to_string(),
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Import cycle detected at package a (a -> b -> a)"
        );
        assert!(err.suggestion().is_some());
        assert!(err.location().is_none());
    }

    #[test]
    fn test_conflict_names_both_roots() {
        let err = AbleError::PackageConflict {
            name: "x".to_string(),
            first_root: Utf8PathBuf::from("/one"),
            second_root: Utf8PathBuf::from("/two"),
        };
        let message = err.to_string();
        assert!(message.contains("/one"));
        assert!(message.contains("/two"));
    }

    #[test]
    fn test_internal_has_no_suggestion() {
        assert!(AbleError::internal("boom").suggestion().is_none());
    }
}
