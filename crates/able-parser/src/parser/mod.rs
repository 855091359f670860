//! Parser seam used by the package loader
//!
//! The loader only depends on [`SourceParser`]; [`LineParser`] is the
//! built-in implementation.

mod import;
mod line;

pub use line::LineParser;

use crate::ast::{FileId, SourceModule};
use thiserror::Error;

/// Marker that starts a line comment
pub const COMMENT_MARKER: &str = "##";

/// Parser failure with a 1-based source span
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl ParseError {
    /// Error covering `len` characters on one line
    pub fn at(message: impl Into<String>, line: usize, column: usize, len: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            end_line: line,
            end_column: column + len.max(1),
        }
    }
}

/// Turns source text into a syntax tree.
///
/// Implementations must be usable from several threads at once: files of
/// one package are parsed in parallel.
pub trait SourceParser: Send + Sync {
    /// Parse one file; node ids are allocated under `file`
    fn parse(&self, file: FileId, source: &str) -> Result<SourceModule, ParseError>;
}

/// Strip a trailing `##` comment, ignoring markers inside string literals
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b'#' && bytes.get(i + 1) == Some(&b'#') {
            return &line[..i];
        }
        i += 1;
    }
    line
}

/// Strip `keyword` from the front of `text` when it stands alone as a word
pub(crate) fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == ';' => Some(rest),
        Some(_) => None,
    }
}

/// Check identifier syntax: a letter or `_`, then letters, digits or `_`
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
