//! Decode-time diagnostics with source positions.

use std::sync::LazyLock;

use regex::Regex;

/// A 1-based line/column pair in the decoded source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number within the line, starting at 1.
    pub column: u32,
}

impl Position {
    /// Convert a tokenizer location (0-based line, 1-based column) to a
    /// 1-based position.
    pub(crate) fn from_location(location: cssparser::SourceLocation) -> Self {
        Self {
            line: location.line + 1,
            column: location.column,
        }
    }
}

/// Some tokenizer messages repeat the position as a trailing
/// `" at line N..."`; the position is carried structurally, so the
/// repetition is stripped.
static POSITION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" at line \d.*$").expect("position suffix pattern is valid")
});

/// A non-fatal parse problem found while decoding Mozilla-format text.
///
/// Diagnostics never abort a decode; they are collected and returned
/// alongside whatever sections could be recovered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column} {message}")]
pub struct Diagnostic {
    /// Line number where the problem was found (1-based).
    pub line: u32,
    /// Column number where the problem was found (1-based).
    pub column: u32,
    /// Human-readable description, position suffix stripped.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic at the given position, normalizing the message.
    pub fn new(position: Position, message: impl AsRef<str>) -> Self {
        let message = POSITION_SUFFIX
            .replace(message.as_ref(), "")
            .into_owned();
        Self {
            line: position.line,
            column: position.column,
            message,
        }
    }
}
