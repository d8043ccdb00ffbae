//! Diagnostic types for error/warning reporting.
//!
//! Every stage of a language pipeline (lexing, parsing, resolution, type
//! checking) reports problems as [`Diagnostic`] values instead of failing.
//! The `code` is a short stable identifier (for example `NPP001`) that
//! downstream tooling matches on for suppressions and quick fixes.

use std::fmt;

use crate::span::Position;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Error: the construct is invalid.
    Error,
    /// Warning: processing continues but something looks suspicious.
    Warning,
    /// Informational: not a problem, but worth noting.
    Info,
}

/// Additional position attached to a diagnostic, usually in another file.
///
/// Used for "declared here" style hints, e.g. the parameter declaration in a
/// called subprogram when the call passes the wrong number of operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInformation {
    /// Where the related information points to.
    pub position: Position,
    /// Short explanation of why the position matters.
    pub message: String,
}

/// A diagnostic message from the lexer, parser or checker.
///
/// # Example
///
/// ```
/// use open_mainframe_lang_core::{Diagnostic, Position, Severity, Span};
///
/// let pos = Position::new(Span::main(100, 107), 4, 2);
/// let d = Diagnostic::error("NPR001", "Unresolved reference: #NAME", pos)
///     .with_suggestion("Declare #NAME in DEFINE DATA");
///
/// assert_eq!(d.severity, Severity::Error);
/// assert_eq!(d.code, "NPR001");
/// assert_eq!(d.offset(), 100);
/// assert_eq!(d.length(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Stable diagnostic code (e.g., "NPL001", "NPP003", "NPT002").
    pub code: String,
    /// Human-readable message describing the issue.
    pub message: String,
    /// Source position the diagnostic refers to.
    pub position: Position,
    /// Optional remediation text.
    pub suggestion: Option<String>,
    /// Positions in other places that explain the diagnostic.
    pub related: Vec<RelatedInformation>,
}

impl Diagnostic {
    /// Create a diagnostic with an explicit severity.
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            position,
            suggestion: None,
            related: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>, position: Position) -> Self {
        Self::new(Severity::Error, code, message, position)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>, position: Position) -> Self {
        Self::new(Severity::Warning, code, message, position)
    }

    /// Create a new info diagnostic.
    pub fn info(code: impl Into<String>, message: impl Into<String>, position: Position) -> Self {
        Self::new(Severity::Info, code, message, position)
    }

    /// Add a suggestion to this diagnostic.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a related position.
    pub fn with_related(mut self, position: Position, message: impl Into<String>) -> Self {
        self.related.push(RelatedInformation {
            position,
            message: message.into(),
        });
        self
    }

    /// Byte offset of the diagnostic.
    pub fn offset(&self) -> u32 {
        self.position.offset()
    }

    /// Length of the diagnostic in bytes.
    pub fn length(&self) -> u32 {
        self.position.length()
    }

    /// Line of the diagnostic (0-indexed).
    pub fn line(&self) -> u32 {
        self.position.line
    }

    /// Returns `true` if this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns `true` if this diagnostic is a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}:{}: {}",
            self.severity,
            self.code,
            self.position.line + 1,
            self.position.column + 1,
            self.message
        )?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{FileId, Span};

    fn pos(start: u32, end: u32) -> Position {
        Position::new(Span::main(start, end), 0, start)
    }

    #[test]
    fn test_diagnostic_error() {
        let d = Diagnostic::error("NPP003", "Unexpected token", pos(0, 10));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.code, "NPP003");
        assert!(d.is_error());
        assert!(!d.is_warning());
        assert!(d.suggestion.is_none());
        assert!(d.related.is_empty());
    }

    #[test]
    fn test_diagnostic_warning() {
        let d = Diagnostic::warning("NPT002", "Value is truncated", pos(5, 15));
        assert!(d.is_warning());
        assert_eq!(d.offset(), 5);
        assert_eq!(d.length(), 10);
    }

    #[test]
    fn test_diagnostic_related_information() {
        let callee = Position::new(Span::new(FileId(3), 40, 44), 2, 2);
        let d = Diagnostic::error("NPP019", "Expected 2 parameters", pos(0, 7))
            .with_related(callee, "Parameter declared here");
        assert_eq!(d.related.len(), 1);
        assert_eq!(d.related[0].position.file(), FileId(3));
    }

    #[test]
    fn test_diagnostic_display_with_suggestion() {
        let d = Diagnostic::error("NPR002", "Ambiguous reference #A", pos(0, 2))
            .with_suggestion("#G1.#A, #G2.#A");
        assert_eq!(
            format!("{}", d),
            "error[NPR002] 1:1: Ambiguous reference #A (#G1.#A, #G2.#A)"
        );
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Info), "info");
    }
}
