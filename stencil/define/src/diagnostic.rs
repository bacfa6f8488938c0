//! Diagnostics reported by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// A position in a declaration source file.
///
/// Lines are 1-based, columns 0-based, matching `proc-macro2` span locations.
/// A zero line means the position is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// Creates a location.
    pub fn new(file: Option<&str>, line: usize, column: usize) -> Self {
        Self {
            file: file.map(str::to_string),
            line,
            column,
        }
    }

    /// Returns true when the location points at a real position.
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("<input>");
        if self.is_known() {
            write!(f, "{}:{}:{}", file, self.line, self.column + 1)
        } else {
            f.write_str(file)
        }
    }
}

/// One `{severity, message, sourceLocation}` report.
///
/// ## Examples
///
/// ```
/// use stencil_define::{Diagnostic, SourceLocation};
///
/// let diagnostic = Diagnostic::warning(
///     "`Default` is not carried to synthesized types",
///     SourceLocation::new(Some("decls/pair.rs"), 4, 0),
/// );
/// assert_eq!(
///     diagnostic.to_string(),
///     "warning: `Default` is not carried to synthesized types (decls/pair.rs:4:1)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity,
            message: message.into(),
            location,
        }
    }

    pub fn error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(Severity::Error, message, location)
    }

    pub fn warning(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(Severity::Warning, message, location)
    }

    pub fn note(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(Severity::Note, message, location)
    }

    /// Returns true for error diagnostics.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.severity, self.message, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_renders_file_only() {
        let location = SourceLocation::new(Some("a.rs"), 0, 0);
        assert_eq!(location.to_string(), "a.rs");
        assert_eq!(SourceLocation::default().to_string(), "<input>");
    }

    #[test]
    fn severities_order_by_importance() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Note);
    }

    #[test]
    fn only_errors_report_is_error() {
        let location = SourceLocation::default();
        assert!(Diagnostic::error("x", location.clone()).is_error());
        assert!(!Diagnostic::warning("x", location.clone()).is_error());
        assert!(!Diagnostic::note("x", location).is_error());
    }
}
