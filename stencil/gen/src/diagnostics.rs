//! Where diagnostics go.
//!
//! The engine reports every structural and usage error through a
//! [`DiagnosticSink`] instead of returning early, so a single bad declaration
//! never hides problems in the others.

use std::io::{self, Write};

use stencil_define::{Diagnostic, Severity};
use tracing::{error, info, warn};

/// Receives `{severity, message, location}` reports during a run.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Keeps every diagnostic in report order.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Emits diagnostics as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let location = diagnostic.location.to_string();
        match diagnostic.severity {
            Severity::Error => error!(%location, "{}", diagnostic.message),
            Severity::Warning => warn!(%location, "{}", diagnostic.message),
            Severity::Note => info!(%location, "{}", diagnostic.message),
        }
    }
}

/// Prints `cargo:warning=` lines for build scripts.
///
/// Cargo only surfaces warnings from build scripts, so errors are printed the
/// same way with an `error:` prefix; the build script fails afterwards.
#[derive(Debug)]
pub struct CargoSink<W: Write = io::Stdout> {
    out: W,
    errors: usize,
}

impl CargoSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> CargoSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, errors: 0 }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for CargoSink<W> {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.errors += 1;
        }
        // One line per warning; cargo ends the message at the newline.
        let line = diagnostic.to_string().replace('\n', " ");
        if let Err(e) = writeln!(self.out, "cargo:warning={}", line) {
            warn!(error = %e, "failed to print cargo warning");
        }
    }
}

/// Forwards to two sinks.
pub struct Tee<'a> {
    first: &'a mut dyn DiagnosticSink,
    second: &'a mut dyn DiagnosticSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a mut dyn DiagnosticSink, second: &'a mut dyn DiagnosticSink) -> Self {
        Self { first, second }
    }
}

impl DiagnosticSink for Tee<'_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.first.report(diagnostic.clone());
        self.second.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_define::SourceLocation;
    use tracing_test::traced_test;

    fn location() -> SourceLocation {
        SourceLocation::new(Some("decls/pair.rs"), 3, 4)
    }

    #[test]
    fn collecting_sink_counts_errors_only() {
        let mut sink = CollectingSink::new();
        sink.report(Diagnostic::warning("careful", location()));
        sink.report(Diagnostic::error("broken", location()));
        assert_eq!(sink.diagnostics().len(), 2);
        assert_eq!(sink.error_count(), 1);
        assert!(sink.has_errors());
    }

    #[test]
    fn cargo_sink_prints_one_warning_line_per_diagnostic() {
        let mut sink = CargoSink::new(Vec::new());
        sink.report(Diagnostic::error("no entry\npoint", location()));
        sink.report(Diagnostic::note("fine", location()));
        assert_eq!(sink.error_count(), 1);
        let printed = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = printed.lines().collect();
        assert_eq!(
            lines,
            vec![
                "cargo:warning=error: no entry point (decls/pair.rs:3:5)",
                "cargo:warning=note: fine (decls/pair.rs:3:5)",
            ]
        );
    }

    #[traced_test]
    #[test]
    fn tracing_sink_logs_at_the_matching_level() {
        let mut sink = TracingSink;
        sink.report(Diagnostic::error("missing entry point", location()));
        assert!(logs_contain("missing entry point"));
        assert!(logs_contain("ERROR"));
    }

    #[test]
    fn tee_reaches_both_sinks() {
        let mut a = CollectingSink::new();
        let mut b = CollectingSink::new();
        Tee::new(&mut a, &mut b).report(Diagnostic::warning("w", location()));
        assert_eq!(a.diagnostics().len(), 1);
        assert_eq!(b.diagnostics().len(), 1);
    }
}
