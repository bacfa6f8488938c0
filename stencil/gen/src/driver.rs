//! The emission driver.
//!
//! [`Engine::run`] processes every declaration of a compilation unit:
//! extraction, interceptor validation, the requested synthesizers, then
//! validation and formatting of each artifact. A failing type produces an
//! error diagnostic and no artifacts; the run always continues to the end.

use std::collections::HashSet;

use stencil_define::{ArtifactKind, Diagnostic, Severity, TypeInformation};
use tracing::{debug, info, instrument, warn};

use crate::codegen::{Context, InterceptorRegistry, synthesize_all};
use crate::config::EngineConfig;
use crate::diagnostics::DiagnosticSink;
use crate::errors::{GeneratorError, StructureError, SynthesisError};
use crate::extract::Extractor;
use crate::output::{FileSink, GeneratedFile, render};
use crate::registry::TagRegistry;
use crate::source::{CompilationUnit, TypeDeclaration};

/// One file handed to the file sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub type_name: String,
    pub kind: ArtifactKind,
    pub qualified_name: String,
    pub file_name: String,
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub emitted: Vec<EmittedFile>,
    /// Declared types that produced artifacts.
    pub succeeded: Vec<String>,
    /// Declared types skipped because of an error.
    pub failed: Vec<String>,
    pub errors: usize,
    pub warnings: usize,
}

impl RunReport {
    /// Returns true when no error diagnostic was reported.
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.emitted.iter().map(|f| f.file_name.as_str())
    }
}

/// Why one type produced nothing.
enum TypeFailure {
    Synthesis(SynthesisError),
    Generator(GeneratorError),
}

/// Owns the configuration and both registries for a run.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    registry: TagRegistry,
    interceptors: InterceptorRegistry,
}

impl Engine {
    /// Creates an engine with the standard tag and interceptor registries.
    pub fn new(config: EngineConfig) -> Result<Self, GeneratorError> {
        Self::with_registries(config, TagRegistry::standard(), InterceptorRegistry::standard())
    }

    pub fn with_registries(
        config: EngineConfig,
        registry: TagRegistry,
        interceptors: InterceptorRegistry,
    ) -> Result<Self, GeneratorError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            interceptors,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.interceptors
    }

    /// Generates every artifact of `unit`.
    ///
    /// Structural and usage errors go to `diagnostics`; only a failing file
    /// sink aborts the run.
    #[instrument(skip_all, fields(declarations = unit.declarations().len()))]
    pub fn run(
        &self,
        unit: &CompilationUnit,
        diagnostics: &mut dyn DiagnosticSink,
        files: &mut dyn FileSink,
    ) -> Result<RunReport, GeneratorError> {
        let mut report = RunReport::default();
        for note in unit.notes() {
            Self::report(&mut report, diagnostics, note.clone());
        }

        let mut seen = HashSet::new();
        for declaration in unit.declarations() {
            let name = declaration.name();
            if !seen.insert(name.clone()) {
                let error = SynthesisError::structure(
                    StructureError::DuplicateDeclaration {
                        type_name: name.clone(),
                    },
                    declaration.location(),
                );
                Self::report(&mut report, diagnostics, error.to_diagnostic());
                report.failed.push(name);
                continue;
            }

            match self.generate(declaration) {
                Ok(generated) => {
                    for file in &generated {
                        files.accept(file)?;
                        report.emitted.push(EmittedFile {
                            type_name: file.type_name.clone(),
                            kind: file.kind,
                            qualified_name: file.qualified_name.clone(),
                            file_name: file.file_name.clone(),
                        });
                    }
                    debug!(%name, artifacts = generated.len(), "generated");
                    report.succeeded.push(name);
                }
                Err(failure) => {
                    let diagnostic = match failure {
                        TypeFailure::Synthesis(error) => error.to_diagnostic(),
                        TypeFailure::Generator(error) => Diagnostic::error(
                            format!("generation error: {}", error),
                            declaration.location(),
                        ),
                    };
                    warn!(%name, "skipping type: {}", diagnostic.message);
                    Self::report(&mut report, diagnostics, diagnostic);
                    report.failed.push(name);
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            files = report.emitted.len(),
            "run finished"
        );
        Ok(report)
    }

    /// Extracts the Type Information of every declaration without generating
    /// code. Failures are reported and left out.
    pub fn models(
        &self,
        unit: &CompilationUnit,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Vec<TypeInformation> {
        let extractor = Extractor::new(&self.registry, &self.config);
        let mut models = Vec::new();
        for declaration in unit.declarations() {
            match extractor.extract(declaration) {
                Ok(info) => models.push(info),
                Err(error) => diagnostics.report(error.to_diagnostic()),
            }
        }
        models
    }

    fn generate(&self, declaration: &TypeDeclaration) -> Result<Vec<GeneratedFile>, TypeFailure> {
        let info = Extractor::new(&self.registry, &self.config)
            .extract(declaration)
            .map_err(TypeFailure::Synthesis)?;
        self.interceptors
            .validate(&info)
            .map_err(TypeFailure::Synthesis)?;

        let ctx = Context::new(&info, &self.config, &self.registry, &self.interceptors)
            .map_err(TypeFailure::Generator)?;
        let artifacts = synthesize_all(&ctx).map_err(TypeFailure::Generator)?;

        // Render everything before emitting anything, so a type never ends up
        // half-written.
        artifacts
            .iter()
            .map(|artifact| render(artifact, self.config.header))
            .collect::<Result<Vec<_>, _>>()
            .map_err(TypeFailure::Generator)
    }

    fn report(report: &mut RunReport, sink: &mut dyn DiagnosticSink, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => report.errors += 1,
            Severity::Warning => report.warnings += 1,
            Severity::Note => {}
        }
        sink.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::output::MemorySink;
    use crate::test_utils::{DICE, PAIR};

    fn run(source: &str) -> (RunReport, CollectingSink, MemorySink) {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let unit = CompilationUnit::from_source(source, Some("decls/test.rs")).unwrap();
        let mut diagnostics = CollectingSink::new();
        let mut files = MemorySink::new();
        let report = engine.run(&unit, &mut diagnostics, &mut files).unwrap();
        (report, diagnostics, files)
    }

    #[test]
    fn a_valid_type_produces_three_files() {
        let (report, diagnostics, files) = run(PAIR);
        assert!(report.is_success());
        assert!(diagnostics.diagnostics().is_empty());
        assert_eq!(
            files.names(),
            vec!["PairBuilder", "PairConverter", "PairSubclass"]
        );
        let names: Vec<_> = report.file_names().collect();
        assert_eq!(names, vec!["pair_subclass.rs", "pair_builder.rs", "pair_converter.rs"]);
    }

    #[test]
    fn a_broken_type_does_not_block_the_others() {
        let source = format!(
            "{}\n#[synth] pub struct Broken {{ a: u8 }}\n{}",
            PAIR, DICE
        );
        let (report, diagnostics, files) = run(&source);
        assert_eq!(report.succeeded, vec!["Pair".to_string(), "Dice".to_string()]);
        assert_eq!(report.failed, vec!["Broken".to_string()]);
        assert_eq!(report.errors, 1);
        assert!(diagnostics.diagnostics()[0].message.contains("Broken"));
        assert!(files.get("DiceSubclass").is_some());
        assert!(files.get("BrokenSubclass").is_none());
    }

    #[test]
    fn interceptor_misuse_is_reported_as_a_usage_error() {
        let (report, diagnostics, files) = run(
            r#"
            #[synth] pub struct Bad { a: u64 }
            impl Bad {
                #[reconstruct] pub fn new(a: u64) -> Self;
                #[cached] pub fn peek(&self) {}
            }
            "#,
        );
        assert_eq!(report.errors, 1);
        assert!(files.is_empty());
        assert!(diagnostics.diagnostics()[0].message.starts_with("usage error"));
    }

    #[test]
    fn duplicate_declarations_keep_the_first() {
        let source = format!("{}\n#[synth] pub struct Pair {{ a: u8 }}", PAIR);
        let (report, diagnostics, _) = run(&source);
        assert_eq!(report.succeeded, vec!["Pair".to_string()]);
        assert_eq!(report.failed, vec!["Pair".to_string()]);
        assert!(diagnostics.diagnostics()[0].message.contains("more than once"));
    }

    #[test]
    fn unit_notes_are_forwarded() {
        let source = format!(
            "{}\nimpl Clone for Pair {{ fn clone(&self) -> Self {{ todo!() }} }}",
            PAIR
        );
        let (report, diagnostics, _) = run(&source);
        assert!(report.is_success());
        assert_eq!(report.warnings, 1);
        assert_eq!(diagnostics.diagnostics()[0].severity, Severity::Warning);
    }

    #[test]
    fn models_skip_failing_declarations() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let source = format!("{}\n#[synth] pub struct Broken {{ a: u8 }}", PAIR);
        let unit = CompilationUnit::from_source(&source, None).unwrap();
        let mut diagnostics = CollectingSink::new();
        let models = engine.models(&unit, &mut diagnostics);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "Pair");
        assert_eq!(diagnostics.error_count(), 1);
    }
}
