//! Whole-unit generation through the public API.

use stencil_define::{ArtifactKind, Severity};
use stencil_gen::config::EngineConfig;
use stencil_gen::diagnostics::CollectingSink;
use stencil_gen::driver::Engine;
use stencil_gen::output::MemorySink;
use stencil_gen::source::CompilationUnit;

const CATALOG: &str = r#"
#[synth]
#[derive(Debug, Clone)]
pub struct Pair {
    first: String,
    #[default(String::from("x"))]
    second: String,
}

impl Pair {
    #[reconstruct]
    pub fn new(first: String, second: String) -> Self;
}

/// Missing its entry point.
#[synth]
pub struct Orphan {
    a: u8,
}

#[synth(builder)]
pub struct Limits {
    #[size(min = 1, max = 4)]
    name: String,
    #[strictly_ascending]
    steps: Vec<u32>,
}

impl Limits {
    #[factory]
    pub fn of(name: String, steps: Vec<u32>) -> Self;
}

#[synth]
pub struct Misused {
    #[ascending]
    count: u32,
}

impl Misused {
    #[reconstruct]
    pub fn new(count: u32) -> Self;
}
"#;

fn run(config: EngineConfig) -> (stencil_gen::RunReport, CollectingSink, MemorySink) {
    let unit = CompilationUnit::from_source(CATALOG, Some("decls/catalog.rs")).unwrap();
    let engine = Engine::new(config).unwrap();
    let mut diagnostics = CollectingSink::new();
    let mut files = MemorySink::new();
    let report = engine.run(&unit, &mut diagnostics, &mut files).unwrap();
    (report, diagnostics, files)
}

#[test]
fn every_valid_type_is_generated_and_every_invalid_one_reported() {
    let (report, diagnostics, files) = run(EngineConfig::default());

    assert_eq!(report.succeeded, vec!["Pair".to_string(), "Limits".to_string()]);
    assert_eq!(report.failed, vec!["Orphan".to_string(), "Misused".to_string()]);
    assert_eq!(report.errors, 2);

    let messages: Vec<_> = diagnostics.errors().map(|d| d.message.as_str()).collect();
    assert!(messages[0].starts_with("structure error"));
    assert!(messages[0].contains("Orphan"));
    assert!(messages[1].starts_with("usage error"));
    assert!(messages[1].contains("ascending"));

    assert!(files.get("PairConverter").is_some());
    assert!(files.get("LimitsBuilder").is_some());
    assert!(files.get("LimitsConverter").is_none());
}

#[test]
fn diagnostics_point_into_the_declaration_file() {
    let (_, diagnostics, _) = run(EngineConfig::default());
    let orphan = &diagnostics.diagnostics()[0];
    assert_eq!(orphan.severity, Severity::Error);
    assert_eq!(orphan.location.file.as_deref(), Some("decls/catalog.rs"));
    assert!(orphan.location.line > 0);
}

#[test]
fn module_path_qualifies_file_names_but_not_paths() {
    let (report, _, files) = run(EngineConfig::default().with_module_path("crate::model"));
    let pair = files.get("crate::model::PairSubclass").unwrap();
    assert_eq!(pair.file_name, "pair_subclass.rs");
    assert_eq!(pair.kind, ArtifactKind::Implementation);
    assert!(report.emitted.iter().all(|f| f.qualified_name.starts_with("crate::model::")));
}

#[test]
fn generated_files_are_formatted_and_carry_the_notice() {
    let (_, _, files) = run(EngineConfig::default());
    let limits = files.get("LimitsBuilder").unwrap();
    assert!(limits.content.starts_with("// This code was automatically generated"));
    assert!(limits.content.contains("\n    pub fn name("));

    let (_, _, files) = run(EngineConfig::default().with_header(false));
    assert!(files.get("LimitsBuilder").unwrap().content.starts_with("///"));
}

#[test]
fn custom_runtime_path_reaches_generated_code() {
    let (_, _, files) = run(EngineConfig::default().with_runtime_path("crate::rt"));
    let pair = files.get("PairSubclass").unwrap();
    assert!(pair.content.contains("crate::rt::Construction::begin"));
    assert!(!pair.content.contains("stencil_runtime"));
}

#[test]
fn fractional_bounds_on_integer_fields_fail_the_type() {
    let source = r#"
        #[synth]
        pub struct Span {
            #[less_than(0.5)]
            low: i32,
            #[multiple_of(0.5)]
            high: i32,
        }

        impl Span {
            #[reconstruct]
            pub fn new(low: i32, high: i32) -> Self;
        }
    "#;
    let unit = CompilationUnit::from_source(source, None).unwrap();
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let mut diagnostics = CollectingSink::new();
    let mut files = MemorySink::new();
    let report = engine.run(&unit, &mut diagnostics, &mut files).unwrap();

    assert_eq!(report.failed, vec!["Span".to_string()]);
    assert!(files.is_empty());
    let message = &diagnostics.errors().next().unwrap().message;
    assert!(message.contains("less_than"), "{}", message);
    assert!(message.contains("integer bound"), "{}", message);
}

#[test]
fn single_contract_validators_have_no_redundant_parentheses() {
    let (_, _, files) = run(EngineConfig::default());
    let limits = &files.get("LimitsSubclass").unwrap().content;
    assert!(limits.contains("fn validate_steps("));
    assert!(limits.contains("if __value"), "{}", limits);
    assert!(!limits.contains("if (__value"), "{}", limits);
}
