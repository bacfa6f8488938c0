//! Output validation, formatting and file writing.
//!
//! This module handles the final phase of synthesis: validating each
//! artifact's tokens, formatting them, and handing the result to a
//! [`FileSink`].
//!
//! ## Output Structure
//!
//! Every artifact becomes one file named after the snake_case form of the
//! generated item:
//! ```text
//! out/
//! ├── pair_subclass.rs
//! ├── pair_builder.rs
//! └── pair_converter.rs
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Validation**: All generated code is validated with `syn` before writing
//! - **Formatting**: Output is formatted with `prettyplease` for consistent style
//! - **Atomic writes**: Uses temp file + rename pattern to prevent partial writes

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use stencil_define::ArtifactKind;
use tracing::{debug, instrument};

use crate::codegen::Artifact;
use crate::errors::GeneratorError;

/// The notice prepended to generated files when `header` is enabled.
pub const GENERATED_NOTICE: &str =
    "// This code was automatically generated by stencil-gen. Do not edit manually.";

/// A validated, formatted artifact ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub kind: ArtifactKind,
    pub type_name: String,
    pub qualified_name: String,
    /// e.g. `pair_builder.rs`
    pub file_name: String,
    pub content: String,
}

/// Validates generated code by parsing it with syn.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone())
        .map_err(|e| GeneratorError::CodeGenError(format!("Generated code is invalid: {}", e)))
}

/// Formats generated code using prettyplease, optionally prepending the
/// generated notice as a regular comment.
pub fn format_code(file: &syn::File, header: bool) -> String {
    let formatted = prettyplease::unparse(file);
    if header {
        format!("{}\n\n{}", GENERATED_NOTICE, formatted)
    } else {
        formatted
    }
}

/// `PairBuilder` becomes `pair_builder`.
///
/// ## Examples
///
/// ```
/// use stencil_gen::output::snake_case;
///
/// assert_eq!(snake_case("PairBuilder"), "pair_builder");
/// assert_eq!(snake_case("HTTPRequestConverter"), "http_request_converter");
/// assert_eq!(snake_case("Vec3Subclass"), "vec3_subclass");
/// ```
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Validates and formats one artifact.
pub fn render(artifact: &Artifact, header: bool) -> Result<GeneratedFile, GeneratorError> {
    let file = validate_code(&artifact.tokens).map_err(|e| {
        GeneratorError::CodeGenError(format!("{} ({}): {}", artifact.name, artifact.kind, e))
    })?;
    Ok(GeneratedFile {
        kind: artifact.kind,
        type_name: artifact.type_name.clone(),
        qualified_name: artifact.qualified_name.clone(),
        file_name: format!("{}.rs", snake_case(&artifact.name)),
        content: format_code(&file, header),
    })
}

/// Writes content to a file atomically using temp file + rename.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if:
/// - Parent directories cannot be created
/// - The temp file cannot be written
/// - The rename operation fails
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::WriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::WriteError {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GeneratorError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Receives every generated file of a run.
pub trait FileSink {
    fn accept(&mut self, file: &GeneratedFile) -> Result<(), GeneratorError>;
}

/// Writes files into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FileSink for DirectorySink {
    #[instrument(skip_all, fields(file = %file.file_name))]
    fn accept(&mut self, file: &GeneratedFile) -> Result<(), GeneratorError> {
        let path = self.root.join(&file.file_name);
        write_atomic(&path, &file.content)?;
        debug!(path = %path.display(), bytes = file.content.len(), "wrote artifact");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps files in memory, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<String, GeneratedFile>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, qualified_name: &str) -> Option<&GeneratedFile> {
        self.files.get(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }
}

impl FileSink for MemorySink {
    fn accept(&mut self, file: &GeneratedFile) -> Result<(), GeneratorError> {
        self.files.insert(file.qualified_name.clone(), file.clone());
        Ok(())
    }
}

/// Prints files instead of writing them.
#[derive(Debug)]
pub struct DryRunSink<W: Write> {
    out: W,
}

impl<W: Write> DryRunSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FileSink for DryRunSink<W> {
    fn accept(&mut self, file: &GeneratedFile) -> Result<(), GeneratorError> {
        writeln!(self.out, "// ==> {} ({})\n{}", file.file_name, file.qualified_name, file.content)
            .map_err(|e| GeneratorError::WriteError {
                path: file.file_name.clone(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;
    use tempfile::TempDir;

    fn artifact(tokens: TokenStream) -> Artifact {
        Artifact {
            kind: ArtifactKind::Builder,
            type_name: "Pair".to_string(),
            name: "PairBuilder".to_string(),
            qualified_name: "model::PairBuilder".to_string(),
            tokens,
        }
    }

    #[test]
    fn validate_code_rejects_invalid_code() {
        let invalid_tokens = quote! {
            let x =
        };
        match validate_code(&invalid_tokens) {
            Err(GeneratorError::CodeGenError(_)) => {}
            other => panic!("Unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn format_code_prepends_notice_only_when_asked() {
        let file = validate_code(&quote!(pub struct A;)).unwrap();
        assert!(format_code(&file, true).starts_with(GENERATED_NOTICE));
        assert_eq!(format_code(&file, false), "pub struct A;\n");
    }

    #[test]
    fn snake_case_handles_acronyms_and_digits() {
        assert_eq!(snake_case("Pair"), "pair");
        assert_eq!(snake_case("PairSubclass"), "pair_subclass");
        assert_eq!(snake_case("IOStats"), "io_stats");
        assert_eq!(snake_case("Pairwise2Builder"), "pairwise2_builder");
    }

    #[test]
    fn render_names_the_file_after_the_artifact() {
        let rendered = render(&artifact(quote!(pub struct PairBuilder;)), false).unwrap();
        assert_eq!(rendered.file_name, "pair_builder.rs");
        assert_eq!(rendered.qualified_name, "model::PairBuilder");
    }

    #[test]
    fn render_reports_the_artifact_on_invalid_tokens() {
        let err = render(&artifact(quote!(fn)), false).unwrap_err();
        assert!(err.to_string().contains("PairBuilder (builder)"));
    }

    #[test]
    fn directory_sink_writes_atomically() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("nested"));
        let rendered = render(&artifact(quote!(pub struct PairBuilder;)), true).unwrap();
        sink.accept(&rendered).unwrap();

        let path = dir.path().join("nested").join("pair_builder.rs");
        assert_eq!(sink.written(), &[path.clone()]);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("pub struct PairBuilder;"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn memory_sink_keys_by_qualified_name() {
        let mut sink = MemorySink::new();
        let rendered = render(&artifact(quote!(pub struct PairBuilder;)), false).unwrap();
        sink.accept(&rendered).unwrap();
        assert_eq!(sink.names(), vec!["model::PairBuilder"]);
        assert!(sink.get("model::PairBuilder").is_some());
    }

    #[test]
    fn dry_run_sink_prints_the_file() {
        let mut sink = DryRunSink::new(Vec::new());
        let rendered = render(&artifact(quote!(pub struct PairBuilder;)), false).unwrap();
        sink.accept(&rendered).unwrap();
        let printed = String::from_utf8(sink.into_inner()).unwrap();
        assert!(printed.starts_with("// ==> pair_builder.rs (model::PairBuilder)"));
        assert!(printed.contains("pub struct PairBuilder;"));
    }
}
