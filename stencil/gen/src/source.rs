//! Loading declaration files into a compilation unit.
//!
//! A declaration file is parsed with `syn` and never compiled. Structs tagged
//! `#[synth]` become [`TypeDeclaration`]s; inherent `impl` blocks for those
//! names are attached to them regardless of where they appear in the file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::Span;
use stencil_define::{Diagnostic, SourceLocation, TagKind};
use syn::spanned::Spanned;
use tracing::{debug, instrument};

use crate::errors::GeneratorError;

/// One `#[synth]` struct and the inherent impl blocks declared for it.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub item: syn::ItemStruct,
    pub impls: Vec<syn::ItemImpl>,
    /// The file the declaration was read from, for diagnostics.
    pub file: Option<String>,
}

impl TypeDeclaration {
    pub fn name(&self) -> String {
        self.item.ident.to_string()
    }

    /// Where the struct is declared.
    pub fn location(&self) -> SourceLocation {
        location_of(self.item.ident.span(), self.file.as_deref())
    }
}

/// Every declaration handed to one engine run.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    declarations: Vec<TypeDeclaration>,
    files: Vec<PathBuf>,
    notes: Vec<Diagnostic>,
}

impl CompilationUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses declarations from source text.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_gen::source::CompilationUnit;
    ///
    /// let unit = CompilationUnit::from_source(r#"
    ///     #[synth]
    ///     pub struct Pair { first: String }
    ///
    ///     impl Pair {
    ///         #[reconstruct]
    ///         pub fn new(first: String) -> Self;
    ///     }
    /// "#, None).unwrap();
    ///
    /// assert_eq!(unit.declarations().len(), 1);
    /// assert_eq!(unit.declarations()[0].impls.len(), 1);
    /// ```
    pub fn from_source(source: &str, file: Option<&str>) -> Result<Self, GeneratorError> {
        let mut unit = Self::new();
        unit.add_source(source, file)?;
        Ok(unit)
    }

    /// Reads and parses every file in `paths`.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, GeneratorError> {
        let mut unit = Self::new();
        for path in paths {
            unit.add_file(path.as_ref())?;
        }
        Ok(unit)
    }

    /// Reads and parses one declaration file.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn add_file(&mut self, path: &Path) -> Result<(), GeneratorError> {
        let source = fs::read_to_string(path).map_err(|source| GeneratorError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        self.add_source(&source, Some(&path.display().to_string()))?;
        self.files.push(path.to_path_buf());
        Ok(())
    }

    /// Parses one source text and adds its declarations.
    pub fn add_source(&mut self, source: &str, file: Option<&str>) -> Result<(), GeneratorError> {
        let parsed = syn::parse_file(source).map_err(|e| {
            let start = e.span().start();
            GeneratorError::ParseError {
                path: file.unwrap_or("<input>").to_string(),
                message: format!("{} at line {}, column {}", e, start.line, start.column + 1),
            }
        })?;

        let mut structs = Vec::new();
        let mut impls: HashMap<String, Vec<syn::ItemImpl>> = HashMap::new();

        for item in parsed.items {
            match item {
                syn::Item::Struct(item) if is_declaration(&item.attrs) => structs.push(item),
                syn::Item::Struct(item) => {
                    debug!(name = %item.ident, "skipping struct without #[synth]");
                }
                syn::Item::Impl(item) => match impl_target(&item) {
                    Some(name) if item.trait_.is_none() => {
                        impls.entry(name).or_default().push(item);
                    }
                    Some(name) => {
                        self.notes.push(Diagnostic::warning(
                            format!(
                                "trait impl for `{}` is not carried to synthesized types",
                                name
                            ),
                            location_of(item.span(), file),
                        ));
                    }
                    None => {}
                },
                _ => {}
            }
        }

        for item in structs {
            let name = item.ident.to_string();
            let attached = impls.remove(&name).unwrap_or_default();
            debug!(%name, impls = attached.len(), "found declaration");
            self.declarations.push(TypeDeclaration {
                item,
                impls: attached,
                file: file.map(str::to_string),
            });
        }

        for (name, orphaned) in impls {
            for item in orphaned {
                if mentions_entry_point(&item) {
                    self.notes.push(Diagnostic::warning(
                        format!(
                            "impl block for `{}` declares an entry point but `{}` is not marked #[synth]",
                            name, name
                        ),
                        location_of(item.span(), file),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn declarations(&self) -> &[TypeDeclaration] {
        &self.declarations
    }

    /// The files read into this unit.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Warnings found while loading, reported by the driver.
    pub fn notes(&self) -> &[Diagnostic] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Converts a span into a diagnostic location.
pub fn location_of(span: Span, file: Option<&str>) -> SourceLocation {
    let start = span.start();
    SourceLocation::new(file, start.line, start.column)
}

fn is_declaration(attrs: &[syn::Attribute]) -> bool {
    attrs
        .iter()
        .any(|attr| attr.path().is_ident(TagKind::Synth.attribute_name()))
}

fn impl_target(item: &syn::ItemImpl) -> Option<String> {
    match item.self_ty.as_ref() {
        syn::Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

fn mentions_entry_point(item: &syn::ItemImpl) -> bool {
    let needle = |name: &str| {
        item.items.iter().any(|member| match member {
            syn::ImplItem::Fn(f) => f.attrs.iter().any(|a| a.path().is_ident(name)),
            syn::ImplItem::Verbatim(tokens) => tokens.to_string().contains(name),
            _ => false,
        })
    };
    needle(TagKind::Reconstruct.attribute_name()) || needle(TagKind::Factory.attribute_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impls_before_the_struct_are_attached() {
        let unit = CompilationUnit::from_source(
            r#"
            impl Pair {
                #[reconstruct]
                pub fn new(first: String) -> Self;
            }

            #[synth]
            pub struct Pair { first: String }
            "#,
            Some("decls/pair.rs"),
        )
        .unwrap();

        let decl = &unit.declarations()[0];
        assert_eq!(decl.name(), "Pair");
        assert_eq!(decl.impls.len(), 1);
        assert_eq!(decl.file.as_deref(), Some("decls/pair.rs"));
    }

    #[test]
    fn structs_without_synth_are_ignored() {
        let unit = CompilationUnit::from_source("pub struct Plain { a: u8 }", None).unwrap();
        assert!(unit.is_empty());
        assert!(unit.notes().is_empty());
    }

    #[test]
    fn trait_impls_produce_a_warning() {
        let unit = CompilationUnit::from_source(
            r#"
            #[synth]
            pub struct Pair { first: String }
            impl Clone for Pair { fn clone(&self) -> Self { todo!() } }
            "#,
            None,
        )
        .unwrap();
        assert_eq!(unit.notes().len(), 1);
        assert!(unit.notes()[0].message.contains("trait impl"));
    }

    #[test]
    fn orphaned_entry_points_produce_a_warning() {
        let unit = CompilationUnit::from_source(
            r#"
            pub struct Loose { a: u8 }
            impl Loose {
                #[reconstruct]
                pub fn new(a: u8) -> Self;
            }
            "#,
            Some("decls/loose.rs"),
        )
        .unwrap();
        assert!(unit.is_empty());
        assert!(unit.notes()[0].message.contains("not marked #[synth]"));
        assert_eq!(unit.notes()[0].location.line, 3);
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let err = CompilationUnit::from_source("struct {", Some("decls/bad.rs")).unwrap_err();
        match err {
            GeneratorError::ParseError { path, message } => {
                assert_eq!(path, "decls/bad.rs");
                assert!(message.contains("line 1"));
            }
            other => panic!("Expected ParseError, got: {:?}", other),
        }
    }

    #[test]
    fn missing_files_are_read_errors() {
        let err = CompilationUnit::from_files(&["does/not/exist.rs"]).unwrap_err();
        assert!(matches!(err, GeneratorError::ReadError { .. }));
    }
}
