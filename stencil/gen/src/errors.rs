//! Error types for the stencil engine.
//!
//! Two layers exist:
//!
//! - [`SynthesisError`] is fatal for one declared type only. The driver turns
//!   it into an error diagnostic, skips that type's artifacts and moves on.
//! - [`GeneratorError`] covers everything around the engine: reading and
//!   parsing declaration files, configuration, and writing output.

use stencil_define::{DeclarationKind, Diagnostic, SourceLocation, TagKind, ValueCategory};
use thiserror::Error;

/// Errors that can occur while loading, generating or writing.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A declaration file is not valid Rust
    #[error("Failed to parse declarations in '{path}': {message}")]
    ParseError { path: String, message: String },

    /// A declaration file could not be read
    #[error("Failed to read declaration file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file
    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to generate code
    #[error("Code generation failed: {0}")]
    CodeGenError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),

    /// The run finished but reported error diagnostics.
    #[error("Generation reported {errors} error diagnostic(s)")]
    Diagnostics { errors: usize },
}

/// Problems with an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Artifact suffixes become part of Rust identifiers.
    #[error("invalid {artifact} suffix '{suffix}': {reason}")]
    InvalidSuffix {
        artifact: String,
        suffix: String,
        reason: String,
    },

    #[error("invalid {setting} '{value}': {reason}")]
    InvalidPath {
        setting: &'static str,
        value: String,
        reason: String,
    },

    /// Two artifact kinds would produce the same name.
    #[error("suffix '{suffix}' is used by more than one artifact kind")]
    DuplicateSuffix { suffix: String },

    #[error("no output directory was set and OUT_DIR is not defined")]
    MissingOutDir,
}

/// A declaration whose shape cannot be synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error(
        "`{type_name}` declares no reconstruction entry point; tag one associated function with #[reconstruct] or #[factory]"
    )]
    MissingEntryPoint { type_name: String },

    #[error(
        "`{type_name}` declares {} reconstruction entry points ({}); exactly one is allowed",
        .names.len(),
        .names.join(", ")
    )]
    MultipleEntryPoints {
        type_name: String,
        names: Vec<String>,
    },

    #[error("parameter `{parameter}` of `{type_name}::{entry_point}` has no matching field")]
    UnmatchedParameter {
        type_name: String,
        entry_point: String,
        parameter: String,
    },

    #[error("derived field `{field}` of `{type_name}` cannot be a parameter of the entry point")]
    DerivedParameter { type_name: String, field: String },

    #[error(
        "derivation of `{type_name}::{field}` references `{reference}`, which is not assigned before it"
    )]
    ForwardReference {
        type_name: String,
        field: String,
        reference: String,
    },

    #[error(
        "field `{field}` of `{type_name}` is neither an entry-point parameter, derived, defaulted nor an Option"
    )]
    UnsuppliedField { type_name: String, field: String },

    #[error("helper field `{field}` of `{type_name}` needs a #[default] or an Option type")]
    HelperWithoutDefault { type_name: String, field: String },

    #[error("field `{field}` of `{type_name}` cannot be both #[{first}] and #[{second}]")]
    ConflictingTags {
        type_name: String,
        field: String,
        first: TagKind,
        second: TagKind,
    },

    #[error("entry point `{type_name}::{entry_point}` {reason}")]
    InvalidEntryPoint {
        type_name: String,
        entry_point: String,
        reason: String,
    },

    #[error("method `{type_name}::{method}` has no body; only entry points may omit it")]
    BodilessMethod { type_name: String, method: String },

    #[error("`{type_name}` must be a struct with named fields")]
    UnnamedFields { type_name: String },

    #[error("`{type_name}` is marked #[synth] more than once")]
    DuplicateDeclaration { type_name: String },
}

/// A tag used where it does not belong, or with malformed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("#[{tag}] cannot be applied to {kind} `{element}`")]
    IllegalTarget {
        tag: TagKind,
        kind: DeclarationKind,
        element: String,
    },

    #[error("#[{tag}] on `{element}` requires {expected}, but `{element}` is {category}")]
    IllegalCategory {
        tag: TagKind,
        element: String,
        category: ValueCategory,
        expected: &'static str,
    },

    #[error("malformed arguments for #[{tag}] on `{element}`: {reason}")]
    MalformedArguments {
        tag: TagKind,
        element: String,
        reason: String,
    },

    #[error("#[{tag}] appears more than once on `{element}`")]
    DuplicateTag { tag: TagKind, element: String },

    #[error("#[{tag}] cannot intercept `{method}`: {reason}")]
    InterceptorMisuse {
        tag: TagKind,
        method: String,
        reason: String,
    },

    #[error("`{type_name}` declares {kind} parameter `{name}`; only type parameters are supported")]
    UnsupportedGeneric {
        type_name: String,
        kind: &'static str,
        name: String,
    },
}

/// A failure that stops synthesis of one type, with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("{error}")]
    Structure {
        error: StructureError,
        location: SourceLocation,
    },

    #[error("{error}")]
    Usage {
        error: UsageError,
        location: SourceLocation,
    },
}

impl SynthesisError {
    pub fn structure(error: StructureError, location: SourceLocation) -> Self {
        SynthesisError::Structure { error, location }
    }

    pub fn usage(error: UsageError, location: SourceLocation) -> Self {
        SynthesisError::Usage { error, location }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            SynthesisError::Structure { location, .. } | SynthesisError::Usage { location, .. } => {
                location
            }
        }
    }

    /// The error diagnostic reported for this failure.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let prefix = match self {
            SynthesisError::Structure { .. } => "structure error",
            SynthesisError::Usage { .. } => "usage error",
        };
        Diagnostic::error(format!("{}: {}", prefix, self), self.location().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_entry_points_lists_every_name() {
        let err = StructureError::MultipleEntryPoints {
            type_name: "Pair".to_string(),
            names: vec!["new".to_string(), "of".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "`Pair` declares 2 reconstruction entry points (new, of); exactly one is allowed"
        );
    }

    #[test]
    fn diagnostic_carries_kind_prefix_and_location() {
        let location = SourceLocation::new(Some("decls/pair.rs"), 7, 4);
        let err = SynthesisError::usage(
            UsageError::IllegalCategory {
                tag: TagKind::Size,
                element: "count".to_string(),
                category: ValueCategory::Integer,
                expected: "text or a collection",
            },
            location.clone(),
        );
        let diagnostic = err.to_diagnostic();
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.location, location);
        assert_eq!(
            diagnostic.message,
            "usage error: #[size] on `count` requires text or a collection, but `count` is integer"
        );
    }
}
