//! Stencil type synthesis engine.
//!
//! This crate reads sparse type declarations, written as ordinary Rust
//! source that is parsed but never compiled, and generates the code needed
//! to use those types safely:
//!
//! - `<Name>Subclass` - the validated implementation, with structural
//!   equality, hashing, printing and intercepted methods
//! - `<Name>Builder` - a fluent builder that tracks mandatory fields
//! - `<Name>Converter` - conversion to and from a tree representation
//!
//! ## Modules
//!
//! - [`source`] - Loading declaration files into a [`CompilationUnit`]
//! - [`registry`] - The tag registry: legal targets, categories and arguments
//! - [`extract`] - The structural extractor producing `TypeInformation`
//! - [`contract`] - Contract fragments generated from constraint tags
//! - [`codegen`] - The builder, implementation and converter synthesizers
//! - [`driver`] - The [`Engine`] running a whole compilation unit
//! - [`output`] - Validation, formatting and file sinks
//! - [`diagnostics`] - Diagnostic sinks
//! - [`build`] - Build-script integration
//! - [`config`] - Engine configuration
//! - [`errors`] - Error types for the engine
//!
//! ## Example Usage
//!
//! ```
//! use stencil_gen::config::EngineConfig;
//! use stencil_gen::diagnostics::CollectingSink;
//! use stencil_gen::driver::Engine;
//! use stencil_gen::output::MemorySink;
//! use stencil_gen::source::CompilationUnit;
//!
//! let unit = CompilationUnit::from_source(r#"
//!     #[synth]
//!     pub struct Pair {
//!         first: String,
//!         #[default(String::from("x"))]
//!         second: String,
//!     }
//!
//!     impl Pair {
//!         #[reconstruct]
//!         pub fn new(first: String, second: String) -> Self;
//!     }
//! "#, None).unwrap();
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let mut diagnostics = CollectingSink::new();
//! let mut files = MemorySink::new();
//! let report = engine.run(&unit, &mut diagnostics, &mut files).unwrap();
//!
//! assert!(report.is_success());
//! assert!(files.get("PairBuilder").is_some());
//! ```

pub mod build;
pub mod codegen;
pub mod config;
pub mod contract;
pub mod diagnostics;
pub mod driver;
pub mod errors;
pub mod extract;
pub mod output;
pub mod registry;
pub mod source;
pub mod syntax;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::EngineConfig;
pub use driver::{Engine, RunReport};
pub use errors::{GeneratorError, StructureError, SynthesisError, UsageError};
pub use source::CompilationUnit;
