//! Stencil Declaration Model
//!
//! This crate provides the data types shared by every stage of the stencil
//! type synthesis engine. They are produced by the structural extractor in
//! `stencil-gen` and consumed, read-only, by the builder, implementation and
//! converter synthesizers.
//!
//! ## Core Types
//!
//! - [`TypeInformation`] - The normalized record describing one declared type
//! - [`FieldInfo`] - One field with its tags, default, derivation and normalization
//! - [`EntryPoint`] - The single constructor or factory used for reconstruction
//! - [`MethodInfo`] - A method carried to the implementation, with its interceptors
//! - [`TagKind`] / [`TagUse`] - Semantic tags and their parsed arguments
//! - [`DeclarationKind`] / [`ValueCategory`] - What a tag is attached to
//! - [`ArtifactKind`] / [`ArtifactSet`] - Which artifacts a declaration requests
//! - [`ContractKind`] - When a generated contract is enforced
//! - [`Diagnostic`] - Severity, message and source location reported by the engine
//!
//! ## Examples
//!
//! ```
//! use stencil_define::{ArtifactKind, ArtifactSet, TagKind};
//! use std::str::FromStr;
//!
//! let tag = TagKind::from_str("strictly_ascending").unwrap();
//! assert!(tag.is_value_constraint());
//!
//! let artifacts = ArtifactSet::all();
//! assert!(artifacts.contains(ArtifactKind::Converter));
//! assert_eq!(ArtifactKind::Implementation.default_suffix(), "Subclass");
//! ```

pub mod artifact;
pub mod contract;
pub mod diagnostic;
pub mod kinds;
pub mod model;
pub mod prelude;
pub mod tag;

// Re-export main types at crate root
pub use artifact::{ArtifactKind, ArtifactSet};
pub use contract::ContractKind;
pub use diagnostic::{Diagnostic, Severity, SourceLocation};
pub use kinds::{DeclarationKind, ValueCategory};
pub use model::{
    EntryPoint, EntryPointKind, FieldInfo, MethodInfo, Parameter, Receiver, TypeInformation,
    TypeParameter,
};
pub use tag::{TagArgumentError, TagArguments, TagKind, TagUse};
