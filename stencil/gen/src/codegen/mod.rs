//! Code generation for stencil artifacts.
//!
//! Each synthesizer reads the same [`TypeInformation`] through a shared
//! [`Context`] and produces one artifact kind. They never depend on each
//! other's output, only on the names the configuration assigns.
//!
//! ## Submodules
//!
//! - [`common`] - The shared context, generics handling and [`Artifact`]
//! - [`implementation`] - `<Name>Subclass`: struct, entry point, contracts, equality
//! - [`builder`] - `<Name>Builder` with mandatory-field tracking
//! - [`converter`] - `<Name>Converter` to and from the tree representation
//! - [`intercept`] - Strategies for `#[cached]` and `#[logged]` methods
//!
//! ## Output Format
//!
//! All synthesizers return `proc_macro2::TokenStream`, which is then:
//! - Validated with `syn::parse2` to ensure correctness
//! - Formatted with `prettyplease` for consistent style
//!
//! See [`crate::output`] for the validation and file writing logic.
//!
//! [`TypeInformation`]: stencil_define::TypeInformation

pub mod builder;
pub mod common;
pub mod converter;
pub mod implementation;
pub mod intercept;

use proc_macro2::TokenStream;
use stencil_define::ArtifactKind;
use tracing::{debug, instrument};

use crate::errors::GeneratorError;

pub use builder::{BuilderSynthesizer, generate_builder};
pub use common::{Artifact, Context, Contracts, Generics};
pub use converter::{ConverterSynthesizer, generate_converter};
pub use implementation::{ImplementationSynthesizer, generate_implementation};
pub use intercept::{CachedStrategy, InterceptorRegistry, InterceptorStrategy, LoggedStrategy};

/// Produces one artifact kind from a type's context.
pub trait Synthesizer {
    fn kind(&self) -> ArtifactKind;

    fn synthesize(&self, ctx: &Context<'_>) -> Result<TokenStream, GeneratorError>;
}

/// The synthesizer responsible for an artifact kind.
pub fn synthesizer_for(kind: ArtifactKind) -> &'static dyn Synthesizer {
    match kind {
        ArtifactKind::Implementation => &ImplementationSynthesizer,
        ArtifactKind::Builder => &BuilderSynthesizer,
        ArtifactKind::Converter => &ConverterSynthesizer,
    }
}

/// Runs every synthesizer the type requested, in emission order.
#[instrument(skip_all, fields(type_name = %ctx.info.name))]
pub fn synthesize_all(ctx: &Context<'_>) -> Result<Vec<Artifact>, GeneratorError> {
    let mut artifacts = Vec::new();
    for kind in ctx.info.artifacts.kinds() {
        let tokens = synthesizer_for(kind).synthesize(ctx)?;
        debug!(%kind, "synthesized");
        artifacts.push(ctx.artifact(kind, tokens));
    }
    Ok(artifacts)
}
