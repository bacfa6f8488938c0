//! State shared by the three synthesizers of one type.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use stencil_define::{ArtifactKind, TypeInformation};

use crate::config::EngineConfig;
use crate::contract::{ContractGenerator, ContractSet};
use crate::errors::GeneratorError;
use crate::registry::TagRegistry;
use crate::syntax::{ident, mentions_any, parse_type};

use super::intercept::InterceptorRegistry;

/// One generated source file, still as tokens.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// The declared type the artifact belongs to.
    pub type_name: String,
    /// The generated item name, e.g. `PairBuilder`.
    pub name: String,
    /// `name` prefixed with the configured module path.
    pub qualified_name: String,
    pub tokens: TokenStream,
}

/// Contracts of one type, generated once and shared by every synthesizer.
#[derive(Debug, Clone, Default)]
pub struct Contracts {
    /// Indexed like `TypeInformation::fields`.
    pub fields: Vec<ContractSet>,
    pub invariants: ContractSet,
    pub postconditions: ContractSet,
}

impl Contracts {
    pub fn generate(
        generator: &ContractGenerator<'_>,
        info: &TypeInformation,
    ) -> Result<Self, GeneratorError> {
        let fields = info
            .fields
            .iter()
            .map(|field| generator.field_contracts(field))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            fields,
            invariants: generator.type_invariants(info)?,
            postconditions: generator.type_postconditions(info)?,
        })
    }
}

/// The declared generics, parsed once.
#[derive(Debug, Clone)]
pub struct Generics {
    generics: syn::Generics,
    names: Vec<String>,
}

impl Generics {
    fn from_info(info: &TypeInformation) -> Result<Self, GeneratorError> {
        let mut generics: syn::Generics = if info.type_parameters.is_empty() {
            syn::Generics::default()
        } else {
            syn::parse_str(&info.generics_source()).map_err(|e| {
                GeneratorError::CodeGenError(format!("invalid generics of `{}`: {}", info.name, e))
            })?
        };
        if let Some(predicates) = &info.where_clause {
            let clause: syn::WhereClause = syn::parse_str(&format!("where {}", predicates))
                .map_err(|e| {
                    GeneratorError::CodeGenError(format!(
                        "invalid where clause of `{}`: {}",
                        info.name, e
                    ))
                })?;
            generics.where_clause = Some(clause);
        }
        Ok(Self {
            generics,
            names: info.type_parameters.iter().map(|p| p.name.clone()).collect(),
        })
    }

    pub fn is_generic(&self) -> bool {
        !self.names.is_empty()
    }

    /// `<T: Bound>` for item definitions and `impl` headers.
    pub fn params(&self) -> TokenStream {
        let (impl_generics, _, _) = self.generics.split_for_impl();
        impl_generics.to_token_stream()
    }

    /// `<T>` for naming the type.
    pub fn args(&self) -> TokenStream {
        let (_, ty_generics, _) = self.generics.split_for_impl();
        ty_generics.to_token_stream()
    }

    /// The declared where clause.
    pub fn where_clause(&self) -> TokenStream {
        self.generics.where_clause.to_token_stream()
    }

    /// The declared where clause plus `extra`.
    pub fn where_with(&self, extra: impl IntoIterator<Item = syn::WherePredicate>) -> TokenStream {
        let mut generics = self.generics.clone();
        let clause = generics.make_where_clause();
        clause.predicates.extend(extra);
        if clause.predicates.is_empty() {
            return TokenStream::new();
        }
        clause.to_token_stream()
    }

    /// A `PhantomData` type tying an otherwise unused parameter list to a
    /// generated helper struct.
    pub fn marker(&self) -> Option<TokenStream> {
        if !self.is_generic() {
            return None;
        }
        let params = self.names.iter().map(|name| ident(name));
        Some(quote!(::core::marker::PhantomData<fn() -> (#(#params,)*)>))
    }

    /// Returns true if `ty` mentions one of the type parameters.
    pub fn mentions(&self, ty: &syn::Type) -> bool {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        !names.is_empty() && mentions_any(ty, &names)
    }

    /// `ty: bound` for every type in `types` that mentions a parameter.
    pub fn bounded<'t>(
        &self,
        types: impl IntoIterator<Item = &'t syn::Type>,
        bound: &TokenStream,
    ) -> Vec<syn::WherePredicate> {
        let mut seen = Vec::new();
        let mut predicates = Vec::new();
        for ty in types {
            if !self.mentions(ty) {
                continue;
            }
            let key = ty.to_token_stream().to_string();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            predicates.push(syn::parse_quote!(#ty: #bound));
        }
        predicates
    }
}

/// Everything a synthesizer reads.
#[derive(Debug)]
pub struct Context<'a> {
    pub info: &'a TypeInformation,
    pub config: &'a EngineConfig,
    pub interceptors: &'a InterceptorRegistry,
    pub contracts: Contracts,
    pub generics: Generics,
    /// Path of the runtime crate as seen from generated code.
    pub runtime: TokenStream,
    /// Parsed `declared_type` of every field.
    pub field_types: Vec<syn::Type>,
}

impl<'a> Context<'a> {
    pub fn new(
        info: &'a TypeInformation,
        config: &'a EngineConfig,
        registry: &TagRegistry,
        interceptors: &'a InterceptorRegistry,
    ) -> Result<Self, GeneratorError> {
        let field_types = info
            .fields
            .iter()
            .map(|field| parse_type(&field.declared_type))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            info,
            config,
            interceptors,
            contracts: Contracts::generate(&ContractGenerator::new(registry), info)?,
            generics: Generics::from_info(info)?,
            runtime: config.runtime_tokens()?,
            field_types,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.info.name
    }

    pub fn artifact_name(&self, kind: ArtifactKind) -> String {
        self.config.artifact_name(&self.info.name, kind)
    }

    pub fn artifact_ident(&self, kind: ArtifactKind) -> syn::Ident {
        ident(&self.artifact_name(kind))
    }

    /// `PairSubclass<T>`.
    pub fn implementation_type(&self) -> TokenStream {
        let name = self.artifact_ident(ArtifactKind::Implementation);
        let args = self.generics.args();
        quote!(#name #args)
    }

    pub fn field_type(&self, index: usize) -> &syn::Type {
        &self.field_types[index]
    }

    /// Wraps synthesized tokens into an [`Artifact`].
    pub fn artifact(&self, kind: ArtifactKind, tokens: TokenStream) -> Artifact {
        Artifact {
            kind,
            type_name: self.info.name.clone(),
            name: self.artifact_name(kind),
            qualified_name: self.config.qualified_name(&self.info.name, kind),
            tokens,
        }
    }
}

/// `#[doc = ".."]` attributes for a list of doc lines.
pub fn doc_attrs(lines: &[String]) -> TokenStream {
    let lines = lines.iter().map(|line| format!(" {}", line));
    quote!(#(#[doc = #lines])*)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{extract_first, GENERIC_TAGGED, PAIR};

    #[test]
    fn generics_split_into_params_args_and_where() {
        let info = extract_first(GENERIC_TAGGED);
        let generics = Generics::from_info(&info).unwrap();
        assert!(generics.is_generic());
        assert_eq!(generics.params().to_string(), "< T : Clone + PartialOrd >");
        assert_eq!(generics.args().to_string(), "< T >");
        assert!(generics.marker().is_some());
    }

    #[test]
    fn bounded_predicates_only_cover_types_with_parameters() {
        let info = extract_first(GENERIC_TAGGED);
        let generics = Generics::from_info(&info).unwrap();
        let types: Vec<syn::Type> = vec![
            syn::parse_quote!(T),
            syn::parse_quote!(String),
            syn::parse_quote!(T),
        ];
        let predicates = generics.bounded(&types, &quote!(::core::fmt::Debug));
        assert_eq!(predicates.len(), 1);
        assert_eq!(
            generics.where_with(predicates).to_string(),
            "where T : :: core :: fmt :: Debug"
        );
    }

    #[test]
    fn plain_types_have_no_generics() {
        let info = extract_first(PAIR);
        let generics = Generics::from_info(&info).unwrap();
        assert!(!generics.is_generic());
        assert!(generics.params().is_empty());
        assert!(generics.where_with(Vec::new()).is_empty());
        assert!(generics.marker().is_none());
    }
}
