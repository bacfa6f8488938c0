//! Builder synthesis.
//!
//! Emits `<Name>Builder`, holding one `Option` slot per entry-point
//! parameter. Setters chain by value; `build()` reports the first unset
//! mandatory field in field order, fills unset optional fields with their
//! defaults and calls the entry point with arguments in parameter order.

use proc_macro2::TokenStream;
use quote::quote;
use stencil_define::ArtifactKind;

use crate::errors::GeneratorError;
use crate::syntax::{ident, parse_expr};

use super::Synthesizer;
use super::common::Context;

/// Synthesizes `<Name>Builder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderSynthesizer;

impl Synthesizer for BuilderSynthesizer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Builder
    }

    fn synthesize(&self, ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
        generate_builder(ctx)
    }
}

/// Generates the builder artifact for one type.
pub fn generate_builder(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let info = ctx.info;
    let runtime = &ctx.runtime;
    let type_name = ctx.type_name();
    let builder = ctx.artifact_ident(ArtifactKind::Builder);
    let params = ctx.generics.params();
    let args = ctx.generics.args();
    let where_clause = ctx.generics.where_clause();
    let self_type = quote!(#builder #args);
    let target = ctx.implementation_type();
    let entry = ident(&info.entry_point.name);

    let settable: Vec<(usize, &stencil_define::FieldInfo)> = info
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| info.is_parameter(field))
        .collect();

    let slots = settable.iter().map(|(index, field)| {
        let name = ident(&field.name);
        let ty = ctx.field_type(*index);
        quote!(#name: ::core::option::Option<#ty>,)
    });
    let empty_slots = settable.iter().map(|(_, field)| {
        let name = ident(&field.name);
        quote!(#name: ::core::option::Option::None,)
    });

    let (marker_field, marker_init) = match ctx.generics.marker() {
        Some(marker) => (
            quote!(__marker: #marker,),
            quote!(__marker: ::core::marker::PhantomData,),
        ),
        None => (TokenStream::new(), TokenStream::new()),
    };

    let setters = settable.iter().map(|(index, field)| {
        let name = ident(&field.name);
        let ty = ctx.field_type(*index);
        let doc = if field.is_mandatory {
            format!(" Sets `{}`; required before `build()`.", field.name)
        } else {
            format!(" Sets `{}`.", field.name)
        };
        quote! {
            #[doc = #doc]
            pub fn #name(mut self, value: impl ::core::convert::Into<#ty>) -> Self {
                self.#name = ::core::option::Option::Some(value.into());
                self
            }
        }
    });

    // Resolution of each slot, in field order so the first missing
    // mandatory field is the one reported.
    let mut resolved = Vec::new();
    for (_, field) in &settable {
        let name = ident(&field.name);
        let field_name = field.name.as_str();
        let value = if let Some(source) = &field.default_expression {
            let expr = parse_expr(source)?;
            quote!(self.#name.unwrap_or_else(|| #expr))
        } else if field.nullable {
            quote!(self.#name.flatten())
        } else {
            quote! {
                match self.#name {
                    ::core::option::Option::Some(value) => value,
                    ::core::option::Option::None => {
                        return ::core::result::Result::Err(
                            #runtime::MissingMandatoryFieldError::new(#type_name, #field_name).into(),
                        );
                    }
                }
            }
        };
        resolved.push(quote!(let #name = #value;));
    }
    let call_args = info.entry_point.parameters.iter().map(|param| ident(&param.name));

    let with_defaults = if info.mandatory_fields().next().is_none() {
        let doc = format!(" Builds a `{}` from defaults alone.", type_name);
        quote! {
            impl #params #target #where_clause {
                #[doc = #doc]
                pub fn with_defaults() -> ::core::result::Result<Self, #runtime::BuildError> {
                    <#self_type>::new().build()
                }
            }
        }
    } else {
        TokenStream::new()
    };

    let doc = format!(" Fluent builder for [`{}`].", ctx.artifact_name(ArtifactKind::Implementation));
    let build_doc = format!(
        " Builds the instance through `{}::{}`.",
        ctx.artifact_name(ArtifactKind::Implementation),
        info.entry_point.name
    );

    Ok(quote! {
        #[doc = #doc]
        pub struct #builder #params #where_clause {
            #(#slots)*
            #marker_field
        }

        impl #params ::core::default::Default for #self_type #where_clause {
            fn default() -> Self {
                Self {
                    #(#empty_slots)*
                    #marker_init
                }
            }
        }

        impl #params #self_type #where_clause {
            pub fn new() -> Self {
                ::core::default::Default::default()
            }

            #(#setters)*

            #[doc = #build_doc]
            pub fn build(self) -> ::core::result::Result<#target, #runtime::BuildError> {
                #(#resolved)*
                <#target>::#entry(#(#call_args),*).map_err(#runtime::BuildError::from)
            }
        }

        #with_defaults
    })
}
