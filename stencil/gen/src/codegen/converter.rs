//! Converter synthesis.
//!
//! Emits `<Name>Converter`, implementing the runtime `Converter` trait, and
//! a `Representable` impl for the implementation so synthesized types nest.
//! Export writes the non-helper entry-point parameters in field order as an
//! array; import reads them back in the same order, gathers `Vec` fields
//! through collectors, fills helpers with their defaults and calls the entry
//! point.

use proc_macro2::{Literal, TokenStream};
use quote::quote;
use stencil_define::{ArtifactKind, FieldInfo};

use crate::errors::GeneratorError;
use crate::syntax::{ident, parse_expr, vec_element};

use super::Synthesizer;
use super::common::Context;

/// Synthesizes `<Name>Converter`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConverterSynthesizer;

impl Synthesizer for ConverterSynthesizer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Converter
    }

    fn synthesize(&self, ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
        generate_converter(ctx)
    }
}

/// Generates the converter artifact for one type.
pub fn generate_converter(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let info = ctx.info;
    let runtime = &ctx.runtime;
    let type_name = ctx.type_name();
    let converter = ctx.artifact_ident(ArtifactKind::Converter);
    let params = ctx.generics.params();
    let args = ctx.generics.args();
    let where_clause = ctx.generics.where_clause();
    let target = ctx.implementation_type();
    let entry = ident(&info.entry_point.name);

    let parameters: Vec<(usize, &FieldInfo)> = info
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| info.is_parameter(field))
        .collect();
    let represented: Vec<(usize, &FieldInfo)> = parameters
        .iter()
        .copied()
        .filter(|(_, field)| !field.helper)
        .collect();

    // Every represented type must convert itself; `Vec<T>` needs `T` too,
    // because its elements go through a collector.
    let mut bounded_types: Vec<syn::Type> = Vec::new();
    for (index, _) in &represented {
        let ty = ctx.field_type(*index);
        bounded_types.push(ty.clone());
        if let Some(element) = vec_element(ty) {
            bounded_types.push(element.clone());
        }
    }
    let representable = quote!(#runtime::Representable);
    let convert_where = ctx
        .generics
        .where_with(ctx.generics.bounded(&bounded_types, &representable));

    let exports = represented.iter().map(|(_, field)| {
        let name = ident(&field.name);
        quote!(#runtime::Representable::to_node(value.#name()))
    });

    let mut imports = Vec::new();
    for (index, field) in &represented {
        let name = ident(&field.name);
        let field_name = field.name.as_str();
        let ty = ctx.field_type(*index);
        let read = match vec_element(ty) {
            Some(element) => {
                let collector = match field.capacity() {
                    Some(capacity) => {
                        let capacity = Literal::usize_unsuffixed(capacity);
                        quote!(#runtime::BoundedCollector::<#element>::new(#capacity))
                    }
                    None => quote!(#runtime::UnboundedCollector::<#element>::new()),
                };
                quote!(#runtime::represent::read_collection(&mut __items, #field_name, #collector)?)
            }
            None => quote!(#runtime::represent::read_field(&mut __items, #field_name)?),
        };
        imports.push(quote!(let #name: #ty = #read;));
    }
    for (index, field) in parameters.iter().filter(|(_, field)| field.helper) {
        let name = ident(&field.name);
        let ty = ctx.field_type(*index);
        let value = match &field.default_expression {
            Some(source) => {
                let expr = parse_expr(source)?;
                quote!(#expr)
            }
            None => quote!(::core::option::Option::None),
        };
        imports.push(quote!(let #name: #ty = #value;));
    }
    let arity = Literal::usize_unsuffixed(represented.len());
    let items_binding = if represented.is_empty() {
        quote!(let _ = #runtime::represent::expect_sequence(node, #type_name, #arity)?;)
    } else {
        quote!(let mut __items = #runtime::represent::expect_sequence(node, #type_name, #arity)?;)
    };
    let call_args = info.entry_point.parameters.iter().map(|param| ident(&param.name));

    let (converter_def, converter_type) = match ctx.generics.marker() {
        Some(marker) => (
            quote!(pub struct #converter #params (#marker) #where_clause;),
            quote!(#converter #args),
        ),
        None => (quote!(pub struct #converter;), quote!(#converter)),
    };
    let doc = format!(
        " Converts [`{}`] to and from its tree representation.",
        ctx.artifact_name(ArtifactKind::Implementation)
    );

    Ok(quote! {
        #[doc = #doc]
        #converter_def

        impl #params #runtime::Converter for #converter_type #convert_where {
            type Target = #target;

            fn export(value: &#target) -> #runtime::Node {
                #runtime::Node::Array(::std::vec![#(#exports),*])
            }

            fn import(node: &#runtime::Node) -> ::core::result::Result<#target, #runtime::RecoveryError> {
                #items_binding
                #(#imports)*
                <#target>::#entry(#(#call_args),*).map_err(#runtime::RecoveryError::from)
            }
        }

        impl #params #runtime::Representable for #target #convert_where {
            fn to_node(&self) -> #runtime::Node {
                <#converter_type as #runtime::Converter>::export(self)
            }

            fn from_node(
                node: &#runtime::Node,
                _field: &str,
            ) -> ::core::result::Result<Self, #runtime::RecoveryError> {
                <#converter_type as #runtime::Converter>::import(node)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{GENERIC_TAGGED, PAIR, READINGS, TEAM, context_parts, has, squash};

    fn render(source: &str) -> String {
        let (info, config, registry, interceptors) = context_parts(source);
        let ctx = Context::new(&info, &config, &registry, &interceptors).unwrap();
        squash(&generate_converter(&ctx).unwrap().to_string())
    }

    #[test]
    fn pair_converter_exports_and_imports_in_field_order() {
        let code = render(PAIR);
        assert!(has(&code, "pub struct PairConverter;"));
        assert!(has(&code, "impl ::stencil_runtime::Converter for PairConverter"));
        assert!(has(
            &code,
            "::stencil_runtime::Representable::to_node(value.first()), ::stencil_runtime::Representable::to_node(value.second())"
        ));
        assert!(has(
            &code,
            "::stencil_runtime::represent::expect_sequence(node, \"Pair\", 2)?"
        ));
        assert!(has(
            &code,
            "let first: String = ::stencil_runtime::represent::read_field(&mut __items, \"first\")?;"
        ));
        assert!(has(&code, "impl ::stencil_runtime::Representable for PairSubclass"));
    }

    #[test]
    fn bounded_vec_fields_use_a_bounded_collector() {
        let code = render(READINGS);
        assert!(has(&code, "::stencil_runtime::BoundedCollector::<i32>::new(3)"));
    }

    #[test]
    fn helper_fields_are_not_represented() {
        let code = render(TEAM);
        assert!(has(&code, "expect_sequence(node, \"Team\", 2)?"));
        assert!(has(&code, "let audited: bool = false;"));
        assert!(has(&code, "::stencil_runtime::UnboundedCollector::<Pair>::new()"));
    }

    #[test]
    fn generic_converters_require_representable_parameters() {
        let code = render(GENERIC_TAGGED);
        assert!(has(&code, "pub struct TaggedConverter<T: Clone + PartialOrd>("));
        assert!(has(&code, "T: ::stencil_runtime::Representable"));
        assert!(has(&code, "for TaggedConverter<T>"));
    }
}
