//! Implementation synthesis.
//!
//! Emits `<Name>Subclass`, the concrete realization of a declared type:
//!
//! - the struct with every field plus interceptor state
//! - the reconstruction entry point, returning `Result<Self, ContractViolation>`
//! - getters, optional setters (`#[synth(mutable)]`)
//! - carried methods, wrapped by their interceptors
//! - `PartialEq`, `Eq`, `Hash`, `hash_code()` and `Display`
//!
//! ## Construction
//!
//! ```ignore
//! pub fn new(first: String, second: String) -> Result<Self, ContractViolation> {
//!     let __flow = Construction::begin("Pair");
//!     let second = { let second = second; second.trim().to_string() };
//!     let __flow = __flow.validate();
//!     if let Err(violation) = Self::validate_first(&first) {
//!         return __flow.reject(violation);
//!     }
//!     let len = { let first = &first; first.len() };
//!     let __instance = Self { first, second, len };
//!     // postconditions, then invariants
//!     __flow.commit(__instance)
//! }
//! ```

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use stencil_define::{ArtifactKind, FieldInfo, MethodInfo};

use crate::contract::ContractSet;
use crate::errors::GeneratorError;
use crate::syntax::{free_idents, ident, inner_type, mentions_float, parse_expr, parse_type};

use super::common::{Context, doc_attrs};
use super::intercept::{Interception, InterceptorState};
use super::Synthesizer;

/// Synthesizes `<Name>Subclass`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImplementationSynthesizer;

impl Synthesizer for ImplementationSynthesizer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Implementation
    }

    fn synthesize(&self, ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
        generate_implementation(ctx)
    }
}

/// Generates the implementation artifact for one type.
pub fn generate_implementation(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let info = ctx.info;
    let name = ctx.artifact_ident(ArtifactKind::Implementation);
    let alias = ident(&info.name);
    let params = ctx.generics.params();
    let args = ctx.generics.args();
    let where_clause = ctx.generics.where_clause();
    let self_type = ctx.implementation_type();

    let states = interceptor_states(ctx)?;
    let struct_def = generate_struct(ctx, &states);
    let entry_point = generate_entry_point(ctx, &states)?;
    let validators = generate_validators(ctx);
    let checks = generate_checks(ctx);
    let getters = generate_getters(ctx);
    let setters = generate_setters(ctx, &states)?;
    let methods = generate_methods(ctx)?;
    let equality = generate_equality(ctx);
    let display = generate_display(ctx);
    let alias_doc = format!(" The declared name of [`{}`].", name);

    Ok(quote! {
        #struct_def

        #[doc = #alias_doc]
        pub type #alias #args = #self_type;

        impl #params #self_type #where_clause {
            #entry_point
            #validators
            #checks
            #getters
            #setters
            #methods
        }

        #equality
        #display
    })
}

fn interceptor_states(ctx: &Context<'_>) -> Result<Vec<InterceptorState>, GeneratorError> {
    let mut states = Vec::new();
    for method in &ctx.info.methods {
        let call = interception(ctx, method);
        for strategy in ctx.interceptors.strategies_for(method) {
            if let Some(state) = strategy.state(&call)? {
                states.push(state);
            }
        }
    }
    Ok(states)
}

fn interception<'a>(ctx: &'a Context<'_>, method: &'a MethodInfo) -> Interception<'a> {
    Interception {
        type_name: ctx.type_name(),
        method,
        runtime: &ctx.runtime,
    }
}

fn generate_struct(ctx: &Context<'_>, states: &[InterceptorState]) -> TokenStream {
    let info = ctx.info;
    let name = ctx.artifact_ident(ArtifactKind::Implementation);
    let params = ctx.generics.params();
    let where_clause = ctx.generics.where_clause();
    let docs = doc_attrs(&info.docs);
    let derives = if info.capabilities.is_empty() {
        TokenStream::new()
    } else {
        let capabilities = info
            .capabilities
            .iter()
            .filter_map(|capability| syn::parse_str::<syn::Path>(capability).ok());
        quote!(#[derive(#(#capabilities),*)])
    };

    let fields = info.fields.iter().enumerate().map(|(index, field)| {
        let field_name = ident(&field.name);
        let ty = ctx.field_type(index);
        quote!(#field_name: #ty,)
    });
    let state_fields = states.iter().map(|state| {
        let field = &state.field;
        let ty = &state.ty;
        quote!(#field: #ty,)
    });

    quote! {
        #docs
        #derives
        pub struct #name #params #where_clause {
            #(#fields)*
            #(#state_fields)*
        }
    }
}

/// `let x = { let x = x; <normalization> };`
fn normalize(field: &FieldInfo) -> Result<TokenStream, GeneratorError> {
    let Some(source) = &field.normalization_expression else {
        return Ok(TokenStream::new());
    };
    let expr = parse_expr(source)?;
    let name = ident(&field.name);
    Ok(quote! {
        let #name = {
            let #name = #name;
            #expr
        };
    })
}

/// Evaluates a derivation with every earlier field it reads bound by
/// reference.
fn derive_value(
    ctx: &Context<'_>,
    index: usize,
    source: &str,
    access: impl Fn(&syn::Ident) -> TokenStream,
) -> Result<TokenStream, GeneratorError> {
    let expr = parse_expr(source)?;
    let referenced: HashSet<String> = free_idents(quote!(#expr)).into_iter().collect();
    let bindings = ctx.info.fields[..index]
        .iter()
        .filter(|field| referenced.contains(&field.name))
        .map(|field| {
            let name = ident(&field.name);
            let value = access(&name);
            quote!(let #name = #value;)
        });
    Ok(quote!({
        #(#bindings)*
        #expr
    }))
}

fn has_checks(ctx: &Context<'_>, index: usize) -> bool {
    !ctx.info.fields[index].is_derived() && !ctx.contracts.fields[index].is_empty()
}

fn validator_ident(field: &FieldInfo) -> syn::Ident {
    format_ident!("validate_{}", field.name)
}

fn generate_entry_point(
    ctx: &Context<'_>,
    states: &[InterceptorState],
) -> Result<TokenStream, GeneratorError> {
    let info = ctx.info;
    let runtime = &ctx.runtime;
    let type_name = ctx.type_name();
    let entry = ident(&info.entry_point.name);

    let mut inputs = Vec::new();
    for param in &info.entry_point.parameters {
        let name = ident(&param.name);
        let ty = parse_type(&param.declared_type)?;
        inputs.push(quote!(#name: #ty));
    }

    // Fields that are neither supplied nor derived take their default.
    let mut filled = Vec::new();
    for (index, field) in info.fields.iter().enumerate() {
        if field.is_derived() || info.is_parameter(field) {
            continue;
        }
        let name = ident(&field.name);
        let ty = ctx.field_type(index);
        let value = match &field.default_expression {
            Some(source) => {
                let expr = parse_expr(source)?;
                quote!(#expr)
            }
            None => quote!(::core::option::Option::None),
        };
        filled.push(quote!(let #name: #ty = #value;));
    }

    let mut normalized = Vec::new();
    for field in info.stored_fields() {
        normalized.push(normalize(field)?);
    }

    let validations = info
        .fields
        .iter()
        .enumerate()
        .filter(|(index, _)| has_checks(ctx, *index))
        .map(|(_, field)| {
            let validator = validator_ident(field);
            let name = ident(&field.name);
            quote! {
                if let ::core::result::Result::Err(violation) = Self::#validator(&#name) {
                    return __flow.reject(violation);
                }
            }
        });

    let mut derivations = Vec::new();
    for (index, field) in info.fields.iter().enumerate() {
        let Some(source) = &field.derivation_expression else {
            continue;
        };
        let name = ident(&field.name);
        let ty = ctx.field_type(index);
        let value = derive_value(ctx, index, source, |name| quote!(&#name))?;
        derivations.push(quote!(let #name: #ty = #value;));
    }

    let field_names = info.fields.iter().map(|field| ident(&field.name));
    let state_names = states.iter().map(|state| &state.field);
    let kind_doc = format!(
        " Reconstructs a `{}` from its entry-point parameters ({}).",
        type_name, info.entry_point.kind
    );

    Ok(quote! {
        #[doc = #kind_doc]
        pub fn #entry(#(#inputs),*) -> ::core::result::Result<Self, #runtime::ContractViolation> {
            let __flow = #runtime::Construction::begin(#type_name);
            #(#filled)*
            #(#normalized)*
            let __flow = __flow.validate();
            #(#validations)*
            #(#derivations)*
            let __instance = Self {
                #(#field_names,)*
                #(#state_names: ::core::default::Default::default(),)*
            };
            if let ::core::result::Result::Err(violation) = __instance.check_postconditions() {
                return __flow.reject(violation);
            }
            if let ::core::result::Result::Err(violation) = __instance.check_invariants() {
                return __flow.reject(violation);
            }
            __flow.commit(__instance)
        }
    })
}

/// The checks of one contract set against `__value`.
fn contract_checks(ctx: &Context<'_>, contracts: &ContractSet, printable: bool) -> TokenStream {
    let value = quote!(__value);
    let checks = contracts.iter().map(|contract| {
        let condition = &contract.condition;
        let violation = contract.violation(
            &ctx.runtime,
            ctx.type_name(),
            printable.then_some(&value),
        );
        quote! {
            if !(#condition) {
                return ::core::result::Result::Err(#violation);
            }
        }
    });
    quote!(#(#checks)*)
}

/// Binds `__value` to the checked value, skipping absent optional values.
fn bind_value(field: &FieldInfo, ty: &syn::Type, source: TokenStream, body: TokenStream) -> TokenStream {
    if field.nullable && inner_type(ty).is_some() {
        quote! {
            if let ::core::option::Option::Some(__value) = (#source).as_ref() {
                #body
            }
        }
    } else {
        quote! {
            {
                let __value = #source;
                #body
            }
        }
    }
}

/// One private `validate_<field>` per constrained stored field.
fn generate_validators(ctx: &Context<'_>) -> TokenStream {
    let runtime = &ctx.runtime;
    let validators = ctx
        .info
        .fields
        .iter()
        .enumerate()
        .filter(|(index, _)| has_checks(ctx, *index))
        .map(|(index, field)| {
            let contracts = &ctx.contracts.fields[index];
            let ty = ctx.field_type(index);
            let printable = !ctx.generics.mentions(ty);
            let aggregate = contracts.aggregate_condition();
            let checks = contract_checks(ctx, contracts, printable);
            let fast_path = quote! {
                if #aggregate {
                    return ::core::result::Result::Ok(());
                }
                #checks
            };
            let body = bind_value(field, ty, quote!(value), fast_path);
            let validator = validator_ident(field);
            quote! {
                fn #validator(value: &#ty) -> ::core::result::Result<(), #runtime::ContractViolation> {
                    #body
                    ::core::result::Result::Ok(())
                }
            }
        });
    quote!(#(#validators)*)
}

/// `check_postconditions` and `check_invariants`, run on the assembled
/// instance.
fn generate_checks(ctx: &Context<'_>) -> TokenStream {
    let runtime = &ctx.runtime;
    let derived = ctx
        .info
        .fields
        .iter()
        .enumerate()
        .filter(|(index, field)| field.is_derived() && !ctx.contracts.fields[*index].is_empty())
        .map(|(index, field)| {
            let ty = ctx.field_type(index);
            let name = ident(&field.name);
            let checks = contract_checks(ctx, &ctx.contracts.fields[index], !ctx.generics.mentions(ty));
            bind_value(field, ty, quote!(&self.#name), checks)
        });
    let ensures = contract_checks(ctx, &ctx.contracts.postconditions, false);
    let invariants = contract_checks(ctx, &ctx.contracts.invariants, false);

    quote! {
        fn check_postconditions(&self) -> ::core::result::Result<(), #runtime::ContractViolation> {
            #(#derived)*
            #ensures
            ::core::result::Result::Ok(())
        }

        fn check_invariants(&self) -> ::core::result::Result<(), #runtime::ContractViolation> {
            #invariants
            ::core::result::Result::Ok(())
        }
    }
}

fn generate_getters(ctx: &Context<'_>) -> TokenStream {
    let getters = ctx.info.fields.iter().enumerate().map(|(index, field)| {
        let name = ident(&field.name);
        let ty = ctx.field_type(index);
        let docs = if field.docs.is_empty() {
            let line = format!(" The `{}` field.", field.name);
            quote!(#[doc = #line])
        } else {
            doc_attrs(&field.docs)
        };
        quote! {
            #docs
            pub fn #name(&self) -> &#ty {
                &self.#name
            }
        }
    });
    quote!(#(#getters)*)
}

/// `set_<field>` for every stored, non-property field of a mutable type.
///
/// A setter normalizes and validates the new value, stores it, re-derives
/// every derived field and re-checks the instance; on failure the previous
/// values are restored.
fn generate_setters(
    ctx: &Context<'_>,
    states: &[InterceptorState],
) -> Result<TokenStream, GeneratorError> {
    let info = ctx.info;
    if !info.mutable {
        return Ok(TokenStream::new());
    }
    let runtime = &ctx.runtime;

    let mut rederive = Vec::new();
    let mut restore = Vec::new();
    for (index, field) in info.fields.iter().enumerate() {
        let Some(source) = &field.derivation_expression else {
            continue;
        };
        let name = ident(&field.name);
        let next = format_ident!("__next_{}", field.name);
        let previous = format_ident!("__previous_{}", field.name);
        let value = derive_value(ctx, index, source, |name| quote!(&self.#name))?;
        rederive.push(quote! {
            let #next = #value;
            let #previous = ::core::mem::replace(&mut self.#name, #next);
        });
        restore.push(quote!(self.#name = #previous;));
    }
    let reset_states = states.iter().map(|state| {
        let field = &state.field;
        quote!(self.#field = ::core::default::Default::default();)
    });
    let reset_states = quote!(#(#reset_states)*);

    let mut setters = Vec::new();
    for (index, field) in info.fields.iter().enumerate() {
        if field.is_derived() || field.property {
            continue;
        }
        let name = ident(&field.name);
        let setter = format_ident!("set_{}", field.name);
        let ty = ctx.field_type(index);
        let normalized = normalize(field)?;
        let validation = if has_checks(ctx, index) {
            let validator = validator_ident(field);
            quote!(Self::#validator(&#name)?;)
        } else {
            TokenStream::new()
        };
        let doc = format!(" Replaces `{}`, re-deriving dependent fields.", field.name);
        setters.push(quote! {
            #[doc = #doc]
            pub fn #setter(
                &mut self,
                #name: impl ::core::convert::Into<#ty>,
            ) -> ::core::result::Result<(), #runtime::ContractViolation> {
                let #name: #ty = #name.into();
                #normalized
                #validation
                let __previous = ::core::mem::replace(&mut self.#name, #name);
                #(#rederive)*
                let __checked = self
                    .check_postconditions()
                    .and_then(|()| self.check_invariants());
                if let ::core::result::Result::Err(violation) = __checked {
                    self.#name = __previous;
                    #(#restore)*
                    return ::core::result::Result::Err(violation);
                }
                #reset_states
                ::core::result::Result::Ok(())
            }
        });
    }
    Ok(quote!(#(#setters)*))
}

/// Carried methods; intercepted ones are split into the public wrapper and
/// a private `<name>_uncached` holding the declared body.
fn generate_methods(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let mut methods = Vec::new();
    for method in &ctx.info.methods {
        let item: syn::ImplItemFn = syn::parse_str(&method.source).map_err(|e| {
            GeneratorError::CodeGenError(format!(
                "cannot re-read method `{}::{}`: {}",
                ctx.type_name(),
                method.name,
                e
            ))
        })?;
        if !method.is_intercepted() {
            methods.push(quote!(#item));
            continue;
        }

        let uncached_name = format_ident!("{}_uncached", method.name);
        let mut uncached = item.clone();
        uncached.sig.ident = uncached_name.clone();
        uncached.vis = syn::Visibility::Inherited;
        uncached.attrs.retain(|attr| !attr.path().is_ident("doc"));

        let mut wrapper = item;
        for (input, param) in wrapper
            .sig
            .inputs
            .iter_mut()
            .filter_map(|input| match input {
                syn::FnArg::Typed(typed) => Some(typed),
                syn::FnArg::Receiver(_) => None,
            })
            .zip(&method.parameters)
        {
            let name = ident(&param.name);
            *input.pat = syn::parse_quote!(#name);
        }
        let args = method.parameters.iter().map(|param| ident(&param.name));
        let mut call = quote!(self.#uncached_name(#(#args),*));

        let interception = interception(ctx, method);
        let strategies: Vec<_> = ctx.interceptors.strategies_for(method).collect();
        for strategy in strategies.into_iter().rev() {
            call = strategy.wrap(&interception, call);
        }
        wrapper.block = syn::parse_quote!({ #call });

        methods.push(quote! {
            #wrapper
            #uncached
        });
    }
    Ok(quote!(#(#methods)*))
}

/// Structural equality over the stored fields, and hashing when no field
/// involves floats. Derived and helper fields take no part in either.
fn generate_equality(ctx: &Context<'_>) -> TokenStream {
    let info = ctx.info;
    let runtime = &ctx.runtime;
    let params = ctx.generics.params();
    let self_type = ctx.implementation_type();

    let stored: Vec<(syn::Ident, &syn::Type)> = info
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.is_derived() && !field.helper)
        .map(|(index, field)| (ident(&field.name), ctx.field_type(index)))
        .collect();
    let stored_types: Vec<&syn::Type> = stored.iter().map(|(_, ty)| *ty).collect();
    let names: Vec<&syn::Ident> = stored.iter().map(|(name, _)| name).collect();

    let comparison = if names.is_empty() {
        quote!(true)
    } else {
        quote!(#(self.#names == other.#names)&&*)
    };
    let eq_where = ctx.generics.where_with(
        ctx.generics
            .bounded(stored_types.iter().copied(), &quote!(::core::cmp::PartialEq)),
    );
    let partial_eq = quote! {
        impl #params ::core::cmp::PartialEq for #self_type #eq_where {
            fn eq(&self, other: &Self) -> bool {
                #comparison
            }
        }
    };

    if stored_types.iter().any(|ty| mentions_float(ty)) {
        return partial_eq;
    }

    let full_eq_where = ctx.generics.where_with(
        ctx.generics
            .bounded(stored_types.iter().copied(), &quote!(::core::cmp::Eq)),
    );
    let hash_where = ctx.generics.where_with(
        ctx.generics
            .bounded(stored_types.iter().copied(), &quote!(::core::hash::Hash)),
    );
    let folds = names.iter().map(|name| {
        quote!(__hash = #runtime::hash::combine(__hash, #runtime::hash::hash_of(&self.#name));)
    });
    let mutability = if names.is_empty() { quote!() } else { quote!(mut) };

    quote! {
        #partial_eq

        impl #params ::core::cmp::Eq for #self_type #full_eq_where {}

        impl #params #self_type #hash_where {
            /// Folds the stored fields with seed 17 and multiplier 31.
            pub fn hash_code(&self) -> u64 {
                let #mutability __hash = #runtime::hash::HASH_SEED;
                #(#folds)*
                __hash
            }
        }

        impl #params ::core::hash::Hash for #self_type #hash_where {
            fn hash<__H: ::core::hash::Hasher>(&self, state: &mut __H) {
                state.write_u64(self.hash_code());
            }
        }
    }
}

/// `Name(field: value, ...)` with every field in field order.
fn generate_display(ctx: &Context<'_>) -> TokenStream {
    let info = ctx.info;
    let params = ctx.generics.params();
    let self_type = ctx.implementation_type();
    let template = format!(
        "{}({})",
        info.name,
        info.fields
            .iter()
            .map(|field| format!("{}: {{:?}}", field.name))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let names = info.fields.iter().map(|field| ident(&field.name));
    let display_where = ctx.generics.where_with(
        ctx.generics
            .bounded(ctx.field_types.iter(), &quote!(::core::fmt::Debug)),
    );

    quote! {
        impl #params ::core::fmt::Display for #self_type #display_where {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::write!(f, #template, #(self.#names),*)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        DICE, DOUBLED, GENERIC_TAGGED, MEASUREMENT, PAIR, TEAM, context_parts, has, squash,
    };

    fn render(source: &str) -> String {
        let (info, config, registry, interceptors) = context_parts(source);
        let ctx = Context::new(&info, &config, &registry, &interceptors).unwrap();
        squash(&generate_implementation(&ctx).unwrap().to_string())
    }

    #[test]
    fn pair_implementation_has_struct_alias_and_entry_point() {
        let code = render(PAIR);
        assert!(has(&code, "pub struct PairSubclass {"));
        assert!(has(&code, "pub type Pair = PairSubclass;"));
        assert!(has(&code, "pub fn new(first: String, second: String)"));
        assert!(has(&code, "::stencil_runtime::Construction::begin(\"Pair\")"));
        assert!(has(&code, "pub fn first(&self) -> &String"));
        assert!(has(&code, "impl ::core::fmt::Display for PairSubclass"));
        assert!(has(&code, "\"Pair(first: {:?}, second: {:?})\""));
    }

    #[test]
    fn pair_gets_eq_hash_and_hash_code() {
        let code = render(PAIR);
        assert!(has(&code, "impl ::core::cmp::Eq for PairSubclass {}"));
        assert!(has(&code, "pub fn hash_code(&self) -> u64"));
        assert!(has(&code, "::stencil_runtime::hash::HASH_SEED"));
        assert!(has(&code, "self.first == other.first && self.second == other.second"));
    }

    #[test]
    fn helper_fields_are_left_out_of_equality_and_hashing() {
        let code = render(TEAM);
        assert!(has(&code, "self.name == other.name && self.members == other.members"));
        assert!(!has(&code, "self.audited == other.audited"));
        assert!(!has(&code, "hash_of(&self.audited)"));
        // Still stored and readable.
        assert!(has(&code, "pub fn audited(&self)"));
    }

    #[test]
    fn float_fields_withhold_eq_and_hash() {
        let code = render(MEASUREMENT);
        assert!(has(&code, "impl ::core::cmp::PartialEq for MeasurementSubclass"));
        assert!(!has(&code, "::core::cmp::Eq for"));
        assert!(!has(&code, "hash_code"));
    }

    #[test]
    fn derived_fields_are_computed_from_borrowed_earlier_fields() {
        let code = render(DOUBLED);
        assert!(has(&code, "let double: i64 = {"));
        assert!(has(&code, "let value = &value;"));
        assert!(has(&code, "pub fn set_value("));
        assert!(!has(&code, "pub fn set_double("));
        // Derived fields take no part in equality.
        assert!(has(&code, "self.value == other.value"));
        assert!(!has(&code, "self.double == other.double"));
    }

    #[test]
    fn validators_have_a_fast_path_and_ordered_checks() {
        let code = render(DOUBLED);
        assert!(has(&code, "fn validate_value(value: &i64)"));
        let fast = code.find(&squash("return ::core::result::Result::Ok(());")).unwrap();
        let positive = code.find(&squash("`value` must be positive")).unwrap();
        let less = code.find(&squash("`value` must be less than 1000")).unwrap();
        assert!(fast < positive && positive < less);
    }

    #[test]
    fn cached_methods_get_a_cache_field_and_an_uncached_body() {
        let code = render(DICE);
        assert!(has(&code, "__roll_cache: ::stencil_runtime::MemoCache<(u64,), u64>"));
        assert!(has(&code, "fn roll_uncached(&self, nonce: u64) -> u64"));
        assert!(has(&code, "pub fn roll(&self, nonce: u64) -> u64"));
        assert!(has(&code, "::stencil_runtime::logged("));
    }

    #[test]
    fn generic_types_keep_their_parameters() {
        let code = render(GENERIC_TAGGED);
        assert!(has(&code, "pub struct TaggedSubclass<T: Clone + PartialOrd>"));
        assert!(has(&code, "pub type Tagged<T> = TaggedSubclass<T>;"));
        assert!(has(
            &code,
            "impl<T: Clone + PartialOrd> ::core::cmp::PartialEq for TaggedSubclass<T>"
        ));
        assert!(has(&code, "T: ::core::cmp::PartialEq"));
    }
}
