//! Small helpers over `syn` types and token streams.

use proc_macro2::{TokenStream, TokenTree};
use quote::{ToTokens, format_ident};
use stencil_define::ValueCategory;

use crate::errors::GeneratorError;

const INTEGERS: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];
const FLOATS: &[&str] = &["f32", "f64"];
const TEXT: &[&str] = &["String", "str"];
const COLLECTIONS: &[&str] = &[
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "BinaryHeap",
];

pub fn parse_type(source: &str) -> Result<syn::Type, GeneratorError> {
    syn::parse_str(source)
        .map_err(|e| GeneratorError::CodeGenError(format!("invalid type `{}`: {}", source, e)))
}

pub fn parse_expr(source: &str) -> Result<syn::Expr, GeneratorError> {
    syn::parse_str(source).map_err(|e| {
        GeneratorError::CodeGenError(format!("invalid expression `{}`: {}", source, e))
    })
}

pub fn ident(name: &str) -> syn::Ident {
    format_ident!("{}", name)
}

/// Source text of any syntax node.
pub fn source_of<T: ToTokens>(node: &T) -> String {
    node.to_token_stream().to_string()
}

/// The last path segment of a type, e.g. `Vec` for `std::vec::Vec<u8>`.
pub fn outer_name(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        syn::Type::Paren(inner) => outer_name(&inner.elem),
        syn::Type::Group(inner) => outer_name(&inner.elem),
        _ => None,
    }
}

/// The single generic argument of `Outer<T>`, when `ty` is named `outer`.
fn single_argument<'a>(ty: &'a syn::Type, outer: &[&str]) -> Option<&'a syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if !outer.iter().any(|name| segment.ident == *name) {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    match (types.next(), types.next()) {
        (Some(ty), None) => Some(ty),
        _ => None,
    }
}

/// `T` for `Option<T>`.
pub fn inner_type(ty: &syn::Type) -> Option<&syn::Type> {
    single_argument(ty, &["Option"])
}

/// `T` for `Vec<T>`; the converter gathers these through collectors.
pub fn vec_element(ty: &syn::Type) -> Option<&syn::Type> {
    single_argument(ty, &["Vec"])
}

/// Classifies a declared type; `Option<T>` is classified by `T`.
pub fn categorize(ty: &syn::Type) -> ValueCategory {
    if let Some(inner) = inner_type(ty) {
        return categorize(inner);
    }
    if let Some(inner) = single_argument(ty, &["Box"]) {
        return categorize(inner);
    }
    match ty {
        syn::Type::Array(_) | syn::Type::Slice(_) => ValueCategory::Collection,
        syn::Type::Reference(reference) => categorize(&reference.elem),
        syn::Type::Paren(inner) => categorize(&inner.elem),
        syn::Type::Group(inner) => categorize(&inner.elem),
        _ => match outer_name(ty).as_deref() {
            Some(name) if INTEGERS.contains(&name) => ValueCategory::Integer,
            Some(name) if FLOATS.contains(&name) => ValueCategory::Float,
            Some(name) if TEXT.contains(&name) => ValueCategory::Text,
            Some(name) if COLLECTIONS.contains(&name) => ValueCategory::Collection,
            Some("bool") => ValueCategory::Boolean,
            _ => ValueCategory::Other,
        },
    }
}

/// Every identifier in a token stream, in order, skipping the ones that
/// follow a `.` (field accesses and method names).
pub fn free_idents(tokens: TokenStream) -> Vec<String> {
    let mut idents = Vec::new();
    collect_idents(tokens, &mut idents);
    idents
}

fn collect_idents(tokens: TokenStream, out: &mut Vec<String>) {
    let mut after_dot = false;
    for token in tokens {
        match token {
            TokenTree::Ident(ident) => {
                if !after_dot {
                    out.push(ident.to_string());
                }
                after_dot = false;
            }
            TokenTree::Punct(punct) => after_dot = punct.as_char() == '.',
            TokenTree::Group(group) => {
                collect_idents(group.stream(), out);
                after_dot = false;
            }
            TokenTree::Literal(_) => after_dot = false,
        }
    }
}

/// Returns true if any of `names` appears as an identifier inside `ty`.
pub fn mentions_any(ty: &syn::Type, names: &[&str]) -> bool {
    free_idents(ty.to_token_stream())
        .iter()
        .any(|ident| names.contains(&ident.as_str()))
}

/// Returns true if the type involves `f32` or `f64` anywhere.
pub fn mentions_float(ty: &syn::Type) -> bool {
    mentions_any(ty, FLOATS)
}
