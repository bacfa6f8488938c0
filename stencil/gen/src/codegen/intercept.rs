//! Interceptor strategies for `#[cached]` and `#[logged]` methods.
//!
//! An intercepted method `m` is emitted as two functions: a private
//! `m_uncached` holding the declared body, and the public `m` whose body is
//! the uncached call wrapped by each interceptor in turn. The first tag on
//! the method ends up outermost.

use std::collections::BTreeMap;
use std::fmt;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use stencil_define::{MethodInfo, Receiver, TagKind, TypeInformation};

use crate::errors::{GeneratorError, SynthesisError, UsageError};
use crate::syntax::parse_type;

/// Per-instance state an interceptor adds to the implementation struct.
#[derive(Debug, Clone)]
pub struct InterceptorState {
    pub field: syn::Ident,
    pub ty: TokenStream,
}

/// What the implementation synthesizer needs to know about one method.
#[derive(Debug, Clone, Copy)]
pub struct Interception<'a> {
    pub type_name: &'a str,
    pub method: &'a MethodInfo,
    pub runtime: &'a TokenStream,
}

impl Interception<'_> {
    /// The argument tuple used as a cache key, cloned from the parameters.
    fn key(&self) -> TokenStream {
        let args = self
            .method
            .parameters
            .iter()
            .map(|param| format_ident!("{}", param.name));
        quote!((#(::core::clone::Clone::clone(&#args),)*))
    }

    fn key_type(&self) -> Result<TokenStream, GeneratorError> {
        let types = self
            .method
            .parameters
            .iter()
            .map(|param| parse_type(&param.declared_type))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(quote!((#(#types,)*)))
    }
}

/// How one interceptor tag changes a method.
pub trait InterceptorStrategy: Send + Sync {
    fn tag(&self) -> TagKind;

    /// Rejects methods the strategy cannot wrap, with the reason.
    fn validate(&self, method: &MethodInfo) -> Result<(), String>;

    /// Extra field on the implementation struct, if the strategy keeps state.
    fn state(&self, call: &Interception<'_>) -> Result<Option<InterceptorState>, GeneratorError>;

    /// Wraps `inner`, an expression evaluating the method.
    fn wrap(&self, call: &Interception<'_>, inner: TokenStream) -> TokenStream;
}

/// Memoizes results per instance, keyed by the argument tuple.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedStrategy;

impl CachedStrategy {
    fn cache_field(method: &MethodInfo) -> syn::Ident {
        format_ident!("__{}_cache", method.name)
    }
}

impl InterceptorStrategy for CachedStrategy {
    fn tag(&self) -> TagKind {
        TagKind::Cached
    }

    fn validate(&self, method: &MethodInfo) -> Result<(), String> {
        if method.receiver != Receiver::Shared {
            return Err("cached methods must take `&self`".to_string());
        }
        if method.output.is_none() {
            return Err("cached methods must return a value".to_string());
        }
        if method.generic {
            return Err("cached methods cannot declare generic parameters".to_string());
        }
        let borrowed = |ty: &str| ty.starts_with('&') || ty.starts_with("impl ");
        if let Some(param) = method
            .parameters
            .iter()
            .find(|param| borrowed(&param.declared_type))
        {
            return Err(format!(
                "argument `{}` must be an owned, nameable type to serve as a cache key",
                param.name
            ));
        }
        Ok(())
    }

    fn state(&self, call: &Interception<'_>) -> Result<Option<InterceptorState>, GeneratorError> {
        let runtime = call.runtime;
        let key = call.key_type()?;
        let output = match &call.method.output {
            Some(output) => parse_type(output)?,
            None => syn::parse_quote!(()),
        };
        Ok(Some(InterceptorState {
            field: Self::cache_field(call.method),
            ty: quote!(#runtime::MemoCache<#key, #output>),
        }))
    }

    fn wrap(&self, call: &Interception<'_>, inner: TokenStream) -> TokenStream {
        let field = Self::cache_field(call.method);
        let key = call.key();
        quote!(self.#field.get_or_compute(#key, || #inner))
    }
}

/// Emits a debug span around each call and logs its completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggedStrategy;

impl InterceptorStrategy for LoggedStrategy {
    fn tag(&self) -> TagKind {
        TagKind::Logged
    }

    fn validate(&self, _method: &MethodInfo) -> Result<(), String> {
        Ok(())
    }

    fn state(&self, _call: &Interception<'_>) -> Result<Option<InterceptorState>, GeneratorError> {
        Ok(None)
    }

    fn wrap(&self, call: &Interception<'_>, inner: TokenStream) -> TokenStream {
        let runtime = call.runtime;
        let type_name = call.type_name;
        let method = &call.method.name;
        quote!(#runtime::logged(#type_name, #method, || #inner))
    }
}

/// Interceptor strategies keyed by their tag.
pub struct InterceptorRegistry {
    strategies: BTreeMap<TagKind, Box<dyn InterceptorStrategy>>,
}

impl InterceptorRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// `#[cached]` and `#[logged]`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(CachedStrategy));
        registry.register(Box::new(LoggedStrategy));
        registry
    }

    /// Adds a strategy, replacing any strategy for the same tag.
    pub fn register(&mut self, strategy: Box<dyn InterceptorStrategy>) {
        self.strategies.insert(strategy.tag(), strategy);
    }

    pub fn get(&self, tag: TagKind) -> Option<&dyn InterceptorStrategy> {
        self.strategies.get(&tag).map(|strategy| strategy.as_ref())
    }

    /// Checks every intercepted method of a type against its strategies.
    pub fn validate(&self, info: &TypeInformation) -> Result<(), SynthesisError> {
        for method in &info.methods {
            for &tag in &method.interceptors {
                let outcome = match self.get(tag) {
                    Some(strategy) => strategy.validate(method),
                    None => Err("no interceptor strategy is registered for this tag".to_string()),
                };
                if let Err(reason) = outcome {
                    return Err(SynthesisError::usage(
                        UsageError::InterceptorMisuse {
                            tag,
                            method: method.name.clone(),
                            reason,
                        },
                        method.location.clone(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The strategies of a method, outermost first.
    pub fn strategies_for<'s>(
        &'s self,
        method: &MethodInfo,
    ) -> impl Iterator<Item = &'s dyn InterceptorStrategy> + 's {
        let tags = method.interceptors.clone();
        tags.into_iter().filter_map(move |tag| self.get(tag))
    }
}

impl Default for InterceptorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("tags", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}
