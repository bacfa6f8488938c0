//! The tag registry.
//!
//! Every recognized tag has one [`TagSpec`] in a static table: where it may
//! appear, which value categories it accepts, the shape of its arguments and,
//! for value constraints, the factory that turns it into a contract
//! fragment. The extractor parses and checks tags through the registry
//! before any contract is generated.

use std::collections::BTreeMap;

use quote::ToTokens;
use stencil_define::{DeclarationKind, SourceLocation, TagArguments, TagKind, TagUse, ValueCategory};

use crate::contract::{self, FragmentFactory};
use crate::errors::UsageError;

/// Flags accepted by `#[synth(..)]`.
pub const SYNTH_FLAGS: &[&str] = &["builder", "implementation", "converter", "mutable"];

/// The argument form a tag expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentShape {
    /// `#[tag]`
    Marker,
    /// `#[tag(expr)]`
    Expression,
    /// `#[tag(-3)]`, `#[tag(0.5)]`
    Number,
    /// `#[tag(n)]` with a signed integer
    Integer,
    /// `#[tag(n)]` with a non-negative integer
    Count,
    /// `#[tag(min = a, max = b)]`
    Range,
    /// `#[tag]` or `#[tag(a, b)]` with identifiers from a fixed list
    Flags(&'static [&'static str]),
}

/// The value categories a tag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRule {
    Any,
    Numeric,
    /// Text or collections
    Length,
    Collection,
}

impl CategoryRule {
    pub fn admits(self, category: ValueCategory) -> bool {
        match self {
            CategoryRule::Any => true,
            CategoryRule::Numeric => category.is_numeric(),
            CategoryRule::Length => category.has_length(),
            CategoryRule::Collection => category == ValueCategory::Collection,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            CategoryRule::Any => "any value",
            CategoryRule::Numeric => "a numeric value",
            CategoryRule::Length => "text or a collection",
            CategoryRule::Collection => "a collection",
        }
    }
}

/// Registry entry for one tag.
#[derive(Debug, Clone, Copy)]
pub struct TagSpec {
    pub kind: TagKind,
    pub targets: &'static [DeclarationKind],
    pub categories: CategoryRule,
    pub shape: ArgumentShape,
    pub fragment: Option<FragmentFactory>,
}

const TYPE: &[DeclarationKind] = &[DeclarationKind::Type];
const FIELD: &[DeclarationKind] = &[DeclarationKind::Field];
const METHOD: &[DeclarationKind] = &[DeclarationKind::Method];
const VALUE: &[DeclarationKind] = &[DeclarationKind::Field, DeclarationKind::Parameter];
const TYPE_OR_FIELD: &[DeclarationKind] = &[DeclarationKind::Type, DeclarationKind::Field];

const fn tag_spec(
    kind: TagKind,
    targets: &'static [DeclarationKind],
    categories: CategoryRule,
    shape: ArgumentShape,
    fragment: Option<FragmentFactory>,
) -> TagSpec {
    TagSpec {
        kind,
        targets,
        categories,
        shape,
        fragment,
    }
}

use ArgumentShape as A;
use CategoryRule as C;

static STANDARD_TAGS: [TagSpec; 25] = [
    tag_spec(TagKind::Synth, TYPE, C::Any, A::Flags(SYNTH_FLAGS), None),
    tag_spec(TagKind::Reconstruct, METHOD, C::Any, A::Marker, None),
    tag_spec(TagKind::Factory, METHOD, C::Any, A::Marker, None),
    tag_spec(TagKind::Default, FIELD, C::Any, A::Expression, None),
    tag_spec(TagKind::Derived, FIELD, C::Any, A::Expression, None),
    tag_spec(TagKind::Normalize, FIELD, C::Any, A::Expression, None),
    tag_spec(TagKind::Order, FIELD, C::Any, A::Integer, None),
    tag_spec(TagKind::Helper, FIELD, C::Any, A::Marker, None),
    tag_spec(TagKind::Property, FIELD, C::Any, A::Marker, None),
    tag_spec(TagKind::Positive, VALUE, C::Numeric, A::Marker, Some(contract::positive)),
    tag_spec(TagKind::Negative, VALUE, C::Numeric, A::Marker, Some(contract::negative)),
    tag_spec(TagKind::GreaterThan, VALUE, C::Numeric, A::Number, Some(contract::greater_than)),
    tag_spec(TagKind::LessThan, VALUE, C::Numeric, A::Number, Some(contract::less_than)),
    tag_spec(TagKind::MultipleOf, VALUE, C::Numeric, A::Number, Some(contract::multiple_of)),
    tag_spec(TagKind::Size, VALUE, C::Length, A::Range, Some(contract::size)),
    tag_spec(TagKind::NotEmpty, VALUE, C::Length, A::Marker, Some(contract::not_empty)),
    tag_spec(TagKind::Ascending, VALUE, C::Collection, A::Marker, Some(contract::ascending)),
    tag_spec(
        TagKind::StrictlyAscending,
        VALUE,
        C::Collection,
        A::Marker,
        Some(contract::strictly_ascending),
    ),
    tag_spec(TagKind::Descending, VALUE, C::Collection, A::Marker, Some(contract::descending)),
    tag_spec(
        TagKind::StrictlyDescending,
        VALUE,
        C::Collection,
        A::Marker,
        Some(contract::strictly_descending),
    ),
    tag_spec(TagKind::Bounded, FIELD, C::Collection, A::Count, Some(contract::bounded)),
    tag_spec(TagKind::Invariant, TYPE_OR_FIELD, C::Any, A::Expression, Some(contract::invariant)),
    tag_spec(TagKind::Ensures, TYPE, C::Any, A::Expression, None),
    tag_spec(TagKind::Cached, METHOD, C::Any, A::Marker, None),
    tag_spec(TagKind::Logged, METHOD, C::Any, A::Marker, None),
];

/// The element a tag is attached to, as far as legality is concerned.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    pub name: &'a str,
    pub kind: DeclarationKind,
    /// `None` for types and methods.
    pub category: Option<ValueCategory>,
}

impl<'a> Element<'a> {
    pub fn new(name: &'a str, kind: DeclarationKind, category: Option<ValueCategory>) -> Self {
        Self {
            name,
            kind,
            category,
        }
    }
}

/// Lookup table from tag identity to its spec.
///
/// ## Examples
///
/// ```
/// use stencil_define::{DeclarationKind, TagKind};
/// use stencil_gen::registry::TagRegistry;
///
/// let registry = TagRegistry::standard();
/// let spec = registry.spec(TagKind::Bounded).unwrap();
/// assert!(spec.targets.contains(&DeclarationKind::Field));
/// assert!(spec.fragment.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TagRegistry {
    specs: BTreeMap<TagKind, TagSpec>,
}

impl TagRegistry {
    /// The registry holding every built-in tag.
    pub fn standard() -> Self {
        Self {
            specs: STANDARD_TAGS.iter().map(|spec| (spec.kind, *spec)).collect(),
        }
    }

    pub fn spec(&self, kind: TagKind) -> Option<&TagSpec> {
        self.specs.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The registered tag named by an attribute, or `None` for attributes
    /// the engine passes through.
    pub fn recognize(&self, attr: &syn::Attribute) -> Option<&TagSpec> {
        let name = attr.path().get_ident()?.to_string();
        TagKind::from_attribute(&name).and_then(|kind| self.spec(kind))
    }

    /// Parses a recognized attribute into a tag occurrence and checks that it
    /// may be attached to `element`.
    ///
    /// Returns `Ok(None)` for attributes that are not engine tags.
    pub fn parse(
        &self,
        attr: &syn::Attribute,
        element: &Element<'_>,
        location: SourceLocation,
    ) -> Result<Option<TagUse>, UsageError> {
        let Some(spec) = self.recognize(attr) else {
            return Ok(None);
        };
        let arguments = parse_arguments(spec, attr).map_err(|reason| {
            UsageError::MalformedArguments {
                tag: spec.kind,
                element: element.name.to_string(),
                reason,
            }
        })?;
        let tag = TagUse::new(spec.kind, arguments, location);
        self.check_usage(element, &tag)?;
        Ok(Some(tag))
    }

    /// Fails when the tag may not target the element's declaration kind or
    /// value category.
    pub fn check_usage(&self, element: &Element<'_>, tag: &TagUse) -> Result<(), UsageError> {
        let Some(spec) = self.spec(tag.kind) else {
            return Err(UsageError::IllegalTarget {
                tag: tag.kind,
                kind: element.kind,
                element: element.name.to_string(),
            });
        };
        if !spec.targets.contains(&element.kind) {
            return Err(UsageError::IllegalTarget {
                tag: tag.kind,
                kind: element.kind,
                element: element.name.to_string(),
            });
        }
        if let Some(category) = element.category
            && !spec.categories.admits(category)
        {
            return Err(UsageError::IllegalCategory {
                tag: tag.kind,
                element: element.name.to_string(),
                category,
                expected: spec.categories.describe(),
            });
        }
        if spec.shape == ArgumentShape::Number
            && element.category == Some(ValueCategory::Integer)
            && let TagArguments::Number { literal } = &tag.arguments
            && literal.parse::<i128>().is_err()
        {
            return Err(UsageError::MalformedArguments {
                tag: tag.kind,
                element: element.name.to_string(),
                reason: format!("expected an integer bound for an integer value, found `{}`", literal),
            });
        }
        Ok(())
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn parse_arguments(spec: &TagSpec, attr: &syn::Attribute) -> Result<TagArguments, String> {
    match spec.shape {
        ArgumentShape::Marker => match &attr.meta {
            syn::Meta::Path(_) => Ok(TagArguments::None),
            _ => Err("this tag takes no arguments".to_string()),
        },
        ArgumentShape::Expression => {
            let expr: syn::Expr = attr.parse_args().map_err(|e| e.to_string())?;
            Ok(TagArguments::Expression {
                source: expr.to_token_stream().to_string(),
            })
        }
        ArgumentShape::Number => {
            let expr: syn::Expr = attr.parse_args().map_err(|e| e.to_string())?;
            let literal = numeric_literal(&expr)?;
            if spec.kind == TagKind::MultipleOf && literal.trim_start_matches(['0', '.']).is_empty()
            {
                return Err("the step must not be zero".to_string());
            }
            Ok(TagArguments::Number { literal })
        }
        ArgumentShape::Integer => {
            let expr: syn::Expr = attr.parse_args().map_err(|e| e.to_string())?;
            let literal = numeric_literal(&expr)?;
            literal
                .parse::<i64>()
                .map_err(|_| format!("expected an integer, found `{}`", literal))?;
            Ok(TagArguments::Number { literal })
        }
        ArgumentShape::Count => {
            let lit: syn::LitInt = attr.parse_args().map_err(|e| e.to_string())?;
            let count: usize = lit.base10_parse().map_err(|e| e.to_string())?;
            Ok(TagArguments::Number {
                literal: count.to_string(),
            })
        }
        ArgumentShape::Range => {
            let mut min = None;
            let mut max = None;
            attr.parse_nested_meta(|meta| {
                let slot = if meta.path.is_ident("min") {
                    &mut min
                } else if meta.path.is_ident("max") {
                    &mut max
                } else {
                    return Err(meta.error("expected `min` or `max`"));
                };
                let value: syn::LitInt = meta.value()?.parse()?;
                *slot = Some(value.base10_parse::<u64>()?);
                Ok(())
            })
            .map_err(|e| e.to_string())?;
            match (min, max) {
                (None, None) => Err("expected `min`, `max` or both".to_string()),
                (Some(lo), Some(hi)) if lo > hi => {
                    Err(format!("`min` ({}) is greater than `max` ({})", lo, hi))
                }
                _ => Ok(TagArguments::Range { min, max }),
            }
        }
        ArgumentShape::Flags(allowed) => {
            if let syn::Meta::Path(_) = attr.meta {
                return Ok(TagArguments::Flags { flags: Vec::new() });
            }
            let mut flags = Vec::new();
            attr.parse_nested_meta(|meta| {
                let Some(ident) = meta.path.get_ident() else {
                    return Err(meta.error("expected a flag name"));
                };
                let flag = ident.to_string();
                if !allowed.contains(&flag.as_str()) {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown flag `{}`; expected one of: {}", flag, allowed.join(", ")),
                    ));
                }
                flags.push(flag);
                Ok(())
            })
            .map_err(|e| e.to_string())?;
            Ok(TagArguments::Flags { flags })
        }
    }
}

/// Accepts `3`, `0.5`, `-3` and `-0.5`.
fn numeric_literal(expr: &syn::Expr) -> Result<String, String> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(lit),
            ..
        }) => Ok(lit.base10_digits().to_string()),
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Float(lit),
            ..
        }) => Ok(lit.base10_digits().to_string()),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => numeric_literal(expr).and_then(|inner| {
            if inner.starts_with('-') {
                Err("expected a numeric literal".to_string())
            } else {
                Ok(format!("-{}", inner))
            }
        }),
        other => Err(format!(
            "expected a numeric literal, found `{}`",
            other.to_token_stream()
        )),
    }
}
