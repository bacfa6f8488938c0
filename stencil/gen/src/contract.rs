//! Contract generation.
//!
//! Every value-constraint tag on a field yields one [`Contract`]: a boolean
//! condition over the bound value `__value: &T`, a human-readable rendering
//! of the condition, and the violation message. The contracts of one field
//! form a [`ContractSet`] whose aggregate condition is their conjunction in
//! tag order.

use proc_macro2::{Literal, TokenStream};
use quote::quote;
use stencil_define::{ContractKind, FieldInfo, TagKind, TagUse, TypeInformation, ValueCategory};

use crate::errors::GeneratorError;
use crate::registry::TagRegistry;
use crate::syntax::{inner_type, parse_expr, parse_type};

/// The field a contract fragment is generated for.
#[derive(Debug, Clone)]
pub struct Subject<'a> {
    pub field: &'a str,
    /// The field's value type with any `Option` removed.
    pub value_type: &'a syn::Type,
    pub category: ValueCategory,
}

/// What one tag contributes to a field's contract.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Condition over `__value: &T`.
    pub condition: TokenStream,
    /// The condition as a person would write it, e.g. `id > 0`.
    pub text: String,
    /// Message prefix; the runtime value is appended when it can be printed.
    pub message: String,
}

/// Generates one fragment from a tag occurrence.
pub type FragmentFactory = fn(&Subject<'_>, &TagUse) -> Result<Fragment, GeneratorError>;

/// One generated condition with its enforcement point.
#[derive(Debug, Clone)]
pub struct Contract {
    pub kind: ContractKind,
    /// Owning field; `None` for type-level contracts.
    pub field: Option<String>,
    pub condition: TokenStream,
    pub text: String,
    pub message: String,
}

impl Contract {
    /// Builds the `ContractViolation` value for this contract.
    ///
    /// `value` is an expression of type `&T` interpolated into the message
    /// with `{:?}`, or `None` to leave the value out.
    pub fn violation(
        &self,
        runtime: &TokenStream,
        type_name: &str,
        value: Option<&TokenStream>,
    ) -> TokenStream {
        let kind = match self.kind {
            ContractKind::Precondition => quote!(Precondition),
            ContractKind::Postcondition => quote!(Postcondition),
            ContractKind::Invariant => quote!(Invariant),
        };
        let field = match &self.field {
            Some(name) => quote!(::core::option::Option::Some(#name)),
            None => quote!(::core::option::Option::None),
        };
        let text = &self.text;
        let message = match value {
            Some(value) => {
                let template = format!("{} but was {{:?}}", escape_braces(&self.message));
                quote!(::std::format!(#template, #value))
            }
            None => {
                let message = &self.message;
                quote!(::std::string::String::from(#message))
            }
        };
        quote! {
            #runtime::ContractViolation::new(
                #runtime::ViolationKind::#kind,
                #type_name,
                #field,
                #text,
                #message,
            )
        }
    }
}

/// The contracts of one field, or of the type itself, in tag order.
#[derive(Debug, Clone, Default)]
pub struct ContractSet {
    contracts: Vec<Contract>,
}

impl ContractSet {
    pub fn new(contracts: Vec<Contract>) -> Self {
        Self { contracts }
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contract> {
        self.contracts.iter()
    }

    /// `c1 && c2 && ... && cn`, or `true` for an empty set.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_gen::contract::ContractSet;
    ///
    /// assert_eq!(ContractSet::default().aggregate_condition().to_string(), "true");
    /// ```
    pub fn aggregate_condition(&self) -> TokenStream {
        match self.contracts.as_slice() {
            [] => return quote!(true),
            [only] => return only.condition.clone(),
            _ => {}
        }
        let conditions = self.contracts.iter().map(|contract| {
            let condition = &contract.condition;
            quote!((#condition))
        });
        quote!(#(#conditions)&&*)
    }
}

impl<'a> IntoIterator for &'a ContractSet {
    type Item = &'a Contract;
    type IntoIter = std::slice::Iter<'a, Contract>;

    fn into_iter(self) -> Self::IntoIter {
        self.contracts.iter()
    }
}

/// Turns tags into contracts using the fragment factories of a registry.
#[derive(Debug, Clone, Copy)]
pub struct ContractGenerator<'r> {
    registry: &'r TagRegistry,
}

impl<'r> ContractGenerator<'r> {
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self { registry }
    }

    /// Contracts of one field.
    ///
    /// Value tags on ordinary fields are preconditions; on derived fields
    /// they are postconditions, because the value only exists once the
    /// instance has been assembled.
    pub fn field_contracts(&self, field: &FieldInfo) -> Result<ContractSet, GeneratorError> {
        let declared = parse_type(&field.declared_type)?;
        let value_type = inner_type(&declared).unwrap_or(&declared);
        let subject = Subject {
            field: &field.name,
            value_type,
            category: field.category,
        };
        let kind = if field.is_derived() {
            ContractKind::Postcondition
        } else {
            ContractKind::Precondition
        };

        let mut contracts = Vec::new();
        for tag in field.constraint_tags() {
            let Some(factory) = self.registry.spec(tag.kind).and_then(|spec| spec.fragment) else {
                continue;
            };
            let fragment = factory(&subject, tag)?;
            contracts.push(Contract {
                kind,
                field: Some(field.name.clone()),
                condition: fragment.condition,
                text: fragment.text,
                message: fragment.message,
            });
        }
        Ok(ContractSet::new(contracts))
    }

    /// Type-level `#[invariant]` contracts, conditions over `self`.
    pub fn type_invariants(&self, info: &TypeInformation) -> Result<ContractSet, GeneratorError> {
        self.type_level(info, TagKind::Invariant, ContractKind::Invariant, "invariant")
    }

    /// Type-level `#[ensures]` contracts, conditions over `self`.
    pub fn type_postconditions(
        &self,
        info: &TypeInformation,
    ) -> Result<ContractSet, GeneratorError> {
        self.type_level(info, TagKind::Ensures, ContractKind::Postcondition, "postcondition")
    }

    fn type_level(
        &self,
        info: &TypeInformation,
        tag: TagKind,
        kind: ContractKind,
        label: &str,
    ) -> Result<ContractSet, GeneratorError> {
        let mut contracts = Vec::new();
        for tag in info.type_tags_of(tag) {
            let source = tag
                .expression()
                .map_err(|e| GeneratorError::CodeGenError(e.to_string()))?;
            let condition = parse_expr(source)?;
            contracts.push(Contract {
                kind,
                field: None,
                condition: quote!(#condition),
                text: source.to_string(),
                message: format!("{} `{}` does not hold for `{}`", label, source, info.name),
            });
        }
        Ok(ContractSet::new(contracts))
    }
}

/// Doubles braces so the text survives as a `format!` template.
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

fn tag_error(tag: &TagUse, e: impl std::fmt::Display) -> GeneratorError {
    GeneratorError::CodeGenError(format!("#[{}]: {}", tag.kind, e))
}

fn number(tag: &TagUse) -> Result<(TokenStream, String), GeneratorError> {
    let literal = tag.number().map_err(|e| tag_error(tag, e))?;
    let tokens: TokenStream = literal.parse().map_err(|e| tag_error(tag, e))?;
    Ok((tokens, literal.to_string()))
}

fn zero(ty: &syn::Type) -> TokenStream {
    quote!(<#ty as ::core::default::Default>::default())
}

pub(crate) fn positive(subject: &Subject<'_>, _tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let zero = zero(subject.value_type);
    Ok(Fragment {
        condition: quote!(*__value > #zero),
        text: format!("{} > 0", subject.field),
        message: format!("`{}` must be positive", subject.field),
    })
}

pub(crate) fn negative(subject: &Subject<'_>, _tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let zero = zero(subject.value_type);
    Ok(Fragment {
        condition: quote!(*__value < #zero),
        text: format!("{} < 0", subject.field),
        message: format!("`{}` must be negative", subject.field),
    })
}

pub(crate) fn greater_than(subject: &Subject<'_>, tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let (bound, literal) = number(tag)?;
    let ty = subject.value_type;
    Ok(Fragment {
        condition: quote!(*__value > (#bound as #ty)),
        text: format!("{} > {}", subject.field, literal),
        message: format!("`{}` must be greater than {}", subject.field, literal),
    })
}

pub(crate) fn less_than(subject: &Subject<'_>, tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let (bound, literal) = number(tag)?;
    let ty = subject.value_type;
    Ok(Fragment {
        condition: quote!(*__value < (#bound as #ty)),
        text: format!("{} < {}", subject.field, literal),
        message: format!("`{}` must be less than {}", subject.field, literal),
    })
}

pub(crate) fn multiple_of(subject: &Subject<'_>, tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let (step, literal) = number(tag)?;
    let ty = subject.value_type;
    let zero = zero(ty);
    Ok(Fragment {
        condition: quote!(*__value % (#step as #ty) == #zero),
        text: format!("{} % {} == 0", subject.field, literal),
        message: format!("`{}` must be a multiple of {}", subject.field, literal),
    })
}

fn length(subject: &Subject<'_>) -> (TokenStream, &'static str) {
    if subject.category == ValueCategory::Text {
        (quote!(__value.chars().count()), "characters")
    } else {
        (quote!(__value.len()), "elements")
    }
}

pub(crate) fn size(subject: &Subject<'_>, tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let (min, max) = tag.range().map_err(|e| tag_error(tag, e))?;
    let (len, unit) = length(subject);
    let field = subject.field;
    let lit = |n: u64| Literal::usize_unsuffixed(n as usize);
    let (condition, text, message) = match (min, max) {
        (Some(lo), Some(hi)) => {
            let (l, h) = (lit(lo), lit(hi));
            (
                quote!((#l..=#h).contains(&#len)),
                format!("{} has {}..={} {}", field, lo, hi, unit),
                format!("`{}` must have between {} and {} {}", field, lo, hi, unit),
            )
        }
        (Some(lo), None) => {
            let l = lit(lo);
            (
                quote!(#len >= #l),
                format!("{} has at least {} {}", field, lo, unit),
                format!("`{}` must have at least {} {}", field, lo, unit),
            )
        }
        (None, Some(hi)) => {
            let h = lit(hi);
            (
                quote!(#len <= #h),
                format!("{} has at most {} {}", field, hi, unit),
                format!("`{}` must have at most {} {}", field, hi, unit),
            )
        }
        (None, None) => return Err(tag_error(tag, "needs `min`, `max` or both")),
    };
    Ok(Fragment {
        condition,
        text,
        message,
    })
}

pub(crate) fn not_empty(subject: &Subject<'_>, _tag: &TagUse) -> Result<Fragment, GeneratorError> {
    Ok(Fragment {
        condition: quote!(!__value.is_empty()),
        text: format!("!{}.is_empty()", subject.field),
        message: format!("`{}` must not be empty", subject.field),
    })
}

fn ordering(subject: &Subject<'_>, op: TokenStream, order: &str) -> Fragment {
    Fragment {
        condition: quote! {
            __value
                .iter()
                .zip(__value.iter().skip(1))
                .all(|(__a, __b)| __a #op __b)
        },
        text: format!("{} is {}", subject.field, order),
        message: format!("`{}` must be in {} order", subject.field, order),
    }
}

pub(crate) fn ascending(subject: &Subject<'_>, _tag: &TagUse) -> Result<Fragment, GeneratorError> {
    Ok(ordering(subject, quote!(<=), "ascending"))
}

pub(crate) fn strictly_ascending(
    subject: &Subject<'_>,
    _tag: &TagUse,
) -> Result<Fragment, GeneratorError> {
    Ok(ordering(subject, quote!(<), "strictly ascending"))
}

pub(crate) fn descending(subject: &Subject<'_>, _tag: &TagUse) -> Result<Fragment, GeneratorError> {
    Ok(ordering(subject, quote!(>=), "descending"))
}

pub(crate) fn strictly_descending(
    subject: &Subject<'_>,
    _tag: &TagUse,
) -> Result<Fragment, GeneratorError> {
    Ok(ordering(subject, quote!(>), "strictly descending"))
}

pub(crate) fn bounded(subject: &Subject<'_>, tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let (capacity, literal) = number(tag)?;
    Ok(Fragment {
        condition: quote!(__value.len() <= #capacity),
        text: format!("{}.len() <= {}", subject.field, literal),
        message: format!("`{}` may hold at most {} elements", subject.field, literal),
    })
}

/// The free-form escape hatch; the element is bound as `_0`.
pub(crate) fn invariant(subject: &Subject<'_>, tag: &TagUse) -> Result<Fragment, GeneratorError> {
    let source = tag.expression().map_err(|e| tag_error(tag, e))?;
    let expr = parse_expr(source)?;
    Ok(Fragment {
        condition: quote!({
            let _0 = __value;
            #expr
        }),
        text: source.to_string(),
        message: format!("`{}` must satisfy `{}`", subject.field, source),
    })
}
