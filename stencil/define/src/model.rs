//! Type Information: the normalized record of one declared type.
//!
//! The structural extractor builds exactly one [`TypeInformation`] per
//! declaration. Every synthesizer receives it by shared reference, so the
//! field model they emit from is the same for all three artifacts.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::artifact::ArtifactSet;
use crate::diagnostic::SourceLocation;
use crate::kinds::ValueCategory;
use crate::tag::{TagKind, TagUse};

/// A generic type parameter and its bounds, as written.
///
/// ## Examples
///
/// ```
/// use stencil_define::TypeParameter;
///
/// let param = TypeParameter::new("T", ["Clone", "std::fmt::Debug"]);
/// assert_eq!(param.render(), "T: Clone + std::fmt::Debug");
/// assert_eq!(TypeParameter::new("U", Vec::<String>::new()).render(), "U");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameter {
    pub name: String,
    pub bounds: Vec<String>,
}

impl TypeParameter {
    pub fn new<I, S>(name: impl Into<String>, bounds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            bounds: bounds.into_iter().map(Into::into).collect(),
        }
    }

    /// Renders the parameter as it appears in a generic parameter list.
    pub fn render(&self) -> String {
        if self.bounds.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, self.bounds.join(" + "))
        }
    }
}

/// One field of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    /// The declared type as source text, e.g. `Option<String>`.
    pub declared_type: String,
    /// Tags in declaration order; parameter tags of the entry point are appended.
    pub tags: Vec<TagUse>,
    /// No default, not nullable, not derived.
    pub is_mandatory: bool,
    /// Declared as `Option<T>`.
    pub nullable: bool,
    pub category: ValueCategory,
    pub default_expression: Option<String>,
    pub derivation_expression: Option<String>,
    pub normalization_expression: Option<String>,
    /// Explicit assignment order from `#[order(n)]`.
    pub order: Option<i64>,
    /// Reconstruction-only; skipped by converters.
    pub helper: bool,
    /// Read-only property member; never mutated after construction.
    pub property: bool,
    pub docs: Vec<String>,
    pub location: SourceLocation,
}

impl FieldInfo {
    /// Creates a plain field with no tags.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        category: ValueCategory,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            tags: Vec::new(),
            is_mandatory: true,
            nullable: false,
            category,
            default_expression: None,
            derivation_expression: None,
            normalization_expression: None,
            order: None,
            helper: false,
            property: false,
            docs: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    /// Computed from other fields; never supplied.
    pub fn is_derived(&self) -> bool {
        self.derivation_expression.is_some()
    }

    /// Can be left unset by a builder.
    pub fn is_optional(&self) -> bool {
        self.default_expression.is_some() || self.nullable
    }

    /// Returns true if the field carries the given tag.
    pub fn has_tag(&self, kind: TagKind) -> bool {
        self.tags.iter().any(|tag| tag.kind == kind)
    }

    /// The tags that generate contracts, in declaration order.
    pub fn constraint_tags(&self) -> impl Iterator<Item = &TagUse> {
        self.tags.iter().filter(|tag| tag.kind.is_value_constraint())
    }

    /// The capacity from `#[bounded(n)]`, if present and well formed.
    pub fn capacity(&self) -> Option<usize> {
        self.tags
            .iter()
            .find(|tag| tag.kind == TagKind::Bounded)
            .and_then(|tag| tag.number().ok())
            .and_then(|literal| literal.parse().ok())
    }
}

/// How the reconstruction entry point is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryPointKind {
    /// `#[reconstruct]`
    Constructor,
    /// `#[factory]`
    Factory,
}

/// A parameter of an entry point or carried method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub declared_type: String,
    pub tags: Vec<TagUse>,
    pub location: SourceLocation,
}

/// The single constructor or factory used to rebuild an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub kind: EntryPointKind,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub location: SourceLocation,
}

/// The receiver of a carried method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Receiver {
    /// Associated function without `self`
    None,
    /// `&self`
    Shared,
    /// `&mut self`
    Exclusive,
    /// `self`
    Owned,
}

/// A method carried from the declaration to the implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    /// The full method item with engine tags removed.
    pub source: String,
    /// Interceptor tags, outermost first.
    pub interceptors: Vec<TagKind>,
    pub receiver: Receiver,
    /// Parameters after the receiver.
    pub parameters: Vec<Parameter>,
    /// Return type, `None` for `()`.
    pub output: Option<String>,
    /// Declares its own generic parameters.
    pub generic: bool,
    pub location: SourceLocation,
}

impl MethodInfo {
    /// Returns true when at least one interceptor wraps the method.
    pub fn is_intercepted(&self) -> bool {
        !self.interceptors.is_empty()
    }
}

/// The normalized record describing one declared type.
///
/// ## Invariants
///
/// - `fields` is ordered by `#[order]` (ties and untagged fields by
///   declaration order) with property fields appended last
/// - `parameter_fields[i]` is the index in `fields` of entry-point parameter `i`
/// - no derived field is an entry-point parameter
/// - derivations only reference fields that precede them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInformation {
    /// The declared type name; also the supertype the implementation realizes.
    pub name: String,
    pub type_parameters: Vec<TypeParameter>,
    pub where_clause: Option<String>,
    /// Derives carried to the implementation.
    pub capabilities: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub entry_point: EntryPoint,
    pub parameter_fields: Vec<usize>,
    pub methods: Vec<MethodInfo>,
    /// Type-level `#[invariant]` and `#[ensures]` tags.
    pub type_tags: Vec<TagUse>,
    pub artifacts: ArtifactSet,
    pub mutable: bool,
    pub docs: Vec<String>,
    pub location: SourceLocation,
}

impl TypeInformation {
    /// The abstract type being realized by the implementation.
    pub fn supertype(&self) -> &str {
        &self.name
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Position of a field in `fields`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Entry-point parameters paired with the fields they resolve to,
    /// in parameter order.
    pub fn parameter_pairs(&self) -> impl Iterator<Item = (&Parameter, &FieldInfo)> {
        self.entry_point
            .parameters
            .iter()
            .zip(&self.parameter_fields)
            .filter_map(|(param, &index)| self.fields.get(index).map(|field| (param, field)))
    }

    /// Returns true if the field is a parameter of the entry point.
    pub fn is_parameter(&self, field: &FieldInfo) -> bool {
        self.entry_point
            .parameters
            .iter()
            .any(|param| param.name == field.name)
    }

    /// Fields supplied through the entry point, in field order.
    pub fn parameter_fields_in_order(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|field| self.is_parameter(field))
    }

    /// Fields that are stored from supplied or default values.
    pub fn stored_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|field| !field.is_derived())
    }

    /// Fields computed from other fields.
    pub fn derived_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|field| field.is_derived())
    }

    /// Parameter fields a builder must receive before `build()` succeeds.
    pub fn mandatory_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.parameter_fields_in_order()
            .filter(|field| field.is_mandatory)
    }

    /// Type-level tags of the given kind.
    pub fn type_tags_of(&self, kind: TagKind) -> impl Iterator<Item = &TagUse> {
        self.type_tags.iter().filter(move |tag| tag.kind == kind)
    }

    /// The generic parameter list with bounds, e.g. `<T: Clone, U>`, or an
    /// empty string.
    pub fn generics_source(&self) -> String {
        if self.type_parameters.is_empty() {
            return String::new();
        }
        let params: Vec<String> = self.type_parameters.iter().map(TypeParameter::render).collect();
        format!("<{}>", params.join(", "))
    }

    /// The generic argument list without bounds, e.g. `<T, U>`, or an empty
    /// string.
    pub fn type_arguments_source(&self) -> String {
        if self.type_parameters.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = self
            .type_parameters
            .iter()
            .map(|param| param.name.as_str())
            .collect();
        format!("<{}>", names.join(", "))
    }
}
