//! Semantic tags recognized on declarations.
//!
//! A tag is an attribute attached to a type, field, parameter or method of a
//! declaration. The engine never looks at tags through a class hierarchy:
//! every tag is one [`TagKind`] plus its parsed [`TagArguments`], and the
//! registry in `stencil-gen` decides where a tag may appear.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::diagnostic::SourceLocation;

/// Every tag the engine interprets.
///
/// The string form is the attribute name used in declaration files.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use stencil_define::TagKind;
///
/// assert_eq!(TagKind::from_str("greater_than").unwrap(), TagKind::GreaterThan);
/// assert_eq!(TagKind::MultipleOf.to_string(), "multiple_of");
/// assert!(TagKind::from_str("serde").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TagKind {
    /// Marks a struct as a declaration and selects its artifacts
    Synth,
    /// Designates the reconstruction constructor
    Reconstruct,
    /// Designates a reconstruction static factory
    Factory,
    /// Default-value expression for an optional field
    Default,
    /// Derivation expression; the field is computed, never supplied
    Derived,
    /// Normalization applied to every supplied value
    Normalize,
    /// Explicit assignment order
    Order,
    /// Reconstruction-only field, skipped by converters
    Helper,
    /// Read-only property member, appended after the other fields
    Property,
    Positive,
    Negative,
    GreaterThan,
    LessThan,
    MultipleOf,
    /// Length range for text and collections
    Size,
    NotEmpty,
    Ascending,
    StrictlyAscending,
    Descending,
    StrictlyDescending,
    /// Collection capacity, enforced on construction and by import collectors
    Bounded,
    /// Free-form condition taken verbatim
    Invariant,
    /// Free-form postcondition checked at the end of construction
    Ensures,
    /// Memoize a method per instance, keyed by its arguments
    Cached,
    /// Trace every invocation of a method
    Logged,
}

impl TagKind {
    /// Looks up the tag for an attribute name, returning `None` for
    /// attributes the engine passes through untouched (`doc`, `derive`, ...).
    pub fn from_attribute(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// The attribute name as written in declarations.
    pub fn attribute_name(self) -> &'static str {
        self.into()
    }

    /// Returns true for tags that constrain the value of a field or parameter.
    pub fn is_value_constraint(self) -> bool {
        matches!(
            self,
            TagKind::Positive
                | TagKind::Negative
                | TagKind::GreaterThan
                | TagKind::LessThan
                | TagKind::MultipleOf
                | TagKind::Size
                | TagKind::NotEmpty
                | TagKind::Ascending
                | TagKind::StrictlyAscending
                | TagKind::Descending
                | TagKind::StrictlyDescending
                | TagKind::Bounded
                | TagKind::Invariant
        )
    }

    /// Returns true for tags that route a method call through an interceptor.
    pub fn is_interceptor(self) -> bool {
        matches!(self, TagKind::Cached | TagKind::Logged)
    }

    /// Returns true for the two tags designating a reconstruction entry point.
    pub fn is_entry_point(self) -> bool {
        matches!(self, TagKind::Reconstruct | TagKind::Factory)
    }
}

/// Parsed arguments of a tag.
///
/// Expressions are stored as source text; the generator re-parses them
/// when it emits code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TagArguments {
    /// Marker tag without arguments
    None,
    /// A Rust expression, e.g. `#[default(String::from("x"))]`
    Expression { source: String },
    /// A numeric literal, possibly negated, e.g. `#[greater_than(-3)]`
    Number { literal: String },
    /// An optional inclusive range, e.g. `#[size(min = 1, max = 8)]`
    Range { min: Option<u64>, max: Option<u64> },
    /// Bare identifiers, e.g. `#[synth(builder, mutable)]`
    Flags { flags: Vec<String> },
}

/// Requested a different argument shape than the tag carries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tag `{tag}` does not carry {expected} arguments")]
pub struct TagArgumentError {
    /// The tag that was queried.
    pub tag: TagKind,
    /// The argument shape that was requested.
    pub expected: &'static str,
}

/// One occurrence of a tag on a declaration element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUse {
    pub kind: TagKind,
    pub arguments: TagArguments,
    pub location: SourceLocation,
}

impl TagUse {
    /// Creates a tag occurrence.
    pub fn new(kind: TagKind, arguments: TagArguments, location: SourceLocation) -> Self {
        Self {
            kind,
            arguments,
            location,
        }
    }

    /// Creates a marker tag occurrence without arguments.
    pub fn marker(kind: TagKind, location: SourceLocation) -> Self {
        Self::new(kind, TagArguments::None, location)
    }

    /// The expression source of an expression-carrying tag.
    pub fn expression(&self) -> Result<&str, TagArgumentError> {
        match &self.arguments {
            TagArguments::Expression { source } => Ok(source),
            _ => Err(self.mismatch("expression")),
        }
    }

    /// The literal of a number-carrying tag.
    pub fn number(&self) -> Result<&str, TagArgumentError> {
        match &self.arguments {
            TagArguments::Number { literal } => Ok(literal),
            _ => Err(self.mismatch("number")),
        }
    }

    /// The bounds of a range-carrying tag.
    pub fn range(&self) -> Result<(Option<u64>, Option<u64>), TagArgumentError> {
        match &self.arguments {
            TagArguments::Range { min, max } => Ok((*min, *max)),
            _ => Err(self.mismatch("range")),
        }
    }

    /// The flags of a flag-carrying tag; marker tags have no flags.
    pub fn flags(&self) -> Result<&[String], TagArgumentError> {
        match &self.arguments {
            TagArguments::Flags { flags } => Ok(flags),
            TagArguments::None => Ok(&[]),
            _ => Err(self.mismatch("flag")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> TagArgumentError {
        TagArgumentError {
            tag: self.kind,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn attribute_names_round_trip_through_from_attribute() {
        for kind in TagKind::iter() {
            assert_eq!(TagKind::from_attribute(kind.attribute_name()), Some(kind));
        }
    }

    #[test]
    fn unknown_attributes_are_not_tags() {
        assert_eq!(TagKind::from_attribute("doc"), None);
        assert_eq!(TagKind::from_attribute("derive"), None);
        assert!(TagKind::from_str("Positive").is_err());
    }

    #[test]
    fn interceptors_and_constraints_are_disjoint() {
        for kind in TagKind::iter() {
            assert!(!(kind.is_interceptor() && kind.is_value_constraint()));
        }
    }

    #[test]
    fn argument_accessors_reject_other_shapes() {
        let location = SourceLocation::default();
        let tag = TagUse::new(
            TagKind::GreaterThan,
            TagArguments::Number {
                literal: "-3".to_string(),
            },
            location,
        );

        assert_eq!(tag.number().unwrap(), "-3");
        let err = tag.expression().unwrap_err();
        assert_eq!(err.tag, TagKind::GreaterThan);
        assert!(err.to_string().contains("expression"));
    }

    #[test]
    fn marker_tags_have_no_flags() {
        let tag = TagUse::marker(TagKind::Synth, SourceLocation::default());
        assert!(tag.flags().unwrap().is_empty());
    }

    #[test]
    fn tag_use_serializes_with_shape_discriminator() {
        let tag = TagUse::new(
            TagKind::Size,
            TagArguments::Range {
                min: Some(1),
                max: None,
            },
            SourceLocation::default(),
        );
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["kind"], "size");
        assert_eq!(json["arguments"]["shape"], "range");
        assert_eq!(json["arguments"]["min"], 1);
    }
}
