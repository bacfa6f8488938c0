//! Declaration kinds and value categories.
//!
//! Tag legality is decided along two axes: the kind of element a tag is
//! attached to, and the category of value that element holds.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The kind of declaration element a tag is attached to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeclarationKind {
    Type,
    Field,
    Parameter,
    Method,
}

/// Coarse classification of a declared value type.
///
/// `Option<T>` is classified by `T`; nullability is tracked separately.
///
/// ## Examples
///
/// ```
/// use stencil_define::ValueCategory;
///
/// assert!(ValueCategory::Float.is_numeric());
/// assert!(ValueCategory::Text.has_length());
/// assert!(!ValueCategory::Boolean.has_length());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueCategory {
    Integer,
    Float,
    Text,
    Collection,
    Boolean,
    Other,
}

impl ValueCategory {
    /// Integers and floats.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueCategory::Integer | ValueCategory::Float)
    }

    /// Values with a length: text and collections.
    pub fn has_length(self) -> bool {
        matches!(self, ValueCategory::Text | ValueCategory::Collection)
    }
}
