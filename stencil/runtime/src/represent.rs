//! The external tree representation used by generated converters.
//!
//! A synthesized value is exported as a JSON array holding its entry-point
//! parameters in field order. Every field type converts itself through
//! [`Representable`]; synthesized types implement it by delegating to their
//! converter, so nested declarations round-trip recursively.

use std::slice;

use crate::collector::{Collector, UnboundedCollector};
use crate::error::RecoveryError;

/// One node of the tree representation.
pub type Node = serde_json::Value;

/// A value that can be written to and read back from a [`Node`].
pub trait Representable: Sized {
    fn to_node(&self) -> Node;

    /// Reads a value back; `field` names the element in errors.
    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError>;
}

/// Bidirectional conversion of one synthesized type.
pub trait Converter {
    type Target;

    fn export(value: &Self::Target) -> Node;

    fn import(node: &Node) -> Result<Self::Target, RecoveryError>;
}

/// Short name of a node's kind, used in shape errors.
pub fn kind_of(node: &Node) -> &'static str {
    match node {
        Node::Null => "null",
        Node::Bool(_) => "boolean",
        Node::Number(_) => "number",
        Node::String(_) => "string",
        Node::Array(_) => "array",
        Node::Object(_) => "object",
    }
}

fn shape_error(field: &str, expected: &'static str, node: &Node) -> RecoveryError {
    RecoveryError::Shape {
        field: field.to_string(),
        expected,
        found: kind_of(node).to_string(),
    }
}

/// Checks that `node` is a sequence of exactly `arity` elements and returns
/// an iterator over them.
pub fn expect_sequence<'a>(
    node: &'a Node,
    type_name: &'static str,
    arity: usize,
) -> Result<slice::Iter<'a, Node>, RecoveryError> {
    let items = node
        .as_array()
        .ok_or_else(|| shape_error(type_name, "array", node))?;
    if items.len() != arity {
        return Err(RecoveryError::Arity {
            type_name,
            expected: arity,
            found: items.len(),
        });
    }
    Ok(items.iter())
}

fn next_element<'a>(
    items: &mut slice::Iter<'a, Node>,
    field: &str,
) -> Result<&'a Node, RecoveryError> {
    items.next().ok_or_else(|| RecoveryError::Shape {
        field: field.to_string(),
        expected: "an element",
        found: "end of sequence".to_string(),
    })
}

/// Reads the next element of a sequence as a `T`.
pub fn read_field<T: Representable>(
    items: &mut slice::Iter<'_, Node>,
    field: &str,
) -> Result<T, RecoveryError> {
    T::from_node(next_element(items, field)?, field)
}

/// Reads the next element of a sequence as a collection, gathering its
/// elements through `collector`.
pub fn read_collection<T, C>(
    items: &mut slice::Iter<'_, Node>,
    field: &str,
    collector: C,
) -> Result<Vec<T>, RecoveryError>
where
    T: Representable,
    C: Collector<T>,
{
    collect_node(next_element(items, field)?, field, collector)
}

fn collect_node<T, C>(node: &Node, field: &str, mut collector: C) -> Result<Vec<T>, RecoveryError>
where
    T: Representable,
    C: Collector<T>,
{
    let elements = node
        .as_array()
        .ok_or_else(|| shape_error(field, "array", node))?;
    for (index, element) in elements.iter().enumerate() {
        let item = T::from_node(element, &format!("{}[{}]", field, index))?;
        collector
            .accept(item)
            .map_err(|source| RecoveryError::Capacity {
                field: field.to_string(),
                source,
            })?;
    }
    Ok(collector.finish())
}

macro_rules! representable_integer {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Representable for $ty {
                fn to_node(&self) -> Node {
                    Node::from(*self)
                }

                fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
                    node.$read()
                        .and_then(|value| <$ty>::try_from(value).ok())
                        .ok_or_else(|| shape_error(field, stringify!($ty), node))
                }
            }
        )*
    };
}

representable_integer! {
    i8 => as_i64,
    i16 => as_i64,
    i32 => as_i64,
    i64 => as_i64,
    isize => as_i64,
    u8 => as_u64,
    u16 => as_u64,
    u32 => as_u64,
    u64 => as_u64,
    usize => as_u64,
}

impl Representable for f64 {
    fn to_node(&self) -> Node {
        Node::from(*self)
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        node.as_f64().ok_or_else(|| shape_error(field, "f64", node))
    }
}

impl Representable for f32 {
    fn to_node(&self) -> Node {
        Node::from(*self)
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        node.as_f64()
            .map(|value| value as f32)
            .ok_or_else(|| shape_error(field, "f32", node))
    }
}

impl Representable for bool {
    fn to_node(&self) -> Node {
        Node::Bool(*self)
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        node.as_bool().ok_or_else(|| shape_error(field, "boolean", node))
    }
}

impl Representable for char {
    fn to_node(&self) -> Node {
        Node::String(self.to_string())
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        let text = node
            .as_str()
            .ok_or_else(|| shape_error(field, "character", node))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(shape_error(field, "character", node)),
        }
    }
}

impl Representable for String {
    fn to_node(&self) -> Node {
        Node::String(self.clone())
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        node.as_str()
            .map(str::to_string)
            .ok_or_else(|| shape_error(field, "string", node))
    }
}

impl<T: Representable> Representable for Option<T> {
    fn to_node(&self) -> Node {
        match self {
            Some(value) => value.to_node(),
            None => Node::Null,
        }
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        if node.is_null() {
            Ok(None)
        } else {
            T::from_node(node, field).map(Some)
        }
    }
}

impl<T: Representable> Representable for Vec<T> {
    fn to_node(&self) -> Node {
        Node::Array(self.iter().map(Representable::to_node).collect())
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        collect_node(node, field, UnboundedCollector::new())
    }
}

impl<T: Representable> Representable for Box<T> {
    fn to_node(&self) -> Node {
        self.as_ref().to_node()
    }

    fn from_node(node: &Node, field: &str) -> Result<Self, RecoveryError> {
        T::from_node(node, field).map(Box::new)
    }
}
