//! Errors raised by generated code.
//!
//! Two families live here:
//!
//! - programmer-error signals: [`ContractViolation`], returned when a
//!   precondition, postcondition or invariant fails during construction or
//!   mutation, and [`MissingMandatoryFieldError`] from builders
//! - expected-failure signals: [`RecoveryError`] and
//!   [`CapacityExceededError`], returned by converter imports on malformed
//!   external input

use std::fmt;

use thiserror::Error;

/// Which kind of contract failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    Precondition,
    Postcondition,
    Invariant,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationKind::Precondition => "precondition",
            ViolationKind::Postcondition => "postcondition",
            ViolationKind::Invariant => "invariant",
        })
    }
}

/// A generated contract evaluated to false.
///
/// ## Examples
///
/// ```
/// use stencil_runtime::{ContractViolation, ViolationKind};
///
/// let violation = ContractViolation::new(
///     ViolationKind::Precondition,
///     "Account",
///     Some("id"),
///     "id > 0",
///     format!("id must be positive but was {:?}", 0),
/// );
/// assert_eq!(
///     violation.to_string(),
///     "precondition violated in `Account`: id must be positive but was 0"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} violated in `{type_name}`: {message}")]
pub struct ContractViolation {
    pub kind: ViolationKind,
    pub type_name: &'static str,
    /// The field the contract belongs to; `None` for type-level contracts.
    pub field: Option<&'static str>,
    /// The condition as written, e.g. `"id > 0"`.
    pub condition: &'static str,
    /// The generated message, with the offending value interpolated.
    pub message: String,
}

impl ContractViolation {
    pub fn new(
        kind: ViolationKind,
        type_name: &'static str,
        field: Option<&'static str>,
        condition: &'static str,
        message: String,
    ) -> Self {
        Self {
            kind,
            type_name,
            field,
            condition,
            message,
        }
    }
}

/// `build()` was called before a mandatory field was set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot build `{type_name}`: mandatory field `{field}` was never set")]
pub struct MissingMandatoryFieldError {
    pub type_name: &'static str,
    pub field: &'static str,
}

impl MissingMandatoryFieldError {
    pub fn new(type_name: &'static str, field: &'static str) -> Self {
        Self { type_name, field }
    }
}

/// Failure of a generated builder's `build()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    MissingField(#[from] MissingMandatoryFieldError),

    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

impl BuildError {
    /// The missing field name, when the build failed for that reason.
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            BuildError::MissingField(err) => Some(err.field),
            BuildError::Contract(_) => None,
        }
    }
}

/// A bounded collector received more elements than its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("collector capacity {capacity} exceeded by element #{attempted}")]
pub struct CapacityExceededError {
    pub capacity: usize,
    /// 1-based position of the rejected element.
    pub attempted: usize,
}

/// Failure of a generated converter's `import()`.
///
/// Import never yields a partially valid instance: the first failing element
/// stops it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    /// An element had the wrong representation.
    #[error("field `{field}` expected {expected}, found {found}")]
    Shape {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// The sequence had the wrong number of elements.
    #[error("`{type_name}` expects {expected} elements, found {found}")]
    Arity {
        type_name: &'static str,
        expected: usize,
        found: usize,
    },

    /// A recovered value failed a contract of the reconstruction entry point.
    #[error("field `{field}` violates `{condition}`: {message}")]
    Violated {
        field: String,
        condition: String,
        message: String,
    },

    /// A collection field received more elements than its bound.
    #[error("field `{field}` overflowed its collector: {source}")]
    Capacity {
        field: String,
        #[source]
        source: CapacityExceededError,
    },
}

impl RecoveryError {
    /// The field the failure is attributed to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            RecoveryError::Shape { field, .. }
            | RecoveryError::Violated { field, .. }
            | RecoveryError::Capacity { field, .. } => Some(field),
            RecoveryError::Arity { .. } => None,
        }
    }

    /// The capacity failure, when the import failed for that reason.
    pub fn capacity_exceeded(&self) -> Option<&CapacityExceededError> {
        match self {
            RecoveryError::Capacity { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ContractViolation> for RecoveryError {
    fn from(violation: ContractViolation) -> Self {
        RecoveryError::Violated {
            field: violation.field.unwrap_or(violation.type_name).to_string(),
            condition: violation.condition.to_string(),
            message: violation.message,
        }
    }
}
