//! The construction state machine shared by generated constructors and
//! converter imports.
//!
//! ```text
//! COLLECTING ──validate()──▶ VALIDATING ──commit()──▶ COMMITTED
//!                                │
//!                                └──────reject()────▶ REJECTED
//! ```
//!
//! The states are types: a [`Construction`] can only move to a
//! [`Validation`], and a [`Validation`] is consumed by either `commit` or
//! `reject`, so no instance escapes a rejected construction.

use std::fmt;

use tracing::{debug, trace};

use crate::error::ContractViolation;

/// Observable phase of a construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Validating,
    Committed,
    Rejected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Collecting => "COLLECTING",
            Phase::Validating => "VALIDATING",
            Phase::Committed => "COMMITTED",
            Phase::Rejected => "REJECTED",
        })
    }
}

/// A construction gathering its field values.
#[must_use = "a construction must be validated and then committed or rejected"]
#[derive(Debug)]
pub struct Construction {
    type_name: &'static str,
}

impl Construction {
    /// Starts constructing an instance of `type_name`.
    pub fn begin(type_name: &'static str) -> Self {
        trace!(type_name, phase = %Phase::Collecting, "construction started");
        Self { type_name }
    }

    pub fn phase(&self) -> Phase {
        Phase::Collecting
    }

    /// All values are collected; contracts are evaluated next.
    pub fn validate(self) -> Validation {
        trace!(type_name = self.type_name, phase = %Phase::Validating, "validating");
        Validation {
            type_name: self.type_name,
        }
    }
}

/// A construction evaluating its contracts.
#[must_use = "a validation must be committed or rejected"]
#[derive(Debug)]
pub struct Validation {
    type_name: &'static str,
}

impl Validation {
    pub fn phase(&self) -> Phase {
        Phase::Validating
    }

    /// Every contract held; the instance is released to the caller.
    pub fn commit<T>(self, value: T) -> Result<T, ContractViolation> {
        trace!(type_name = self.type_name, phase = %Phase::Committed, "construction committed");
        Ok(value)
    }

    /// A contract failed; nothing is released.
    pub fn reject<T>(self, violation: ContractViolation) -> Result<T, ContractViolation> {
        debug!(
            type_name = self.type_name,
            phase = %Phase::Rejected,
            condition = violation.condition,
            "construction rejected"
        );
        Err(violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use tracing_test::traced_test;

    #[test]
    fn phases_advance_in_order() {
        let construction = Construction::begin("Pair");
        assert_eq!(construction.phase(), Phase::Collecting);
        let validation = construction.validate();
        assert_eq!(validation.phase(), Phase::Validating);
        assert_eq!(validation.commit(7).unwrap(), 7);
    }

    #[test]
    #[traced_test]
    fn rejection_returns_the_violation_and_logs_it() {
        let violation = ContractViolation::new(
            ViolationKind::Precondition,
            "Pair",
            Some("first"),
            "!first.is_empty()",
            "first must not be empty".to_string(),
        );
        let result: Result<(), _> = Construction::begin("Pair")
            .validate()
            .reject(violation.clone());
        assert_eq!(result.unwrap_err(), violation);
        assert!(logs_contain("construction rejected"));
    }

    #[test]
    fn phase_display_uses_state_machine_names() {
        assert_eq!(Phase::Committed.to_string(), "COMMITTED");
        assert_eq!(Phase::Rejected.to_string(), "REJECTED");
    }
}
