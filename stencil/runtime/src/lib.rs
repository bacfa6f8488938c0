//! Runtime support for code generated by `stencil-gen`.
//!
//! Generated implementations, builders and converters refer to this crate by
//! absolute path (`::stencil_runtime::...`) and never import anything, so the
//! generated files can be `include!`d side by side in one module.
//!
//! ## Modules
//!
//! - [`error`] - Contract violations, builder errors and import errors
//! - [`construction`] - The `COLLECTING → VALIDATING → COMMITTED | REJECTED` state machine
//! - [`intercept`] - Per-instance memoization and call tracing for intercepted methods
//! - [`collector`] - Bounded and unbounded accumulators used by converters
//! - [`represent`] - The tree representation and the [`Representable`] / [`Converter`] traits
//! - [`hash`] - The seed/multiplier fold behind generated `hash_code()` methods

pub mod collector;
pub mod construction;
pub mod error;
pub mod hash;
pub mod intercept;
pub mod represent;

pub use collector::{BoundedCollector, Collector, UnboundedCollector};
pub use construction::{Construction, Phase, Validation};
pub use error::{
    BuildError, CapacityExceededError, ContractViolation, MissingMandatoryFieldError,
    RecoveryError, ViolationKind,
};
pub use intercept::{MemoCache, logged};
pub use represent::{Converter, Node, Representable};
