//! Contract enforcement points.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// When a generated contract is checked.
///
/// - `Precondition` - on every supplied value, before it is stored
/// - `Postcondition` - on the assembled instance at the end of construction
/// - `Invariant` - at the end of construction and after every mutation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContractKind {
    Precondition,
    Postcondition,
    Invariant,
}
