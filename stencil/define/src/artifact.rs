//! Artifact kinds produced by the synthesizers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// One kind of generated source file.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use stencil_define::ArtifactKind;
///
/// assert_eq!(ArtifactKind::from_str("builder").unwrap(), ArtifactKind::Builder);
/// assert_eq!(ArtifactKind::Builder.default_suffix(), "Builder");
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    /// The concrete realization of the declared type
    Implementation,
    /// The fluent builder
    Builder,
    /// The tree-representation converter
    Converter,
}

impl ArtifactKind {
    /// The suffix appended to the declared type name when no configuration
    /// overrides it.
    pub fn default_suffix(self) -> &'static str {
        match self {
            ArtifactKind::Implementation => "Subclass",
            ArtifactKind::Builder => "Builder",
            ArtifactKind::Converter => "Converter",
        }
    }
}

/// The artifacts a declaration asks for.
///
/// The implementation is the target of both the builder and the converter,
/// so it is always part of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub builder: bool,
    pub converter: bool,
}

impl ArtifactSet {
    /// All three artifacts.
    pub fn all() -> Self {
        Self {
            builder: true,
            converter: true,
        }
    }

    /// Only the implementation.
    pub fn implementation_only() -> Self {
        Self {
            builder: false,
            converter: false,
        }
    }

    /// Adds an artifact to the set.
    pub fn insert(&mut self, kind: ArtifactKind) {
        match kind {
            ArtifactKind::Implementation => {}
            ArtifactKind::Builder => self.builder = true,
            ArtifactKind::Converter => self.converter = true,
        }
    }

    /// Returns true if the artifact will be generated.
    pub fn contains(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Implementation => true,
            ArtifactKind::Builder => self.builder,
            ArtifactKind::Converter => self.converter,
        }
    }

    /// The requested artifacts in emission order.
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        let mut kinds = vec![ArtifactKind::Implementation];
        if self.builder {
            kinds.push(ArtifactKind::Builder);
        }
        if self.converter {
            kinds.push(ArtifactKind::Converter);
        }
        kinds
    }
}

impl Default for ArtifactSet {
    fn default() -> Self {
        Self::all()
    }
}
