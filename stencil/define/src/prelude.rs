//! Convenient re-exports for working with the declaration model.
//!
//! ## Examples
//!
//! ```
//! use stencil_define::prelude::*;
//!
//! let location = SourceLocation::new(Some("decls/pair.rs"), 3, 1);
//! let diagnostic = Diagnostic::error("no reconstruction entry point", location);
//! assert_eq!(diagnostic.severity, Severity::Error);
//! ```

pub use crate::artifact::{ArtifactKind, ArtifactSet};
pub use crate::contract::ContractKind;
pub use crate::diagnostic::{Diagnostic, Severity, SourceLocation};
pub use crate::kinds::{DeclarationKind, ValueCategory};
pub use crate::model::{
    EntryPoint, EntryPointKind, FieldInfo, MethodInfo, Parameter, Receiver, TypeInformation,
    TypeParameter,
};
pub use crate::tag::{TagArguments, TagKind, TagUse};
