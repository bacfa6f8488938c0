//! Types generated from `decls/catalog.rs` by the build script.
//!
//! Nothing here is written by hand except [`Fixed`] and [`PROBES`], which the
//! declarations refer to.

use std::sync::atomic::AtomicUsize;

/// A read-only value; fields of this type become properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fixed<T>(pub T);

/// Incremented by every uncached `Dice::probe` computation.
pub static PROBES: AtomicUsize = AtomicUsize::new(0);

include!(concat!(env!("OUT_DIR"), "/stencil_generated.rs"));
