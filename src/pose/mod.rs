//! Pose module - landmark data and skeleton topology
//!
//! Re-exports only. All logic in submodules.

mod landmarks;
mod symmetry;

pub use landmarks::*;
pub use symmetry::{SymmetricPairMap, SYMMETRIC_PAIRS};
