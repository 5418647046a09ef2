//! Domain models for the JoinEcoGrow platform.
//!
//! - [`Feature`]: a catalog entry for a platform capability. Features are
//!   soft-deleted by clearing `is_active`, never removed.
//! - [`GeneratedComponent`]: code produced by the component generator and
//!   optionally refined, linked back to a feature.

mod component;
mod feature;

pub use component::*;
pub use feature::*;
