//! Kinema Core
//!
//! Foundational types shared by every Kinema crate:
//!
//! - [`errors`]: [`KinemaError`] and the crate-wide [`Result`] alias
//! - [`transform`]: TRS [`Transform`] with mirroring helpers
//! - [`bounds`]: [`BoundingBox`] and oriented [`Obb`]
//! - [`units`]: distance [`UnitType`] and conversion factors

pub mod bounds;
pub mod errors;
pub mod transform;
pub mod units;

pub use bounds::{BoundingBox, Obb};
pub use errors::{KinemaError, Result};
pub use transform::{mirror_vector, Axis, MirrorFlags, Transform};
pub use units::UnitType;

/// Default tolerance used by geometric comparisons.
pub const EPSILON: f32 = 1.0e-5;

/// Returns `true` when two floats are within [`EPSILON`] of each other.
#[inline]
#[must_use]
pub fn is_float_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON
}
