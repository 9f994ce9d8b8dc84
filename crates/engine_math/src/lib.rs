//! # engine_math
//!
//! Math types for the engine. Re-exports [`glam`] for linear algebra and
//! defines the 2D kinematic components used by movement systems.

pub mod kinematics;

// Re-export glam types for convenience.
pub use glam::{Mat2, Vec2};

pub use kinematics::{Position, Velocity};
