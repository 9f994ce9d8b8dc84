//! 2D kinematic components.
//!
//! [`Position`] and [`Velocity`] are the minimal pair a movement system
//! needs. Both are serialisable, so entities carrying them survive a record
//! round trip through a component registry.

use engine_component::{CodecError, Component, codec};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// World-space position.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position(pub Vec2);

impl Position {
    pub const ORIGIN: Self = Self(Vec2::ZERO);

    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    /// Move by `velocity` over `interval` seconds.
    #[must_use]
    pub fn advanced(self, velocity: Velocity, interval: f64) -> Self {
        Self(self.0 + velocity.0 * interval as f32)
    }

    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        self.0.distance(other.0)
    }
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }

    fn encode(&self) -> Option<Result<Vec<u8>, CodecError>> {
        Some(codec::encode(self))
    }
}

/// Units per second.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity(pub Vec2);

impl Velocity {
    pub const ZERO: Self = Self(Vec2::ZERO);

    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    #[must_use]
    pub fn speed(self) -> f32 {
        self.0.length()
    }

    /// Same direction, length at most `max`.
    #[must_use]
    pub fn clamped(self, max: f32) -> Self {
        Self(self.0.clamp_length_max(max))
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }

    fn encode(&self) -> Option<Result<Vec<u8>, CodecError>> {
        Some(codec::encode(self))
    }
}
