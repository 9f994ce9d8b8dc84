//! # engine_app
//!
//! Puts the engine together.
//!
//! - [`Game`] — ordered spaces and systems plus the game-level event bus.
//! - [`TickLoop`] / [`TickConfig`] — the host-side fixed-rate driver.

pub mod game;
pub mod tick;

pub use game::Game;
pub use tick::{TickConfig, TickLoop};
