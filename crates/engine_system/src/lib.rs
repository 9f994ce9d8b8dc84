//! # engine_system
//!
//! Systems: the per-frame logic a game runs over its active spaces.
//!
//! A host calls the game's update and render entry points once per frame;
//! the game forwards each call to every registered [`System`] along with the
//! spaces that are currently active.
//!
//! ## Usage
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use engine_ecs::{Entity, Space};
//! use engine_system::{System, system_fn};
//!
//! let mut space = Space::new();
//! space.spawn(Entity::empty().with_id(1));
//! let spaces = vec![Rc::new(RefCell::new(space))];
//!
//! let mut counter = 0;
//! let mut census = system_fn("census", move |space, _dt| {
//!     counter += space.entities().len();
//! });
//! census.update_spaces(&spaces, 1.0 / 60.0);
//! ```

pub mod fn_system;
pub mod system;

pub use fn_system::{FnSystem, system_fn};
pub use system::System;
