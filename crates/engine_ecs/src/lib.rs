//! # engine_ecs
//!
//! Entities, selectors, and the spaces that hold them.
//!
//! This crate provides:
//!
//! - [`Entity`] / [`EntityRef`] — an id, a type-flag mask, and an ordered
//!   component list, shared by handle.
//! - [`EntitySelector`] — composable boolean tests over entities.
//! - [`Subspace`] — a selector-filtered view kept in sync incrementally.
//! - [`Space`] — the entity container that drives every mutation.
//! - [`SpaceCommands`] — mutations queued from subspace hooks.

pub mod commands;
pub mod entity;
pub mod selector;
pub mod space;
pub mod subspace;

pub use commands::SpaceCommands;
pub use entity::{Entity, EntityRecord, EntityRef};
pub use selector::{EntitySelector, Predicate};
pub use space::{Space, SpaceId};
pub use subspace::{AnySubspace, Subspace, SubspaceHooks, SubspaceRef};
