//! # engine_component
//!
//! The "C" in ECS — defines what a component is, how its type is identified,
//! and the narrow contract through which components cross the serialization
//! boundary.
//!
//! This crate provides:
//!
//! - [`Component`] trait — the marker every attachable payload implements.
//! - [`AnyComponent`] — the type-erased form entities store.
//! - [`ComponentTypeId`] — stable FNV-1a type identity.
//! - [`ComponentRecord`] / [`ComponentRegistry`] — encode and rebuild components.

pub mod codec;
pub mod component;
pub mod error;
pub mod registry;

pub use codec::ComponentRecord;
pub use component::{AnyComponent, Component, ComponentTypeId};
pub use error::CodecError;
pub use registry::{ComponentMeta, ComponentRegistry};
