//! # engine_event
//!
//! Typed publish/subscribe for the engine.
//!
//! This crate provides:
//!
//! - [`GameEvent`] / [`AnyEvent`] — the event marker and its erased form.
//! - [`GameEventListener`] — the receiver capability, plus closure adapters.
//! - [`GameEventDispatcher`] — per-type and global listener lists, dispatcher
//!   forwarding, and a pre-dispatch [`DispatcherDelegate`].
//! - [`EventListenerKey`] — revocable, shareable subscription handles.

pub mod dispatcher;
pub mod event;
pub mod key;
pub mod listener;

pub use dispatcher::{DispatcherDelegate, GameEventDispatcher};
pub use event::{AnyEvent, EventTypeId, GameEvent};
pub use key::{DispatcherId, EventListenerKey};
pub use listener::{AnyFnListener, FnListener, GameEventListener};
