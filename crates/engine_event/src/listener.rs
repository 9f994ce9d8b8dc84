//! Receivers of dispatched events.

use std::marker::PhantomData;

use crate::event::{AnyEvent, GameEvent};

/// Anything that can receive events from a
/// [`GameEventDispatcher`](crate::GameEventDispatcher).
///
/// Delivery goes through a shared reference; listeners that accumulate state
/// keep it behind `Cell`/`RefCell`.
pub trait GameEventListener {
    fn receive_event(&self, event: &dyn AnyEvent);
}

/// Adapts a closure over one concrete event type into a listener.
///
/// Events of any other type are ignored, which only matters when the listener
/// is registered as a global listener.
pub struct FnListener<E, F> {
    handler: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    E: GameEvent,
    F: Fn(&E),
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _event: PhantomData,
        }
    }
}

impl<E, F> GameEventListener for FnListener<E, F>
where
    E: GameEvent,
    F: Fn(&E),
{
    fn receive_event(&self, event: &dyn AnyEvent) {
        if let Some(event) = event.downcast_ref::<E>() {
            (self.handler)(event);
        }
    }
}

/// Adapts a closure over type-erased events into a listener.
pub struct AnyFnListener<F> {
    handler: F,
}

impl<F: Fn(&dyn AnyEvent)> AnyFnListener<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F: Fn(&dyn AnyEvent)> GameEventListener for AnyFnListener<F> {
    fn receive_event(&self, event: &dyn AnyEvent) {
        (self.handler)(event);
    }
}
