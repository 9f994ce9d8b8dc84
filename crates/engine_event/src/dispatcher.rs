//! Keyed publish/subscribe bus.
//!
//! A [`GameEventDispatcher`] keeps one ordered listener list per event type
//! plus one list of global listeners. Dispatch delivers to the typed list
//! first, then to the global list, each in registration order.
//!
//! A dispatcher is itself a [`GameEventListener`], so dispatchers can be
//! chained: registering dispatcher `B` on dispatcher `A` re-dispatches every
//! event `A` delivers to it into `B`. Only direct self-registration is
//! rejected. Longer cycles (`A -> B -> A`) are not detected and recurse
//! until the stack overflows.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, trace};

use crate::event::{AnyEvent, EventTypeId, GameEvent};
use crate::key::{Bucket, DispatcherId, EventListenerKey};
use crate::listener::{AnyFnListener, FnListener, GameEventListener};

/// Receives a callback right before a dispatcher delivers an event.
///
/// The callback fires for every dispatch, including those with no listeners.
pub trait DispatcherDelegate {
    fn will_dispatch_event(&self, dispatcher: &GameEventDispatcher, event: &dyn AnyEvent);
}

#[derive(Clone)]
struct Registration {
    listener: Rc<dyn GameEventListener>,
    key: EventListenerKey,
}

impl Registration {
    fn is_listener<L: ?Sized>(&self, listener: &Rc<L>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.listener), Rc::as_ptr(listener))
    }
}

/// Typed event bus with revocable subscriptions.
///
/// All methods take `&self`: listeners may add or remove registrations, or
/// dispatch further events, while a dispatch is in progress. Each dispatch
/// phase works on a snapshot of its listener list; registrations removed
/// mid-dispatch are skipped, registrations added mid-dispatch are first
/// reached by the next dispatch.
pub struct GameEventDispatcher {
    id: DispatcherId,
    buckets: RefCell<HashMap<Bucket, Vec<Registration>>>,
    delegate: RefCell<Option<Weak<dyn DispatcherDelegate>>>,
}

impl GameEventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DispatcherId::new(),
            buckets: RefCell::new(HashMap::new()),
            delegate: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> DispatcherId {
        self.id
    }

    // -- Delegate --

    /// Install the delegate notified before each dispatch.
    ///
    /// The dispatcher never keeps its delegate alive.
    pub fn set_delegate(&self, delegate: Weak<dyn DispatcherDelegate>) {
        *self.delegate.borrow_mut() = Some(delegate);
    }

    pub fn clear_delegate(&self) {
        *self.delegate.borrow_mut() = None;
    }

    fn delegate(&self) -> Option<Rc<dyn DispatcherDelegate>> {
        self.delegate.borrow().as_ref().and_then(Weak::upgrade)
    }

    // -- Registration --

    /// Register `listener` for events of type `E`.
    ///
    /// # Panics
    ///
    /// Panics if `listener` is this dispatcher.
    pub fn add_listener<E, L>(&self, listener: Rc<L>) -> EventListenerKey
    where
        E: GameEvent,
        L: GameEventListener + 'static,
    {
        self.add_listener_for_type(E::event_type_id(), listener)
    }

    /// Register `listener` for the event type identified by `event_type`.
    ///
    /// # Panics
    ///
    /// Panics if `listener` is this dispatcher.
    pub fn add_listener_for_type<L>(
        &self,
        event_type: EventTypeId,
        listener: Rc<L>,
    ) -> EventListenerKey
    where
        L: GameEventListener + 'static,
    {
        self.register(Bucket::Event(event_type), listener)
    }

    /// Register `listener` to receive every event, after the typed listeners.
    ///
    /// # Panics
    ///
    /// Panics if `listener` is this dispatcher.
    pub fn add_listener_for_all_events<L>(&self, listener: Rc<L>) -> EventListenerKey
    where
        L: GameEventListener + 'static,
    {
        self.register(Bucket::Global, listener)
    }

    /// Register a closure for events of type `E`.
    pub fn subscribe<E, F>(&self, handler: F) -> EventListenerKey
    where
        E: GameEvent,
        F: Fn(&E) + 'static,
    {
        self.add_listener::<E, _>(Rc::new(FnListener::new(handler)))
    }

    /// Register a closure that receives every event.
    pub fn subscribe_all<F>(&self, handler: F) -> EventListenerKey
    where
        F: Fn(&dyn AnyEvent) + 'static,
    {
        self.add_listener_for_all_events(Rc::new(AnyFnListener::new(handler)))
    }

    fn register<L>(&self, bucket: Bucket, listener: Rc<L>) -> EventListenerKey
    where
        L: GameEventListener + 'static,
    {
        let is_self = std::ptr::addr_eq(Rc::as_ptr(&listener), self as *const Self);
        if is_self {
            error!(dispatcher = %self.id, "dispatcher registered as its own listener");
        }
        assert!(
            !is_self,
            "GameEventDispatcher cannot be registered as a listener of itself"
        );

        let mut buckets = self.buckets.borrow_mut();
        let list = buckets.entry(bucket).or_default();
        let value = list
            .iter()
            .map(|registration| registration.key.value())
            .max()
            .map_or(0, |max| max + 1);
        let key = EventListenerKey::new(self.id, bucket, value);
        list.push(Registration {
            listener,
            key: key.clone(),
        });

        debug!(
            dispatcher = %self.id,
            event_type = ?key.event_type(),
            key = value,
            "listener added"
        );
        key
    }

    // -- Removal --

    /// Remove the registration identified by `key` and invalidate it.
    ///
    /// Invalid keys and keys issued by another dispatcher are ignored.
    pub fn remove_listener_for_key(&self, key: &EventListenerKey) {
        if !key.is_valid() || key.dispatcher() != self.id {
            return;
        }

        let removed = {
            let mut buckets = self.buckets.borrow_mut();
            let Some(list) = buckets.get_mut(&key.bucket()) else {
                return;
            };
            let removed = list
                .iter()
                .position(|registration| registration.key == *key)
                .map(|pos| list.remove(pos));
            if list.is_empty() {
                buckets.remove(&key.bucket());
            }
            removed
        };

        if let Some(registration) = removed {
            registration.key.invalidate();
            debug!(
                dispatcher = %self.id,
                event_type = ?key.event_type(),
                key = key.value(),
                "listener removed"
            );
        }
    }

    /// Remove every registration of `listener` for events of type `E`.
    pub fn remove_listener_for<E, L>(&self, listener: &Rc<L>)
    where
        E: GameEvent,
        L: ?Sized,
    {
        self.remove_where(|bucket, registration| {
            bucket == Bucket::Event(E::event_type_id()) && registration.is_listener(listener)
        });
    }

    /// Remove every registration of `listener`, typed and global.
    pub fn remove_listener<L: ?Sized>(&self, listener: &Rc<L>) {
        self.remove_where(|_, registration| registration.is_listener(listener));
    }

    /// Remove every registration and invalidate every issued key.
    pub fn remove_all_listeners(&self) {
        self.remove_where(|_, _| true);
    }

    fn remove_where<F>(&self, mut predicate: F)
    where
        F: FnMut(Bucket, &Registration) -> bool,
    {
        let mut removed = Vec::new();
        {
            let mut buckets = self.buckets.borrow_mut();
            for (&bucket, list) in buckets.iter_mut() {
                let mut kept = Vec::with_capacity(list.len());
                for registration in list.drain(..) {
                    if predicate(bucket, &registration) {
                        removed.push(registration);
                    } else {
                        kept.push(registration);
                    }
                }
                *list = kept;
            }
            buckets.retain(|_, list| !list.is_empty());
        }

        for registration in &removed {
            registration.key.invalidate();
        }
        if !removed.is_empty() {
            debug!(dispatcher = %self.id, count = removed.len(), "listeners removed");
        }
    }

    // -- Queries --

    /// Total number of registrations, typed and global.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.buckets.borrow().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn listener_count_for<E: GameEvent>(&self) -> usize {
        self.bucket_len(Bucket::Event(E::event_type_id()))
    }

    #[must_use]
    pub fn global_listener_count(&self) -> usize {
        self.bucket_len(Bucket::Global)
    }

    fn bucket_len(&self, bucket: Bucket) -> usize {
        self.buckets.borrow().get(&bucket).map_or(0, Vec::len)
    }

    // -- Dispatch --

    /// Deliver `event` to its typed listeners, then to the global listeners.
    pub fn dispatch_event<E: GameEvent>(&self, event: &E) {
        self.dispatch_dyn(event);
    }

    /// Type-erased form of [`dispatch_event`](Self::dispatch_event).
    pub fn dispatch_dyn(&self, event: &dyn AnyEvent) {
        if let Some(delegate) = self.delegate() {
            delegate.will_dispatch_event(self, event);
        }

        trace!(dispatcher = %self.id, event = event.event_name(), "dispatching event");

        for bucket in [Bucket::Event(event.event_type()), Bucket::Global] {
            for registration in self.snapshot(bucket) {
                if registration.key.is_valid() {
                    registration.listener.receive_event(event);
                }
            }
        }
    }

    fn snapshot(&self, bucket: Bucket) -> Vec<Registration> {
        self.buckets
            .borrow()
            .get(&bucket)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for GameEventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventListener for GameEventDispatcher {
    fn receive_event(&self, event: &dyn AnyEvent) {
        self.dispatch_dyn(event);
    }
}

impl Drop for GameEventDispatcher {
    fn drop(&mut self) {
        for registration in self.buckets.get_mut().values().flatten() {
            registration.key.invalidate();
        }
    }
}

impl fmt::Debug for GameEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEventDispatcher")
            .field("id", &self.id)
            .field("listeners", &self.listener_count())
            .field("global_listeners", &self.global_listener_count())
            .finish()
    }
}
