//! Revocable subscription handles.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::event::EventTypeId;

/// Identifies one [`GameEventDispatcher`](crate::GameEventDispatcher).
///
/// Keys remember the dispatcher that issued them so they can never act on a
/// different one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatcherId(Uuid);

impl DispatcherId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DispatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The listener list a registration lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Bucket {
    /// Listeners that receive every event.
    Global,
    Event(EventTypeId),
}

/// Handle to a single listener registration.
///
/// Clones share one validity flag. Once the registration is removed, or the
/// issuing dispatcher is dropped, every clone reports [`is_valid`] as `false`
/// forever. Holding or discarding a key never requires a check by the caller.
///
/// [`is_valid`]: EventListenerKey::is_valid
#[derive(Clone)]
pub struct EventListenerKey {
    dispatcher: DispatcherId,
    bucket: Bucket,
    value: u64,
    valid: Rc<Cell<bool>>,
}

impl EventListenerKey {
    pub(crate) fn new(dispatcher: DispatcherId, bucket: Bucket, value: u64) -> Self {
        Self {
            dispatcher,
            bucket,
            value,
            valid: Rc::new(Cell::new(true)),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    /// The dispatcher that issued this key.
    #[must_use]
    pub fn dispatcher(&self) -> DispatcherId {
        self.dispatcher
    }

    /// The event type this key listens to, or `None` for a global listener.
    #[must_use]
    pub fn event_type(&self) -> Option<EventTypeId> {
        match self.bucket {
            Bucket::Global => None,
            Bucket::Event(event_type) => Some(event_type),
        }
    }

    /// Numeric value, unique among live keys of the same bucket.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    pub(crate) fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub(crate) fn invalidate(&self) {
        self.valid.set(false);
    }
}

impl PartialEq for EventListenerKey {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.valid, &other.valid)
    }
}

impl Eq for EventListenerKey {}

impl fmt::Debug for EventListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListenerKey")
            .field("dispatcher", &self.dispatcher)
            .field("event_type", &self.event_type())
            .field("value", &self.value)
            .field("valid", &self.is_valid())
            .finish()
    }
}
