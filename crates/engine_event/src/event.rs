//! The [`GameEvent`] marker and its type-erased form.
//!
//! Every event kind provides a process-stable name. The dispatcher buckets
//! listeners by the [`EventTypeId`] derived from that name, so two event kinds
//! declaring the same name will be delivered to each other's listeners.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Dispatch bucket identifier for an event kind, the FNV-1a 64-bit hash of
/// its [`GameEvent::type_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EventTypeId(pub u64);

impl EventTypeId {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Hash an event name with FNV-1a 64-bit.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    #[must_use]
    pub fn of<E: GameEvent>() -> Self {
        Self::from_name(E::type_name())
    }
}

impl fmt::Display for EventTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Marker trait for anything that can be dispatched.
///
/// ```rust
/// use engine_event::GameEvent;
///
/// struct PlayerDied {
///     player: u64,
/// }
///
/// impl GameEvent for PlayerDied {
///     fn type_name() -> &'static str { "PlayerDied" }
/// }
/// ```
pub trait GameEvent: Any {
    /// A process-stable name for this event kind.
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn event_type_id() -> EventTypeId
    where
        Self: Sized,
    {
        EventTypeId::from_name(Self::type_name())
    }
}

/// Object-safe view of a [`GameEvent`], which is what listeners receive.
pub trait AnyEvent: Any {
    fn event_type(&self) -> EventTypeId;

    fn event_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

impl<E: GameEvent> AnyEvent for E {
    fn event_type(&self) -> EventTypeId {
        E::event_type_id()
    }

    fn event_name(&self) -> &'static str {
        E::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn AnyEvent {
    #[must_use]
    pub fn is<E: GameEvent>(&self) -> bool {
        self.as_any().is::<E>()
    }

    #[must_use]
    pub fn downcast_ref<E: GameEvent>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }
}

impl fmt::Debug for dyn AnyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.event_name())
            .field("type_id", &self.event_type())
            .finish()
    }
}
