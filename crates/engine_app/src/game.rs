//! The composition root.
//!
//! A [`Game`] holds the ordered space and system lists and a game-level
//! event dispatcher. Every attached space's dispatcher is registered as a
//! global listener of the game's dispatcher, so game-level events reach every
//! space. Spaces must not forward events back up into the game dispatcher;
//! that loop is not detected.
//!
//! The game installs itself as its dispatcher's delegate: every game-level
//! dispatch is traced and counted before any listener runs, including
//! dispatches nobody listens to.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use engine_ecs::Space;
use engine_event::{AnyEvent, DispatcherDelegate, GameEvent, GameEventDispatcher};
use engine_system::System;
use tracing::{debug, trace};

struct RegisteredSystem {
    type_id: TypeId,
    name: &'static str,
    system: Box<dyn System>,
}

/// Pre-dispatch hook installed on the game dispatcher.
#[derive(Default)]
struct DispatchMonitor {
    dispatched: Cell<u64>,
}

impl DispatcherDelegate for DispatchMonitor {
    fn will_dispatch_event(&self, dispatcher: &GameEventDispatcher, event: &dyn AnyEvent) {
        self.dispatched.set(self.dispatched.get() + 1);
        trace!(
            dispatcher = %dispatcher.id(),
            event = event.event_name(),
            dispatched = self.dispatched.get(),
            "game event"
        );
    }
}

/// Spaces, systems, and the event bus that ties them together.
pub struct Game {
    spaces: Vec<Rc<RefCell<Space>>>,
    systems: Vec<RegisteredSystem>,
    event_dispatcher: Rc<GameEventDispatcher>,
    // The dispatcher only holds a weak reference.
    monitor: Rc<DispatchMonitor>,
}

impl Game {
    #[must_use]
    pub fn new() -> Self {
        let event_dispatcher = Rc::new(GameEventDispatcher::new());
        let monitor = Rc::new(DispatchMonitor::default());
        let weak: Weak<DispatchMonitor> = Rc::downgrade(&monitor);
        event_dispatcher.set_delegate(weak);
        Self {
            spaces: Vec::new(),
            systems: Vec::new(),
            event_dispatcher,
            monitor,
        }
    }

    #[must_use]
    pub fn event_dispatcher(&self) -> &Rc<GameEventDispatcher> {
        &self.event_dispatcher
    }

    /// Dispatch `event` on the game dispatcher, and through it into every
    /// attached space.
    pub fn dispatch_event<E: GameEvent>(&self, event: &E) {
        self.event_dispatcher.dispatch_event(event);
    }

    /// Events dispatched on the game dispatcher so far, whether or not
    /// anything was listening.
    #[must_use]
    pub fn dispatched_event_count(&self) -> u64 {
        self.monitor.dispatched.get()
    }

    // -- Spaces --

    /// Attached spaces, in attach order.
    #[must_use]
    pub fn spaces(&self) -> &[Rc<RefCell<Space>>] {
        &self.spaces
    }

    /// Attach `space` and wire its dispatcher under the game's.
    ///
    /// Attaching a space that is already attached does nothing.
    pub fn add_space(&mut self, space: &Rc<RefCell<Space>>) {
        if self.space_position(space).is_some() {
            return;
        }
        let space_dispatcher = Rc::clone(space.borrow().event_dispatcher());
        self.event_dispatcher
            .add_listener_for_all_events(space_dispatcher);
        self.spaces.push(Rc::clone(space));
        debug!(space = %space.borrow().id(), spaces = self.spaces.len(), "space added to game");
    }

    /// Detach `space` and unwire its dispatcher. Returns `false` if it was
    /// not attached.
    pub fn remove_space(&mut self, space: &Rc<RefCell<Space>>) -> bool {
        let Some(pos) = self.space_position(space) else {
            return false;
        };
        self.spaces.remove(pos);
        self.event_dispatcher
            .remove_listener(space.borrow().event_dispatcher());
        debug!(space = %space.borrow().id(), spaces = self.spaces.len(), "space removed from game");
        true
    }

    /// The attached spaces that are currently active, in attach order.
    #[must_use]
    pub fn active_spaces(&self) -> Vec<Rc<RefCell<Space>>> {
        self.spaces
            .iter()
            .filter(|space| space.borrow().is_active())
            .cloned()
            .collect()
    }

    fn space_position(&self, space: &Rc<RefCell<Space>>) -> Option<usize> {
        self.spaces.iter().position(|s| Rc::ptr_eq(s, space))
    }

    // -- Systems --

    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Append `system`. Several systems of the same type may coexist.
    pub fn add_system<S: System>(&mut self, system: S) {
        let name = std::any::type_name::<S>();
        self.systems.push(RegisteredSystem {
            type_id: TypeId::of::<S>(),
            name,
            system: Box::new(system),
        });
        debug!(system = name, systems = self.systems.len(), "system added");
    }

    /// Append `system` unless one of the same type is already registered.
    ///
    /// Returns whether it was added.
    pub fn add_system_once<S: System>(&mut self, system: S) -> bool {
        if self.has_system::<S>() {
            return false;
        }
        self.add_system(system);
        true
    }

    #[must_use]
    pub fn has_system<S: System>(&self) -> bool {
        self.systems.iter().any(|s| s.type_id == TypeId::of::<S>())
    }

    /// Remove every system of type `S`, returning how many were removed.
    pub fn remove_systems<S: System>(&mut self) -> usize {
        let before = self.systems.len();
        self.systems.retain(|s| s.type_id != TypeId::of::<S>());
        let removed = before - self.systems.len();
        if removed > 0 {
            debug!(system = std::any::type_name::<S>(), removed, "systems removed");
        }
        removed
    }

    // -- Frame hooks --

    /// Run every system's multi-space update over the active spaces.
    ///
    /// `interval` is passed through unchanged.
    pub fn update(&mut self, interval: f64) {
        let active = self.active_spaces();
        trace!(interval, spaces = active.len(), "update");
        for registered in &mut self.systems {
            trace!(system = registered.name, "system update");
            registered.system.update_spaces(&active, interval);
        }
    }

    /// Run every system's multi-space render over the active spaces.
    pub fn render(&mut self, interval: f64) {
        let active = self.active_spaces();
        trace!(interval, spaces = active.len(), "render");
        for registered in &mut self.systems {
            registered.system.render_spaces(&active, interval);
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("spaces", &self.spaces.len())
            .field(
                "systems",
                &self.systems.iter().map(|s| s.name).collect::<Vec<_>>(),
            )
            .field("event_dispatcher", &self.event_dispatcher)
            .field("dispatched", &self.dispatched_event_count())
            .finish()
    }
}
