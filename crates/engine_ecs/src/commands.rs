//! Deferred space mutations.
//!
//! Subspace hooks run while their space is mid-mutation, so they cannot
//! borrow the space again. They queue changes on a [`SpaceCommands`] handle
//! instead. The space applies the queue, in order, once the current
//! notification round is over; commands queued while applying are applied in
//! the same pass.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use engine_component::{AnyComponent, Component};

use crate::entity::{Entity, EntityRef};

type ComponentFilter = Box<dyn Fn(&dyn AnyComponent) -> bool>;

pub(crate) enum Command {
    AddEntity(EntityRef),
    RemoveEntity(EntityRef),
    AddComponent(EntityRef, Box<dyn AnyComponent>),
    RemoveComponent(EntityRef, ComponentFilter),
}

/// Cloneable queue of mutations for one space.
///
/// Obtain it from [`Space::commands`](crate::space::Space::commands). Each
/// queued command behaves exactly like the space method of the same name,
/// including its no-op cases.
#[derive(Clone, Default)]
pub struct SpaceCommands {
    queue: Rc<RefCell<VecDeque<Command>>>,
}

impl SpaceCommands {
    /// Wrap `entity` in a handle now and queue adding it.
    pub fn spawn(&self, entity: Entity) -> EntityRef {
        let entity = EntityRef::new(entity);
        self.add_entity(&entity);
        entity
    }

    pub fn add_entity(&self, entity: &EntityRef) {
        self.push(Command::AddEntity(entity.clone()));
    }

    pub fn remove_entity(&self, entity: &EntityRef) {
        self.push(Command::RemoveEntity(entity.clone()));
    }

    pub fn add_component<T: Component>(&self, component: T, entity: &EntityRef) {
        self.push(Command::AddComponent(entity.clone(), Box::new(component)));
    }

    /// Queue removing the earliest-added component of type `T`.
    pub fn remove_component<T: Component>(&self, entity: &EntityRef) {
        self.push(Command::RemoveComponent(
            entity.clone(),
            Box::new(|c| c.is::<T>()),
        ));
    }

    /// Number of commands waiting to be applied.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    fn push(&self, command: Command) {
        self.queue.borrow_mut().push_back(command);
    }

    pub(crate) fn pop(&self) -> Option<Command> {
        self.queue.borrow_mut().pop_front()
    }
}

impl fmt::Debug for SpaceCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceCommands")
            .field("pending", &self.len())
            .finish()
    }
}
