//! Spaces: isolated simulation regions.
//!
//! A [`Space`] owns an ordered entity list, an ordered subspace list, and a
//! private event dispatcher. It is the only place the component list of an
//! entity can change, so every mutation funnels through here and is fanned
//! out to the subspaces:
//!
//! 1. `will_*` hook on every subspace (pre-mutation state).
//! 2. The mutation itself.
//! 3. [`manage_entity`](crate::subspace::Subspace::manage_entity) with the
//!    affected entity on every subspace.
//! 4. Commands queued by hooks on [`SpaceCommands`] are applied.
//!
//! An entity belongs to at most one space. Adding an entity that belongs to
//! another space, or changing the components of an entity this space does
//! not own, is ignored. To move an entity, remove it from its space first.
//!
//! Mutations that find nothing to do return before step 1. None of these
//! operations fail: removing something absent or re-adding something present
//! is a silent no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use engine_component::{AnyComponent, Component};
use engine_event::GameEventDispatcher;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::commands::{Command, SpaceCommands};
use crate::entity::{Entity, EntityRef};
use crate::subspace::{AnySubspace, SubspaceHooks, SubspaceRef};

/// Identifies one [`Space`]. Subspaces and entities refer back to their
/// space by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceId(Uuid);

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type SubspaceHandle = Rc<RefCell<dyn AnySubspace>>;

fn same_subspace(a: &SubspaceHandle, b: &SubspaceHandle) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// An isolated set of entities and the subspaces viewing them.
pub struct Space {
    id: SpaceId,
    active: bool,
    entities: Vec<EntityRef>,
    /// May hold stale entries for subspaces since attached elsewhere; they
    /// are pruned before use.
    subspaces: Vec<SubspaceHandle>,
    commands: SpaceCommands,
    event_dispatcher: Rc<GameEventDispatcher>,
}

impl Space {
    /// An empty, active space.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SpaceId(Uuid::new_v4()),
            active: true,
            entities: Vec::new(),
            subspaces: Vec::new(),
            commands: SpaceCommands::default(),
            event_dispatcher: Rc::new(GameEventDispatcher::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> SpaceId {
        self.id
    }

    /// Inactive spaces are skipped by the game's update and render passes but
    /// can still be mutated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// This space's private dispatcher.
    #[must_use]
    pub fn event_dispatcher(&self) -> &Rc<GameEventDispatcher> {
        &self.event_dispatcher
    }

    /// A handle for queueing mutations from inside subspace hooks.
    #[must_use]
    pub fn commands(&self) -> SpaceCommands {
        self.commands.clone()
    }

    /// Apply every queued command, including those queued while applying.
    ///
    /// Every mutating method already does this before returning. Call it
    /// directly after [`Subspace::set_selector`](crate::subspace::Subspace::set_selector)
    /// or after queueing from outside a hook. Returns how many commands ran.
    pub fn apply_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Some(command) = self.commands.pop() {
            match command {
                Command::AddEntity(entity) => {
                    self.insert_entity(&entity);
                }
                Command::RemoveEntity(entity) => {
                    self.take_entity(&entity);
                }
                Command::AddComponent(entity, component) => {
                    self.push_component(component, &entity);
                }
                Command::RemoveComponent(entity, filter) => {
                    self.take_first_component(&entity, |c| filter(c));
                }
            }
            applied += 1;
        }
        if applied > 0 {
            debug!(space = %self.id, applied, "queued commands applied");
        }
        applied
    }

    // -- Entities --

    /// All entities, in insertion order.
    #[must_use]
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    /// Returns `true` if `entity` belongs to this space.
    #[must_use]
    pub fn contains_entity(&self, entity: &EntityRef) -> bool {
        self.entity_position(entity).is_some()
    }

    /// Wrap `entity` in a handle and add it to this space.
    pub fn spawn(&mut self, entity: Entity) -> EntityRef {
        let entity = EntityRef::new(entity);
        self.add_entity(&entity);
        entity
    }

    /// Add `entity` and classify it into every subspace.
    ///
    /// Returns `false`, changing nothing, if the entity already belongs to
    /// this or any other space.
    pub fn add_entity(&mut self, entity: &EntityRef) -> bool {
        let added = self.insert_entity(entity);
        self.apply_commands();
        added
    }

    /// Remove `entity` from this space and from every subspace holding it.
    ///
    /// The entity itself stays alive with its components intact, free to
    /// join another space. Returns `true` if it was present.
    pub fn remove_entity(&mut self, entity: &EntityRef) -> bool {
        let removed = self.take_entity(entity);
        self.apply_commands();
        removed
    }

    fn insert_entity(&mut self, entity: &EntityRef) -> bool {
        let owner = entity.borrow().space();
        match owner {
            Some(owner) if owner == self.id => return false,
            Some(owner) => {
                warn!(
                    space = %self.id,
                    owner = %owner,
                    entity = entity.borrow().id,
                    "entity belongs to another space; not added"
                );
                return false;
            }
            None => {}
        }

        entity.borrow_mut().set_space(Some(self.id));
        self.entities.push(entity.clone());
        debug!(space = %self.id, entity = entity.borrow().id, "entity added");

        for subspace in self.live_subspaces() {
            subspace.borrow_mut().manage_entity(entity);
        }
        true
    }

    fn take_entity(&mut self, entity: &EntityRef) -> bool {
        let Some(pos) = self.entity_position(entity) else {
            return false;
        };
        self.entities.remove(pos);
        entity.borrow_mut().set_space(None);
        debug!(space = %self.id, entity = entity.borrow().id, "entity removed");

        for subspace in self.live_subspaces() {
            subspace.borrow_mut().forget_entity(entity);
        }
        true
    }

    fn entity_position(&self, entity: &EntityRef) -> Option<usize> {
        self.entities.iter().position(|e| e.ptr_eq(entity))
    }

    // -- Components --

    /// Append `component` to `entity`'s component list.
    ///
    /// Returns `false`, dropping the component, if `entity` does not belong
    /// to this space.
    pub fn add_component<T: Component>(&mut self, component: T, entity: &EntityRef) -> bool {
        self.add_boxed_component(Box::new(component), entity)
    }

    /// Type-erased form of [`add_component`](Self::add_component).
    pub fn add_boxed_component(
        &mut self,
        component: Box<dyn AnyComponent>,
        entity: &EntityRef,
    ) -> bool {
        let added = self.push_component(component, entity);
        self.apply_commands();
        added
    }

    /// Remove the earliest-added component of type `T` from `entity`.
    pub fn remove_component<T: Component>(&mut self, entity: &EntityRef) -> Option<T> {
        self.remove_first_component(entity, |c| c.is::<T>())
            .and_then(|removed| removed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Remove every component of type `T` from `entity`, one at a time.
    ///
    /// Returns how many were removed.
    pub fn remove_components<T: Component>(&mut self, entity: &EntityRef) -> usize {
        let mut removed = 0;
        while self.remove_component::<T>(entity).is_some() {
            removed += 1;
        }
        removed
    }

    /// Remove the earliest-added component of `entity` matching `predicate`.
    ///
    /// When nothing matches, or `entity` does not belong to this space, no
    /// hook fires and no subspace is re-tested.
    pub fn remove_first_component<F>(
        &mut self,
        entity: &EntityRef,
        predicate: F,
    ) -> Option<Box<dyn AnyComponent>>
    where
        F: FnMut(&dyn AnyComponent) -> bool,
    {
        let removed = self.take_first_component(entity, predicate);
        self.apply_commands();
        removed
    }

    fn push_component(&mut self, component: Box<dyn AnyComponent>, entity: &EntityRef) -> bool {
        if !self.contains_entity(entity) {
            debug!(
                space = %self.id,
                component = component.component_name(),
                "component not added: entity not in space"
            );
            return false;
        }
        let subspaces = self.live_subspaces();

        {
            let current = entity.borrow();
            for subspace in &subspaces {
                subspace
                    .borrow_mut()
                    .will_add_component(&current, component.as_ref());
            }
        }

        entity.borrow_mut().push_component(component);

        for subspace in &subspaces {
            subspace.borrow_mut().manage_entity(entity);
        }
        true
    }

    fn take_first_component<F>(
        &mut self,
        entity: &EntityRef,
        mut predicate: F,
    ) -> Option<Box<dyn AnyComponent>>
    where
        F: FnMut(&dyn AnyComponent) -> bool,
    {
        if !self.contains_entity(entity) {
            return None;
        }
        let index = entity
            .borrow()
            .components()
            .iter()
            .position(|c| predicate(c.as_ref()))?;
        let subspaces = self.live_subspaces();

        {
            let current = entity.borrow();
            let component = current.components()[index].as_ref();
            for subspace in &subspaces {
                subspace
                    .borrow_mut()
                    .will_remove_component(&current, component);
            }
        }

        let removed = entity.borrow_mut().remove_component_at(index);

        for subspace in &subspaces {
            subspace.borrow_mut().manage_entity(entity);
        }
        Some(removed)
    }

    // -- Subspaces --

    /// Subspaces currently attached to this space, in attach order.
    #[must_use]
    pub fn subspaces(&self) -> Vec<Rc<RefCell<dyn AnySubspace>>> {
        self.subspaces
            .iter()
            .filter(|s| s.borrow().space() == Some(self.id))
            .cloned()
            .collect()
    }

    /// Attach `subspace` and reload it from this space's entities.
    ///
    /// A subspace attached to another space is moved here. Adding a subspace
    /// already attached to this space does nothing.
    pub fn add_subspace<H: SubspaceHooks>(&mut self, subspace: &SubspaceRef<H>) {
        let handle: SubspaceHandle = subspace.clone();
        let owner = handle.borrow().space();

        if owner == Some(self.id) && self.subspaces.iter().any(|s| same_subspace(s, &handle)) {
            return;
        }

        self.subspaces.retain(|s| !same_subspace(s, &handle));
        handle.borrow_mut().attach(self.id, &self.entities);
        debug!(
            space = %self.id,
            previous = ?owner,
            members = handle.borrow().entities().len(),
            "subspace attached"
        );
        self.subspaces.push(handle);
        self.apply_commands();
    }

    /// Detach `subspace` from this space, emptying it.
    ///
    /// Returns `false` if it was not attached here.
    pub fn remove_subspace<H: SubspaceHooks>(&mut self, subspace: &SubspaceRef<H>) -> bool {
        let handle: SubspaceHandle = subspace.clone();
        let Some(pos) = self.subspaces.iter().position(|s| same_subspace(s, &handle)) else {
            return false;
        };
        self.subspaces.remove(pos);

        if handle.borrow().space() != Some(self.id) {
            return false;
        }
        handle.borrow_mut().detach();
        debug!(space = %self.id, "subspace detached");
        self.apply_commands();
        true
    }

    /// Drop stale entries and return the subspaces to notify.
    fn live_subspaces(&mut self) -> Vec<SubspaceHandle> {
        let id = self.id;
        self.subspaces.retain(|s| s.borrow().space() == Some(id));
        self.subspaces.clone()
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Space {
    fn drop(&mut self) {
        for subspace in &self.subspaces {
            if let Ok(mut subspace) = subspace.try_borrow_mut() {
                if subspace.space() == Some(self.id) {
                    subspace.detach();
                }
            }
        }
        for entity in &self.entities {
            if let Some(mut entity) = entity.try_borrow_mut() {
                entity.set_space(None);
            }
        }
    }
}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Space")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("entities", &self.entities.len())
            .field("subspaces", &self.subspaces().len())
            .field("commands", &self.commands)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::commands::SpaceCommands;
    use crate::selector::EntitySelector;
    use crate::subspace::Subspace;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug)]
    struct Shield;

    impl Component for Shield {
        fn type_name() -> &'static str {
            "Shield"
        }
    }

    /// Records every hook invocation.
    #[derive(Debug, Default)]
    struct Journal {
        events: Vec<String>,
    }

    impl SubspaceHooks for Journal {
        fn entity_added(&mut self, entity: &EntityRef) {
            self.events.push(format!("added {}", entity.borrow().id));
        }

        fn entity_removed(&mut self, entity: &EntityRef) {
            self.events.push(format!("removed {}", entity.borrow().id));
        }

        fn will_add_component(&mut self, entity: &Entity, component: &dyn AnyComponent) {
            self.events.push(format!(
                "will add {} to {} ({} present)",
                component.component_name(),
                entity.id,
                entity.component_count()
            ));
        }

        fn will_remove_component(&mut self, entity: &Entity, component: &dyn AnyComponent) {
            self.events.push(format!(
                "will remove {} from {} ({} present)",
                component.component_name(),
                entity.id,
                entity.component_count()
            ));
        }
    }

    fn journaled(selector: EntitySelector) -> SubspaceRef<Journal> {
        Subspace::with_hooks(selector, Journal::default()).into_shared()
    }

    /// Compares a subspace's incremental membership with a fresh evaluation.
    fn assert_consistent<H: SubspaceHooks>(space: &Space, subspace: &SubspaceRef<H>) {
        let subspace = subspace.borrow();
        let expected: Vec<EntityRef> = subspace
            .selector()
            .select(space.entities())
            .cloned()
            .collect();
        let actual = subspace.entities();
        assert_eq!(actual.len(), expected.len());
        assert!(expected.iter().all(|e| actual.contains(e)));
    }

    #[test]
    fn test_new_space_defaults() {
        let space = Space::new();
        assert!(space.is_active());
        assert!(space.entities().is_empty());
        assert!(space.subspaces().is_empty());
        assert_eq!(space.event_dispatcher().listener_count(), 0);
    }

    #[test]
    fn test_add_entity_twice_is_noop() {
        let mut space = Space::new();
        let subspace = journaled(EntitySelector::Any);
        space.add_subspace(&subspace);

        let entity = EntityRef::new(Entity::empty().with_id(1));
        assert!(space.add_entity(&entity));
        assert!(!space.add_entity(&entity));
        assert_eq!(space.entities().len(), 1);
        assert_eq!(subspace.borrow().hooks().events, vec!["added 1"]);
    }

    #[test]
    fn test_entities_keep_insertion_order() {
        let mut space = Space::new();
        for id in [3, 1, 2] {
            space.spawn(Entity::empty().with_id(id));
        }
        let ids: Vec<u64> = space.entities().iter().map(|e| e.borrow().id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_add_entity_classifies_into_existing_subspace() {
        let mut space = Space::new();
        let subspace = journaled(EntitySelector::component::<Health>());
        space.add_subspace(&subspace);

        space.spawn(Entity::empty().with(Health(1)).with_id(7));
        space.spawn(Entity::empty().with_id(8));
        assert_eq!(subspace.borrow().len(), 1);
        assert_consistent(&space, &subspace);
    }

    #[test]
    fn test_add_component_protocol_order() {
        let mut space = Space::new();
        let subspace = journaled(EntitySelector::component::<Health>());
        space.add_subspace(&subspace);
        let entity = space.spawn(Entity::empty().with_id(4));

        space.add_component(Health(10), &entity);
        assert_eq!(
            subspace.borrow().hooks().events,
            vec!["will add Health to 4 (0 present)", "added 4"]
        );
    }

    #[test]
    fn test_remove_component_protocol_order() {
        let mut space = Space::new();
        let subspace = journaled(EntitySelector::component::<Health>());
        space.add_subspace(&subspace);
        let entity = space.spawn(Entity::empty().with(Health(1)).with_id(4));
        subspace.borrow_mut().hooks_mut().events.clear();

        assert_eq!(space.remove_component::<Health>(&entity), Some(Health(1)));
        assert_eq!(
            subspace.borrow().hooks().events,
            vec!["will remove Health from 4 (1 present)", "removed 4"]
        );
    }

    #[test]
    fn test_remove_missing_component_touches_nothing() {
        let mut space = Space::new();
        let subspace = journaled(EntitySelector::Any);
        space.add_subspace(&subspace);
        let entity = space.spawn(Entity::empty().with(Shield).with_id(2));
        subspace.borrow_mut().hooks_mut().events.clear();

        let tests = Rc::new(Cell::new(0));
        let counter = Rc::clone(&tests);
        subspace.borrow_mut().set_selector(
            EntitySelector::predicate(move |_| {
                counter.set(counter.get() + 1);
                true
            }),
            &space,
        );
        let baseline = tests.get();
        subspace.borrow_mut().hooks_mut().events.clear();

        assert!(space.remove_component::<Health>(&entity).is_none());
        assert_eq!(tests.get(), baseline);
        assert!(subspace.borrow().hooks().events.is_empty());
    }

    #[test]
    fn test_remove_first_component_takes_earliest_match() {
        let mut space = Space::new();
        let entity = space.spawn(Entity::empty().with(Health(1)).with(Shield).with(Health(2)));

        let removed = space.remove_first_component(&entity, |c| c.is::<Health>());
        assert_eq!(
            removed.as_deref().and_then(|c| c.downcast_ref::<Health>()),
            Some(&Health(1))
        );
        assert_eq!(entity.borrow().component::<Health>(), Some(&Health(2)));
    }

    #[test]
    fn test_remove_components_removes_all_of_type() {
        let mut space = Space::new();
        let entity = space.spawn(Entity::empty().with(Health(1)).with(Shield).with(Health(2)));
        assert_eq!(space.remove_components::<Health>(&entity), 2);
        assert_eq!(entity.borrow().component_count(), 1);
        assert_eq!(space.remove_components::<Health>(&entity), 0);
    }

    #[test]
    fn test_remove_entity_is_idempotent() {
        let mut space = Space::new();
        let subspace = journaled(EntitySelector::Any);
        space.add_subspace(&subspace);
        let entity = space.spawn(Entity::empty().with(Health(3)).with_id(9));

        assert!(space.remove_entity(&entity));
        assert!(!space.remove_entity(&entity));
        assert!(space.entities().is_empty());
        assert!(subspace.borrow().is_empty());
        assert_eq!(subspace.borrow().hooks().events, vec!["added 9", "removed 9"]);

        // The orphaned entity keeps its components.
        assert_eq!(entity.borrow().component::<Health>(), Some(&Health(3)));
    }

    #[test]
    fn test_component_change_from_other_space_is_ignored() {
        let mut owner = Space::new();
        let mut other = Space::new();
        let subspace = journaled(EntitySelector::component::<Health>());
        owner.add_subspace(&subspace);
        let entity = owner.spawn(Entity::empty().with_id(5));

        assert!(!other.add_component(Health(1), &entity));
        assert!(!entity.borrow().has_component::<Health>());
        assert!(subspace.borrow().is_empty());

        assert!(owner.add_component(Health(1), &entity));
        assert_eq!(subspace.borrow().len(), 1);

        assert!(other.remove_component::<Health>(&entity).is_none());
        assert_eq!(other.remove_components::<Health>(&entity), 0);
        assert!(entity.borrow().has_component::<Health>());
        assert_eq!(subspace.borrow().len(), 1);
        assert_eq!(
            subspace.borrow().hooks().events,
            vec!["will add Health to 5 (0 present)", "added 5"]
        );
    }

    #[test]
    fn test_component_change_on_free_entity_is_ignored() {
        let mut space = Space::new();
        let subspace = journaled(EntitySelector::Any);
        space.add_subspace(&subspace);

        let stranger = EntityRef::new(Entity::empty());
        assert!(!space.add_component(Health(1), &stranger));
        assert_eq!(stranger.borrow().component_count(), 0);
        assert!(subspace.borrow().hooks().events.is_empty());
    }

    #[test]
    fn test_entity_belongs_to_one_space() {
        let mut first = Space::new();
        let mut second = Space::new();
        let watcher = journaled(EntitySelector::Any);
        first.add_subspace(&watcher);
        let entity = first.spawn(Entity::empty().with_id(3));
        assert_eq!(entity.borrow().space(), Some(first.id()));

        assert!(!second.add_entity(&entity));
        assert!(second.entities().is_empty());
        assert!(!second.remove_entity(&entity));
        assert_eq!(entity.borrow().space(), Some(first.id()));
        assert_eq!(watcher.borrow().len(), 1);

        // Moving is explicit: leave the first space, then join the second.
        assert!(first.remove_entity(&entity));
        assert!(entity.borrow().space().is_none());
        assert!(second.add_entity(&entity));
        assert_eq!(entity.borrow().space(), Some(second.id()));
        assert!(watcher.borrow().is_empty());
        assert_eq!(watcher.borrow().hooks().events, vec!["added 3", "removed 3"]);
    }

    #[test]
    fn test_dropping_space_releases_entities() {
        let entity = {
            let mut space = Space::new();
            space.spawn(Entity::empty())
        };
        assert!(entity.borrow().space().is_none());

        let mut next = Space::new();
        assert!(next.add_entity(&entity));
    }

    /// Spawns a child for every top-level entity that joins.
    struct Breeder {
        commands: SpaceCommands,
        seen: Vec<u64>,
    }

    impl SubspaceHooks for Breeder {
        fn entity_added(&mut self, entity: &EntityRef) {
            let id = entity.borrow().id;
            self.seen.push(id);
            if id < 100 {
                self.commands.spawn(Entity::empty().with_id(id + 100));
            }
        }
    }

    #[test]
    fn test_hook_mutations_are_applied_after_notification() {
        let mut space = Space::new();
        let breeder = Subspace::with_hooks(
            EntitySelector::Any,
            Breeder {
                commands: space.commands(),
                seen: Vec::new(),
            },
        )
        .into_shared();
        space.add_subspace(&breeder);

        space.spawn(Entity::empty().with_id(1));
        space.spawn(Entity::empty().with_id(2));

        let ids: Vec<u64> = space.entities().iter().map(|e| e.borrow().id).collect();
        assert_eq!(ids, vec![1, 101, 2, 102]);
        assert_eq!(breeder.borrow().hooks().seen, vec![1, 101, 2, 102]);
        assert!(space.commands().is_empty());
        assert_consistent(&space, &breeder);
    }

    /// Strips `Health` from anything that gains it.
    struct Nullifier {
        commands: SpaceCommands,
    }

    impl SubspaceHooks for Nullifier {
        fn entity_added(&mut self, entity: &EntityRef) {
            self.commands.remove_component::<Health>(entity);
        }
    }

    #[test]
    fn test_hook_can_undo_the_change_that_triggered_it() {
        let mut space = Space::new();
        let subspace = Subspace::with_hooks(
            EntitySelector::component::<Health>(),
            Nullifier {
                commands: space.commands(),
            },
        )
        .into_shared();
        space.add_subspace(&subspace);
        let entity = space.spawn(Entity::empty());

        space.add_component(Health(1), &entity);
        assert!(!entity.borrow().has_component::<Health>());
        assert!(subspace.borrow().is_empty());
        assert_consistent(&space, &subspace);
    }

    #[test]
    fn test_apply_commands_runs_queue_in_order() {
        let mut space = Space::new();
        let commands = space.commands();
        let entity = commands.spawn(Entity::empty().with_id(8));
        commands.add_component(Health(2), &entity);
        commands.add_component(Shield, &entity);
        commands.remove_component::<Health>(&entity);
        assert_eq!(commands.len(), 4);
        assert!(space.entities().is_empty());

        assert_eq!(space.apply_commands(), 4);
        assert_eq!(space.apply_commands(), 0);
        assert!(space.contains_entity(&entity));
        let entity = entity.borrow();
        assert_eq!(entity.component_count(), 1);
        assert!(entity.has_component::<Shield>());
    }

    #[test]
    fn test_add_subspace_reloads_existing_entities() {
        let mut space = Space::new();
        space.spawn(Entity::empty().with(Health(1)).with_id(1));
        space.spawn(Entity::empty().with_id(2));
        space.spawn(Entity::empty().with(Health(1)).with_id(3));

        let subspace = journaled(EntitySelector::component::<Health>());
        space.add_subspace(&subspace);
        let ids: Vec<u64> = subspace
            .borrow()
            .entities()
            .iter()
            .map(|e| e.borrow().id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(subspace.borrow().space(), Some(space.id()));
    }

    #[test]
    fn test_add_subspace_twice_is_noop() {
        let mut space = Space::new();
        space.spawn(Entity::empty().with_id(1));
        let subspace = journaled(EntitySelector::Any);
        space.add_subspace(&subspace);
        space.add_subspace(&subspace);
        assert_eq!(space.subspaces().len(), 1);
        assert_eq!(subspace.borrow().hooks().events, vec!["added 1"]);
    }

    #[test]
    fn test_remove_subspace_detaches_and_empties() {
        let mut space = Space::new();
        space.spawn(Entity::empty().with_id(1));
        let subspace = journaled(EntitySelector::Any);
        space.add_subspace(&subspace);

        assert!(space.remove_subspace(&subspace));
        assert!(!space.remove_subspace(&subspace));
        assert!(space.subspaces().is_empty());
        assert!(subspace.borrow().space().is_none());
        assert!(subspace.borrow().is_empty());

        // Detached subspaces no longer follow the space.
        space.spawn(Entity::empty().with_id(2));
        assert!(subspace.borrow().is_empty());
    }

    #[test]
    fn test_subspace_moves_between_spaces() {
        let mut first = Space::new();
        let mut second = Space::new();
        first.spawn(Entity::empty().with_id(1));
        second.spawn(Entity::empty().with_id(2));

        let subspace = journaled(EntitySelector::Any);
        first.add_subspace(&subspace);
        second.add_subspace(&subspace);

        assert_eq!(subspace.borrow().space(), Some(second.id()));
        assert!(first.subspaces().is_empty());
        assert_eq!(second.subspaces().len(), 1);
        assert_eq!(
            subspace.borrow().hooks().events,
            vec!["added 1", "removed 1", "added 2"]
        );

        // The old space no longer drives it.
        first.spawn(Entity::empty().with_id(3));
        assert_eq!(subspace.borrow().len(), 1);
        assert!(!first.remove_subspace(&subspace));
        assert_eq!(subspace.borrow().space(), Some(second.id()));
    }

    #[test]
    fn test_dropping_space_detaches_subspaces() {
        let subspace = journaled(EntitySelector::Any);
        {
            let mut space = Space::new();
            space.spawn(Entity::empty().with_id(1));
            space.add_subspace(&subspace);
        }
        assert!(subspace.borrow().space().is_none());
        assert!(subspace.borrow().is_empty());
    }

    #[test]
    fn test_incremental_matches_reload() {
        let mut space = Space::new();
        let selector = (EntitySelector::component::<Health>() | EntitySelector::type_flag(0b100))
            & !EntitySelector::component::<Shield>();
        let subspace = journaled(selector);

        let a = space.spawn(Entity::empty().with_id(1));
        let b = space.spawn(Entity::empty().with(Health(1)).with_id(2));
        space.add_subspace(&subspace);
        assert_consistent(&space, &subspace);

        let c = space.spawn(Entity::empty().with_type_flags(0b100).with_id(3));
        assert_consistent(&space, &subspace);
        space.add_component(Health(2), &a);
        assert_consistent(&space, &subspace);
        space.add_component(Shield, &b);
        assert_consistent(&space, &subspace);
        space.add_component(Shield, &c);
        assert_consistent(&space, &subspace);
        space.remove_component::<Shield>(&b);
        assert_consistent(&space, &subspace);
        space.remove_component::<Health>(&a);
        assert_consistent(&space, &subspace);
        space.remove_entity(&b);
        assert_consistent(&space, &subspace);

        let incremental: Vec<EntityRef> = subspace.borrow().entities().to_vec();
        subspace.borrow_mut().reload_from_space(&space);
        let reloaded = subspace.borrow();
        assert_eq!(incremental.len(), reloaded.len());
        assert!(incremental.iter().all(|e| reloaded.contains(e)));
    }
}
