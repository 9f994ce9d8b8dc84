//! Selector-filtered live views of a space's entities.
//!
//! A [`Subspace`] holds a selector and the ordered list of space entities
//! that currently satisfy it. The owning [`Space`] keeps that list in sync
//! incrementally: after each structural change it hands the affected entity
//! to [`Subspace::manage_entity`], which adds or removes that one entity.
//! A full [`reload_from_space`](Subspace::reload_from_space) only happens on
//! attach and on selector changes.
//!
//! While attached, `entities()` equals the space's entities filtered by the
//! selector, in space order for a freshly reloaded subspace and in
//! qualification order afterwards. A detached subspace is always empty.

use std::cell::RefCell;
use std::rc::Rc;

use engine_component::AnyComponent;
use tracing::trace;

use crate::entity::{Entity, EntityRef};
use crate::selector::EntitySelector;
use crate::space::{Space, SpaceId};

/// Observation points for auxiliary per-entity state.
///
/// `entity_added` and `entity_removed` fire exactly once per membership
/// transition. The `will_*` hooks fire on every subspace of the space, member
/// or not, before the component list changes. None of them can veto the
/// mutation.
///
/// Hooks run while the space is borrowed. To change the space from a hook,
/// queue the change on the space's
/// [`SpaceCommands`](crate::commands::SpaceCommands); it is applied once the
/// current notification round is over.
pub trait SubspaceHooks: 'static {
    fn entity_added(&mut self, _entity: &EntityRef) {}

    fn entity_removed(&mut self, _entity: &EntityRef) {}

    fn will_add_component(&mut self, _entity: &Entity, _component: &dyn AnyComponent) {}

    fn will_remove_component(&mut self, _entity: &Entity, _component: &dyn AnyComponent) {}

    /// Membership test. Defaults to evaluating the subspace's selector.
    fn test_entity(&self, selector: &EntitySelector, entity: &Entity) -> bool {
        selector.evaluate(entity)
    }
}

impl SubspaceHooks for () {}

/// Shared handle to a typed subspace.
pub type SubspaceRef<H = ()> = Rc<RefCell<Subspace<H>>>;

/// A selector plus the materialised list of entities it accepts.
#[derive(Debug)]
pub struct Subspace<H: SubspaceHooks = ()> {
    selector: EntitySelector,
    entities: Vec<EntityRef>,
    space: Option<SpaceId>,
    hooks: H,
}

impl Subspace {
    /// A detached subspace with the [`EntitySelector::None`] selector.
    #[must_use]
    pub fn new() -> Self {
        Self::with_selector(EntitySelector::None)
    }

    #[must_use]
    pub fn with_selector(selector: EntitySelector) -> Self {
        Self::with_hooks(selector, ())
    }
}

impl Default for Subspace {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: SubspaceHooks> Subspace<H> {
    #[must_use]
    pub fn with_hooks(selector: EntitySelector, hooks: H) -> Self {
        Self {
            selector,
            entities: Vec::new(),
            space: None,
            hooks,
        }
    }

    /// Wrap in the shared handle spaces accept.
    #[must_use]
    pub fn into_shared(self) -> SubspaceRef<H> {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn selector(&self) -> &EntitySelector {
        &self.selector
    }

    /// Current members, oldest qualification first.
    #[must_use]
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.position_of(entity).is_some()
    }

    /// The space this subspace is attached to, if any.
    #[must_use]
    pub fn space(&self) -> Option<SpaceId> {
        self.space
    }

    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Replace the selector, reloading membership from `space` if this
    /// subspace is attached to it.
    ///
    /// Passing a space this subspace is not attached to only swaps the
    /// selector.
    pub fn set_selector(&mut self, selector: EntitySelector, space: &Space) {
        self.selector = selector;
        self.reload_from_space(space);
    }

    /// Re-test one entity, adding or removing it as needed.
    ///
    /// Does nothing while detached.
    pub fn manage_entity(&mut self, entity: &EntityRef) {
        if self.space.is_none() {
            return;
        }

        let passes = self.hooks.test_entity(&self.selector, &entity.borrow());
        match (self.position_of(entity), passes) {
            (Some(pos), false) => {
                let removed = self.entities.remove(pos);
                trace!(entity = removed.borrow().id, "entity left subspace");
                self.hooks.entity_removed(&removed);
            }
            (None, true) => {
                self.entities.push(entity.clone());
                trace!(entity = entity.borrow().id, "entity joined subspace");
                self.hooks.entity_added(entity);
            }
            _ => {}
        }
    }

    /// Rebuild membership from scratch against `space`'s entities.
    ///
    /// Ignored unless this subspace is attached to `space`.
    pub fn reload_from_space(&mut self, space: &Space) {
        if self.space != Some(space.id()) {
            return;
        }
        self.reload(space.entities());
    }

    /// Drop every member, firing `entity_removed` for each.
    pub fn clear_entities(&mut self) {
        for entity in std::mem::take(&mut self.entities) {
            self.hooks.entity_removed(&entity);
        }
    }

    fn reload(&mut self, entities: &[EntityRef]) {
        self.clear_entities();
        for entity in entities {
            self.manage_entity(entity);
        }
    }

    fn position_of(&self, entity: &EntityRef) -> Option<usize> {
        self.entities.iter().position(|member| member.ptr_eq(entity))
    }
}

/// Type-erased subspace, as stored by a [`Space`].
///
/// Only the space drives the `attach`/`detach`/`forget`/`will_*` methods.
pub trait AnySubspace {
    fn selector(&self) -> &EntitySelector;

    fn entities(&self) -> &[EntityRef];

    fn space(&self) -> Option<SpaceId>;

    fn manage_entity(&mut self, entity: &EntityRef);

    fn clear_entities(&mut self);

    #[doc(hidden)]
    fn attach(&mut self, space: SpaceId, entities: &[EntityRef]);

    #[doc(hidden)]
    fn detach(&mut self);

    /// Drop `entity` from membership because it left the space.
    #[doc(hidden)]
    fn forget_entity(&mut self, entity: &EntityRef);

    #[doc(hidden)]
    fn will_add_component(&mut self, entity: &Entity, component: &dyn AnyComponent);

    #[doc(hidden)]
    fn will_remove_component(&mut self, entity: &Entity, component: &dyn AnyComponent);
}

impl<H: SubspaceHooks> AnySubspace for Subspace<H> {
    fn selector(&self) -> &EntitySelector {
        &self.selector
    }

    fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    fn space(&self) -> Option<SpaceId> {
        self.space
    }

    fn manage_entity(&mut self, entity: &EntityRef) {
        Subspace::<H>::manage_entity(self, entity);
    }

    fn clear_entities(&mut self) {
        Subspace::<H>::clear_entities(self);
    }

    fn attach(&mut self, space: SpaceId, entities: &[EntityRef]) {
        self.clear_entities();
        self.space = Some(space);
        self.reload(entities);
    }

    fn detach(&mut self) {
        self.space = None;
        self.clear_entities();
    }

    fn forget_entity(&mut self, entity: &EntityRef) {
        if let Some(pos) = self.position_of(entity) {
            let removed = self.entities.remove(pos);
            self.hooks.entity_removed(&removed);
        }
    }

    fn will_add_component(&mut self, entity: &Entity, component: &dyn AnyComponent) {
        self.hooks.will_add_component(entity, component);
    }

    fn will_remove_component(&mut self, entity: &Entity, component: &dyn AnyComponent) {
        self.hooks.will_remove_component(entity, component);
    }
}

#[cfg(test)]
mod tests {
    use engine_component::Component;

    use super::*;

    #[derive(Debug)]
    struct Health;

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Default)]
    struct Transitions {
        added: u32,
        removed: u32,
    }

    impl SubspaceHooks for Transitions {
        fn entity_added(&mut self, _entity: &EntityRef) {
            self.added += 1;
        }

        fn entity_removed(&mut self, _entity: &EntityRef) {
            self.removed += 1;
        }
    }

    #[test]
    fn test_new_subspace_is_detached_and_rejects_all() {
        let subspace = Subspace::new();
        assert_eq!(subspace.selector(), &EntitySelector::None);
        assert!(subspace.space().is_none());
        assert!(subspace.is_empty());
    }

    #[test]
    fn test_manage_entity_ignored_while_detached() {
        let mut subspace = Subspace::with_selector(EntitySelector::Any);
        let entity = EntityRef::new(Entity::empty());
        subspace.manage_entity(&entity);
        assert!(subspace.is_empty());
    }

    #[test]
    fn test_manage_entity_transitions_once() {
        let mut space = Space::new();
        let entity = space.spawn(Entity::empty());
        let subspace =
            Subspace::with_hooks(EntitySelector::component::<Health>(), Transitions::default())
                .into_shared();
        space.add_subspace(&subspace);

        // Re-testing an unchanged entity is not a transition.
        subspace.borrow_mut().manage_entity(&entity);
        assert_eq!(subspace.borrow().hooks().added, 0);

        space.add_component(Health, &entity);
        subspace.borrow_mut().manage_entity(&entity);
        assert_eq!(subspace.borrow().len(), 1);
        assert_eq!(subspace.borrow().hooks().added, 1);
        assert_eq!(subspace.borrow().hooks().removed, 0);
    }

    #[test]
    fn test_set_selector_reloads() {
        let mut space = Space::new();
        let a = space.spawn(Entity::empty().with_id(1));
        let _b = space.spawn(Entity::empty().with_id(2));
        let subspace = Subspace::with_selector(EntitySelector::id(2)).into_shared();
        space.add_subspace(&subspace);
        assert_eq!(subspace.borrow().len(), 1);

        subspace
            .borrow_mut()
            .set_selector(EntitySelector::id(1), &space);
        assert_eq!(subspace.borrow().entities(), &[a]);
    }

    #[test]
    fn test_reload_from_foreign_space_is_ignored() {
        let mut home = Space::new();
        let away = Space::new();
        home.spawn(Entity::empty());
        let subspace = Subspace::with_selector(EntitySelector::Any).into_shared();
        home.add_subspace(&subspace);

        subspace.borrow_mut().reload_from_space(&away);
        assert_eq!(subspace.borrow().len(), 1);
        assert_eq!(subspace.borrow().space(), Some(home.id()));
    }

    #[test]
    fn test_clear_entities_fires_removed() {
        let mut space = Space::new();
        space.spawn(Entity::empty());
        space.spawn(Entity::empty());
        let subspace =
            Subspace::with_hooks(EntitySelector::Any, Transitions::default()).into_shared();
        space.add_subspace(&subspace);

        subspace.borrow_mut().clear_entities();
        assert!(subspace.borrow().is_empty());
        assert_eq!(subspace.borrow().hooks().removed, 2);
    }
}
