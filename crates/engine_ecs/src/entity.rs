//! Entities and the shared handle spaces and subspaces hold them by.
//!
//! An [`Entity`] is a caller-assigned `id`, a caller-assigned `type_flags`
//! bitmask, and an ordered list of components. Neither number is required to
//! be unique; identity is the [`EntityRef`] handle itself.
//!
//! The component *list* can only be changed by a
//! [`Space`](crate::space::Space), so that every subspace observes the change.
//! Component *data* may be edited in place through
//! [`Entity::component_mut`].
//!
//! An entity belongs to at most one space at a time. [`Entity::space`] names
//! that space; it is maintained by the space and never owns it.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use engine_component::{
    AnyComponent, CodecError, Component, ComponentRecord, ComponentRegistry, ComponentTypeId,
};
use serde::{Deserialize, Serialize};

use crate::space::SpaceId;

/// An identity-free bag of components plus two caller-owned numbers.
///
/// Changing `id` or `type_flags` while the entity sits in a space does not
/// re-classify it into subspaces.
pub struct Entity {
    /// Opaque caller-assigned identifier. Defaults to `0`.
    pub id: u64,
    /// Caller-assigned type bitmask, tested by
    /// [`EntitySelector::TypeFlag`](crate::selector::EntitySelector::TypeFlag).
    pub type_flags: u64,
    components: Vec<Box<dyn AnyComponent>>,
    space: Option<SpaceId>,
}

impl Entity {
    /// Create an entity from an ordered component list.
    #[must_use]
    pub fn new(components: Vec<Box<dyn AnyComponent>>) -> Self {
        Self {
            id: 0,
            type_flags: 0,
            components,
            space: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_type_flags(mut self, type_flags: u64) -> Self {
        self.type_flags = type_flags;
        self
    }

    /// Append an initial component while building the entity.
    #[must_use]
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// The space this entity belongs to, if any.
    #[must_use]
    pub fn space(&self) -> Option<SpaceId> {
        self.space
    }

    pub(crate) fn set_space(&mut self, space: Option<SpaceId>) {
        self.space = space;
    }

    // -- Component access --

    /// All components in insertion order.
    #[must_use]
    pub fn components(&self) -> &[Box<dyn AnyComponent>] {
        &self.components
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// The earliest-added component of exactly type `T`.
    ///
    /// Typed lookups match the concrete Rust type, while selectors match
    /// [`ComponentTypeId`]. The two only disagree for distinct types that
    /// declare the same [`Component::type_name`].
    #[must_use]
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components.iter().find_map(|c| c.downcast_ref::<T>())
    }

    /// Mutable access to the earliest-added component of type `T`.
    #[must_use]
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.iter_mut().find_map(|c| c.downcast_mut::<T>())
    }

    /// Every component of type `T`, in insertion order.
    pub fn components_of<T: Component>(&self) -> impl Iterator<Item = &T> {
        self.components.iter().filter_map(|c| c.downcast_ref::<T>())
    }

    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.iter().any(|c| c.is::<T>())
    }

    /// Returns `true` if some component's type id equals `type_id`.
    #[must_use]
    pub fn has_component_type(&self, type_id: ComponentTypeId) -> bool {
        self.components
            .iter()
            .any(|c| c.component_type() == type_id)
    }

    pub(crate) fn push_component(&mut self, component: Box<dyn AnyComponent>) {
        self.components.push(component);
    }

    pub(crate) fn remove_component_at(&mut self, index: usize) -> Box<dyn AnyComponent> {
        self.components.remove(index)
    }

    // -- Serialization boundary --

    /// Convert into an [`EntityRecord`].
    ///
    /// # Errors
    ///
    /// Fails if any component is not serialisable or fails to encode.
    pub fn to_record(&self) -> Result<EntityRecord, CodecError> {
        let components = self
            .components
            .iter()
            .map(|c| c.to_record())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EntityRecord {
            id: self.id,
            type_flags: self.type_flags,
            components,
        })
    }

    /// Rebuild an entity from a record, decoding components with `registry`.
    ///
    /// # Errors
    ///
    /// Fails if a component type is not registered or its payload is invalid.
    pub fn from_record(
        record: &EntityRecord,
        registry: &ComponentRegistry,
    ) -> Result<Self, CodecError> {
        let components = record
            .components
            .iter()
            .map(|c| registry.decode(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(components)
            .with_id(record.id)
            .with_type_flags(record.type_flags))
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("type_flags", &format_args!("{:#b}", self.type_flags))
            .field("components", &self.components)
            .field("space", &self.space)
            .finish()
    }
}

/// The serialised form of an [`Entity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    pub type_flags: u64,
    pub components: Vec<ComponentRecord>,
}

/// Shared handle to an [`Entity`].
///
/// Clones refer to the same entity. Equality is handle identity, never
/// structural: two entities with identical contents are still distinct.
#[derive(Clone)]
pub struct EntityRef(Rc<RefCell<Entity>>);

impl EntityRef {
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self(Rc::new(RefCell::new(entity)))
    }

    /// Immutably borrow the entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Entity> {
        self.0.borrow()
    }

    /// Mutably borrow the entity to edit `id`, `type_flags`, or component data.
    ///
    /// # Panics
    ///
    /// Panics if the entity is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, Entity> {
        self.0.borrow_mut()
    }

    pub(crate) fn try_borrow_mut(&self) -> Option<RefMut<'_, Entity>> {
        self.0.try_borrow_mut().ok()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Entity> for EntityRef {
    fn from(entity: Entity) -> Self {
        Self::new(entity)
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityRef {}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(entity) => fmt::Debug::fmt(&*entity, f),
            Err(_) => f.write_str("Entity(<borrowed>)"),
        }
    }
}
