//! Core [`Component`] trait and its type-erased counterpart.
//!
//! A component is any payload type that has been declared attachable to an
//! entity. It carries no behaviour of its own; the engine only needs a stable
//! type identity to match on and an escape hatch back to the concrete type.
//!
//! ## Type Identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm. Two distinct component types declaring
//! the same name collide; keeping names unique is the caller's job.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::ComponentRecord;
use crate::error::CodecError;

/// Stable identity of a component type: the FNV-1a 64-bit hash of its
/// [`Component::type_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Hash a component name. Usable in `const` contexts, so ids can be
    /// spelled out as constants.
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
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// The component marker trait.
///
/// Any `'static` type can be attached to an entity once it implements this
/// trait. Only [`Component::type_name`] is required.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Any {
    /// A human-readable, process-stable name for this component type.
    ///
    /// Must be unique among component types. Selectors and the registry key
    /// on the hash of this name, while typed entity lookups key on the Rust
    /// type, so two types sharing a name match the same selectors but not
    /// each other's typed lookups.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId
    where
        Self: Sized,
    {
        ComponentTypeId::from_name(Self::type_name())
    }

    /// Serialised form of this component.
    ///
    /// `None` means the component does not take part in persistence. Types
    /// that do override this, usually with [`crate::codec::encode`].
    fn encode(&self) -> Option<Result<Vec<u8>, CodecError>> {
        None
    }
}

/// Object-safe view of a [`Component`], implemented for every component.
///
/// Entities store their components as `Box<dyn AnyComponent>`.
pub trait AnyComponent: Any {
    /// The [`ComponentTypeId`] of the concrete type.
    fn component_type(&self) -> ComponentTypeId;

    /// The concrete type's [`Component::type_name`].
    fn component_name(&self) -> &'static str;

    /// Encode into a [`ComponentRecord`], or fail with
    /// [`CodecError::NotSerializable`] for components without an encoding.
    fn to_record(&self) -> Result<ComponentRecord, CodecError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Component> AnyComponent for T {
    fn component_type(&self) -> ComponentTypeId {
        T::component_type_id()
    }

    fn component_name(&self) -> &'static str {
        T::type_name()
    }

    fn to_record(&self) -> Result<ComponentRecord, CodecError> {
        match Component::encode(self) {
            Some(data) => Ok(ComponentRecord {
                type_id: T::component_type_id(),
                data: data?,
            }),
            None => Err(CodecError::NotSerializable {
                component: T::type_name(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn AnyComponent {
    /// Returns `true` if the concrete type is exactly `T`.
    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Recover the concrete value, or hand the box back unchanged.
    ///
    /// # Errors
    ///
    /// Returns the original box if the concrete type is not `T`.
    pub fn downcast<T: Component>(self: Box<Self>) -> Result<Box<T>, Box<Self>> {
        if self.is::<T>() {
            match self.into_any().downcast::<T>() {
                Ok(value) => Ok(value),
                Err(_) => unreachable!("type checked above"),
            }
        } else {
            Err(self)
        }
    }
}

impl fmt::Debug for dyn AnyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.component_name())
            .field("type_id", &self.component_type())
            .finish()
    }
}
