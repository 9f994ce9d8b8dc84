//! Decoder registry used to rebuild components from [`ComponentRecord`]s.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::codec::{self, ComponentRecord};
use crate::component::{AnyComponent, Component, ComponentTypeId};
use crate::error::CodecError;

/// Metadata about a deserialisable component type.
#[derive(Debug, Clone)]
pub struct ComponentMeta {
    /// The unique type identifier.
    pub type_id: ComponentTypeId,
    /// The human-readable name of the component (e.g. `"Health"`).
    pub name: &'static str,
    /// Rebuild a boxed component from MessagePack bytes.
    pub decode_fn: fn(&[u8]) -> Result<Box<dyn AnyComponent>, CodecError>,
}

/// Maps [`ComponentTypeId`]s to decoders.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    metas: HashMap<ComponentTypeId, ComponentMeta>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            metas: HashMap::new(),
        }
    }

    /// Register `T` so records carrying its type id can be decoded.
    ///
    /// Registering the same type twice replaces the earlier entry.
    pub fn register<T: Component + DeserializeOwned>(&mut self) {
        let meta = ComponentMeta {
            type_id: T::component_type_id(),
            name: T::type_name(),
            decode_fn: |bytes: &[u8]| {
                let value: T = codec::decode(bytes)?;
                Ok(Box::new(value) as Box<dyn AnyComponent>)
            },
        };
        self.metas.insert(meta.type_id, meta);
    }

    /// Returns the metadata registered for `type_id`.
    #[must_use]
    pub fn get(&self, type_id: ComponentTypeId) -> Option<&ComponentMeta> {
        self.metas.get(&type_id)
    }

    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId) -> bool {
        self.metas.contains_key(&type_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Decode a record into a boxed component.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownComponent`] if the type was never
    /// registered, or [`CodecError::Decode`] if the payload is malformed.
    pub fn decode(&self, record: &ComponentRecord) -> Result<Box<dyn AnyComponent>, CodecError> {
        let meta = self
            .metas
            .get(&record.type_id)
            .ok_or(CodecError::UnknownComponent(record.type_id))?;
        (meta.decode_fn)(&record.data)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Health {
        current: f32,
        max: f32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }

        fn encode(&self) -> Option<Result<Vec<u8>, CodecError>> {
            Some(codec::encode(self))
        }
    }

    #[test]
    fn test_register_and_decode() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Health>();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(Health::component_type_id()).map(|m| m.name),
            Some("Health")
        );

        let record = Health {
            current: 3.0,
            max: 4.0,
        }
        .to_record()
        .unwrap();
        let decoded = registry.decode(&record).unwrap();
        assert_eq!(
            decoded.downcast_ref::<Health>(),
            Some(&Health {
                current: 3.0,
                max: 4.0
            })
        );
    }

    #[test]
    fn test_unknown_component() {
        let registry = ComponentRegistry::new();
        let record = ComponentRecord {
            type_id: ComponentTypeId::from_name("Ghost"),
            data: Vec::new(),
        };
        assert!(matches!(
            registry.decode(&record),
            Err(CodecError::UnknownComponent(id)) if id == ComponentTypeId::from_name("Ghost")
        ));
    }
}
