//! MessagePack helpers and the record form of a component.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;
use crate::error::CodecError;

/// A component in its serialised form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Identifies the decoder to use.
    pub type_id: ComponentTypeId,
    /// MessagePack-encoded component bytes.
    pub data: Vec<u8>,
}

/// Encode a value as named-field MessagePack.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the bytes do not describe a `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}
