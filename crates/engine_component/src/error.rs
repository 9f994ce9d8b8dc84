//! Serialization-boundary error types.

use crate::component::ComponentTypeId;

/// Errors raised while crossing the serialization boundary.
///
/// The runtime core never produces these; only the record conversion used by
/// persistence and preset tooling does.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Failed to encode a component to MessagePack.
    #[error("failed to encode component: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a component from MessagePack.
    #[error("failed to decode component: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The component does not provide an encoding.
    #[error("component '{component}' is not serializable")]
    NotSerializable { component: &'static str },

    /// No decoder is registered for the record's type.
    #[error("no decoder registered for component type {0}")]
    UnknownComponent(ComponentTypeId),
}
