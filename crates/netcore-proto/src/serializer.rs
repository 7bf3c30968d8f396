use crate::error::ProtocolError;
use crate::header::SerializerKind;

/// Decoded object payload. `serde_json::Value` stands in for the native
/// scripting-runtime object model this core has no access to.
pub type Value = serde_json::Value;

pub fn decode(kind: SerializerKind, bytes: &[u8]) -> Result<Value, ProtocolError> {
    match kind {
        SerializerKind::Json => Ok(serde_json::from_slice(bytes)?),
        SerializerKind::Native | SerializerKind::MsgPack | SerializerKind::Amf => {
            Err(ProtocolError::UnsupportedSerializer(kind))
        }
    }
}

pub fn encode(kind: SerializerKind, value: &Value) -> Result<Vec<u8>, ProtocolError> {
    match kind {
        SerializerKind::Json => Ok(serde_json::to_vec(value)?),
        SerializerKind::Native | SerializerKind::MsgPack | SerializerKind::Amf => {
            Err(ProtocolError::UnsupportedSerializer(kind))
        }
    }
}
