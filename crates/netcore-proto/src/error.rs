use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed packet header")]
    MalformedHeader,
    #[error("packet length {0} exceeds max_packet_length {1}")]
    FrameTooLarge(u64, u64),
    #[error("serializer {0:?} is not implemented")]
    UnsupportedSerializer(crate::header::SerializerKind),
    #[error("compression {0:?} is not implemented")]
    UnsupportedCompression(crate::header::CompressionKind),
    #[error("json decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("deflate failure: {0}")]
    Deflate(#[from] std::io::Error),
}
