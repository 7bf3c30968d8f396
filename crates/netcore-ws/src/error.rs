use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsError {
    #[error("incomplete HTTP upgrade request")]
    IncompleteHandshake,
    #[error("invalid websocket upgrade request")]
    InvalidHandshake,
    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,
    #[error("fragmented frames are not supported")]
    FragmentedFrameUnsupported,
    #[error("reserved bits set on frame")]
    ReservedBitsSet,
    #[error("frame too large")]
    FrameTooLarge,
    #[error("unknown opcode {0}")]
    InvalidOpcode(u8),
}
