mod error;
mod frame;
mod handshake;

pub use error::WsError;
pub use frame::{Decoded, Frame, Opcode, decode_frame, encode_frame};
pub use handshake::{HandshakeRequest, accept_key, build_response, parse_request};
