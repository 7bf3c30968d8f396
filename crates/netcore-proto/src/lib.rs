mod compress;
mod error;
mod header;
mod codec;
mod serializer;

pub use codec::{Decoded, DecodedEvent, Negotiation, decode_one, encode_cmd, encode_obj, encode_raw};
pub use error::ProtocolError;
pub use header::{CompressionKind, Header, LengthWidth, PacketType, SerializerKind};
pub use serializer::Value;
