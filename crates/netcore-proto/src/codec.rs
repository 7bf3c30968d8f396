use crate::compress;
use crate::error::ProtocolError;
use crate::header::{CompressionKind, Header, LengthWidth, PacketType, SerializerKind};
use crate::serializer::{self, Value};

/// Per-client negotiated framing settings, latched by the last REP packet
/// received from the peer.
#[derive(Debug, Clone, Copy)]
pub struct Negotiation {
    pub length_width: LengthWidth,
    pub serializer: SerializerKind,
    pub compression: CompressionKind,
}

impl Default for Negotiation {
    fn default() -> Self {
        Self {
            length_width: LengthWidth::Bits32,
            serializer: SerializerKind::Native,
            compression: CompressionKind::None,
        }
    }
}

#[derive(Debug)]
pub enum DecodedEvent {
    Raw(Vec<u8>),
    Obj(Value),
    Cmd(i32, Value),
}

/// Result of attempting to decode one packet out of the front of a buffer.
pub enum Decoded {
    /// Not enough bytes buffered yet; the caller should wait for more reads.
    NeedMore,
    /// `consumed` bytes should be dropped from the front of the buffer.
    /// `reply` (if any) should be appended to the send queue verbatim.
    /// `event` (if any) should be dispatched to `on_events`.
    Consumed { consumed: usize, reply: Option<Vec<u8>>, event: Option<DecodedEvent> },
    /// The declared length exceeded `max_packet_length`. The caller must
    /// discard the entire read buffer and move the socket to PRE_CLOSE.
    TooLarge,
}

/// Decodes at most one packet from the front of `buf`. Does not mutate
/// `buf`; the caller drops `consumed` bytes from its own buffer on success.
pub fn decode_one(
    buf: &[u8],
    max_packet_length: u64,
    negotiation: &mut Negotiation,
) -> Result<Decoded, ProtocolError> {
    let Some(&header_byte) = buf.first() else {
        return Ok(Decoded::NeedMore);
    };

    if !crate::header::type_bits_known(header_byte) {
        // Unknown type: defensive discard of the whole buffer, not fatal.
        return Ok(Decoded::Consumed { consumed: buf.len(), reply: None, event: None });
    }

    let header = Header::parse(header_byte)?;

    match header.packet_type {
        PacketType::Rep => {
            *negotiation = Negotiation {
                length_width: header.length_width,
                serializer: header.serializer,
                compression: header.compression,
            };
            Ok(Decoded::Consumed { consumed: 1, reply: Some(vec![header_byte]), event: None })
        }
        PacketType::Heartbeat => {
            Ok(Decoded::Consumed { consumed: 1, reply: Some(vec![header_byte]), event: None })
        }
        PacketType::Raw | PacketType::Obj | PacketType::Cmd => {
            let len_width = header.length_width.byte_len();
            if buf.len() < 1 + len_width {
                return Ok(Decoded::NeedMore);
            }
            let length = read_length(&buf[1..1 + len_width]);
            if length > max_packet_length {
                return Ok(Decoded::TooLarge);
            }
            let length = length as usize;
            let total = 1 + len_width + length;
            if buf.len() < total {
                return Ok(Decoded::NeedMore);
            }

            let body = &buf[1 + len_width..total];
            let event = match header.packet_type {
                PacketType::Raw => {
                    let payload = compress::decompress(header.compression, body)?;
                    DecodedEvent::Raw(payload)
                }
                PacketType::Obj => {
                    let payload = compress::decompress(header.compression, body)?;
                    let value = serializer::decode(header.serializer, &payload)?;
                    DecodedEvent::Obj(value)
                }
                PacketType::Cmd => {
                    if body.len() < 4 {
                        return Err(ProtocolError::MalformedHeader);
                    }
                    let cmd_id = i32::from_be_bytes(body[0..4].try_into().unwrap());
                    let payload = compress::decompress(header.compression, &body[4..])?;
                    let value = serializer::decode(header.serializer, &payload)?;
                    DecodedEvent::Cmd(cmd_id, value)
                }
                PacketType::Rep | PacketType::Heartbeat => unreachable!(),
            };

            Ok(Decoded::Consumed { consumed: total, reply: None, event: Some(event) })
        }
    }
}

fn read_length(bytes: &[u8]) -> u64 {
    match bytes.len() {
        4 => u64::from(u32::from_be_bytes(bytes.try_into().unwrap())),
        8 => u64::from_be_bytes(bytes.try_into().unwrap()),
        _ => unreachable!("len_width is always 4 or 8"),
    }
}

/// Encodes a RAW frame for the outbound path, honouring the negotiated
/// length width and compression.
pub fn encode_raw(negotiation: Negotiation, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let body = compress::compress(negotiation.compression, payload)?;
    encode_frame(PacketType::Raw, negotiation, &body)
}

pub fn encode_obj(negotiation: Negotiation, value: &Value) -> Result<Vec<u8>, ProtocolError> {
    let encoded = serializer::encode(negotiation.serializer, value)?;
    let body = compress::compress(negotiation.compression, &encoded)?;
    encode_frame(PacketType::Obj, negotiation, &body)
}

pub fn encode_cmd(
    negotiation: Negotiation,
    cmd_id: i32,
    value: &Value,
) -> Result<Vec<u8>, ProtocolError> {
    let encoded = serializer::encode(negotiation.serializer, value)?;
    let compressed = compress::compress(negotiation.compression, &encoded)?;
    let mut body = Vec::with_capacity(4 + compressed.len());
    body.extend_from_slice(&cmd_id.to_be_bytes());
    body.extend_from_slice(&compressed);
    encode_frame(PacketType::Cmd, negotiation, &body)
}

fn encode_frame(
    packet_type: PacketType,
    negotiation: Negotiation,
    body: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let header = Header {
        packet_type,
        length_width: negotiation.length_width,
        serializer: negotiation.serializer,
        compression: negotiation.compression,
    };
    let mut out = Vec::with_capacity(1 + negotiation.length_width.byte_len() + body.len());
    out.push(header.to_byte());
    match negotiation.length_width {
        LengthWidth::Bits32 => out.extend_from_slice(&(body.len() as u32).to_be_bytes()),
        LengthWidth::Bits64 => out.extend_from_slice(&(body.len() as u64).to_be_bytes()),
    }
    out.extend_from_slice(body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_negotiation_latches_and_echoes() {
        let mut negotiation = Negotiation::default();
        let header = Header {
            packet_type: PacketType::Rep,
            length_width: LengthWidth::Bits64,
            serializer: SerializerKind::Json,
            compression: CompressionKind::Deflate,
        };
        let buf = [header.to_byte()];
        let Decoded::Consumed { consumed, reply, event } =
            decode_one(&buf, 1024, &mut negotiation).unwrap()
        else {
            panic!("expected Consumed");
        };
        assert_eq!(consumed, 1);
        assert_eq!(reply, Some(vec![header.to_byte()]));
        assert!(event.is_none());
        assert_eq!(negotiation.length_width, LengthWidth::Bits64);
        assert_eq!(negotiation.serializer, SerializerKind::Json);
        assert_eq!(negotiation.compression, CompressionKind::Deflate);
    }

    #[test]
    fn raw_round_trip_through_encode_and_decode() {
        let negotiation = Negotiation::default();
        let frame = encode_raw(negotiation, b"hello world").unwrap();
        let mut state = Negotiation::default();
        let Decoded::Consumed { consumed, event, .. } =
            decode_one(&frame, 1024, &mut state).unwrap()
        else {
            panic!("expected Consumed");
        };
        assert_eq!(consumed, frame.len());
        match event {
            Some(DecodedEvent::Raw(bytes)) => assert_eq!(bytes, b"hello world"),
            _ => panic!("expected Raw event"),
        }
    }

    #[test]
    fn incomplete_frame_asks_for_more() {
        let negotiation = Negotiation::default();
        let frame = encode_raw(negotiation, b"hello world").unwrap();
        let mut state = Negotiation::default();
        assert!(matches!(decode_one(&frame[..3], 1024, &mut state).unwrap(), Decoded::NeedMore));
    }

    #[test]
    fn oversized_declared_length_is_rejected() {
        let mut state = Negotiation::default();
        let frame = encode_raw(Negotiation::default(), &vec![0u8; 100]).unwrap();
        assert!(matches!(decode_one(&frame, 10, &mut state).unwrap(), Decoded::TooLarge));
    }

    #[test]
    fn cmd_round_trip_carries_command_id() {
        let negotiation =
            Negotiation { serializer: SerializerKind::Json, ..Negotiation::default() };
        let value = serde_json::json!({"a": 1});
        let frame = encode_cmd(negotiation, 42, &value).unwrap();
        let mut state = negotiation;
        let Decoded::Consumed { event, .. } = decode_one(&frame, 1024, &mut state).unwrap() else {
            panic!("expected Consumed");
        };
        match event {
            Some(DecodedEvent::Cmd(id, v)) => {
                assert_eq!(id, 42);
                assert_eq!(v, value);
            }
            _ => panic!("expected Cmd event"),
        }
    }

    #[test]
    fn unknown_type_discards_whole_buffer() {
        let mut state = Negotiation::default();
        // type bits = 0b100 (4), not in {0,1,2,3,7}
        let buf = [0b100_0_00_00u8, 1, 2, 3];
        let Decoded::Consumed { consumed, reply, event } =
            decode_one(&buf, 1024, &mut state).unwrap()
        else {
            panic!("expected Consumed");
        };
        assert_eq!(consumed, buf.len());
        assert!(reply.is_none());
        assert!(event.is_none());
    }
}
