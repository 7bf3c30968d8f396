use crate::error::ProtocolError;

/// ```text
/// bits: 7 6 5 | 4 | 3 2 | 1 0
///       type  | L | ser | comp
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Rep,
    Raw,
    Obj,
    Cmd,
    Heartbeat,
}

impl PacketType {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Rep),
            1 => Some(Self::Raw),
            2 => Some(Self::Obj),
            3 => Some(Self::Cmd),
            7 => Some(Self::Heartbeat),
            _ => None,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Self::Rep => 0,
            Self::Raw => 1,
            Self::Obj => 2,
            Self::Cmd => 3,
            Self::Heartbeat => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthWidth {
    Bits32,
    Bits64,
}

impl LengthWidth {
    pub fn byte_len(self) -> usize {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }

    fn from_bit(bit: u8) -> Self {
        if bit == 0 { Self::Bits32 } else { Self::Bits64 }
    }

    fn to_bit(self) -> u8 {
        match self {
            Self::Bits32 => 0,
            Self::Bits64 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerKind {
    Native,
    Json,
    MsgPack,
    Amf,
}

impl SerializerKind {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Native,
            1 => Self::Json,
            2 => Self::MsgPack,
            _ => Self::Amf,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Self::Native => 0,
            Self::Json => 1,
            Self::MsgPack => 2,
            Self::Amf => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    None,
    Deflate,
    Lz4,
    Snappy,
}

impl CompressionKind {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::None,
            1 => Self::Deflate,
            2 => Self::Lz4,
            _ => Self::Snappy,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Deflate => 1,
            Self::Lz4 => 2,
            Self::Snappy => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub packet_type: PacketType,
    pub length_width: LengthWidth,
    pub serializer: SerializerKind,
    pub compression: CompressionKind,
}

impl Header {
    pub fn parse(byte: u8) -> Result<Self, ProtocolError> {
        let packet_type = PacketType::from_bits((byte >> 5) & 0b111).ok_or(ProtocolError::MalformedHeader)?;
        let length_width = LengthWidth::from_bit((byte >> 4) & 0b1);
        let serializer = SerializerKind::from_bits((byte >> 2) & 0b11);
        let compression = CompressionKind::from_bits(byte & 0b11);
        Ok(Self { packet_type, length_width, serializer, compression })
    }

    pub fn to_byte(self) -> u8 {
        (self.packet_type.to_bits() << 5)
            | (self.length_width.to_bit() << 4)
            | (self.serializer.to_bits() << 2)
            | self.compression.to_bits()
    }
}

/// Unknown (reserved) type bits parsed straight from a header byte, kept
/// around only so the caller can discard the buffer defensively without
/// having classified a type.
pub fn type_bits_known(byte: u8) -> bool {
    PacketType::from_bits((byte >> 5) & 0b111).is_some()
}
