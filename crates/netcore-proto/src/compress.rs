use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::error::ProtocolError;
use crate::header::CompressionKind;

pub fn compress(kind: CompressionKind, bytes: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    match kind {
        CompressionKind::None => Ok(bytes.to_vec()),
        CompressionKind::Deflate => {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
            enc.write_all(bytes)?;
            Ok(enc.finish()?)
        }
        CompressionKind::Lz4 | CompressionKind::Snappy => {
            Err(ProtocolError::UnsupportedCompression(kind))
        }
    }
}

pub fn decompress(kind: CompressionKind, bytes: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    match kind {
        CompressionKind::None => Ok(bytes.to_vec()),
        CompressionKind::Deflate => {
            let mut dec = DeflateDecoder::new(bytes);
            let mut out = Vec::new();
            dec.read_to_end(&mut out)?;
            Ok(out)
        }
        CompressionKind::Lz4 | CompressionKind::Snappy => {
            Err(ProtocolError::UnsupportedCompression(kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let compressed = compress(CompressionKind::Deflate, &data).unwrap();
        assert!(compressed.len() < data.len());
        let restored = decompress(CompressionKind::Deflate, &compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn lz4_is_rejected_not_fabricated() {
        assert!(matches!(
            compress(CompressionKind::Lz4, b"x"),
            Err(ProtocolError::UnsupportedCompression(CompressionKind::Lz4))
        ));
    }
}
