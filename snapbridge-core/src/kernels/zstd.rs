//! This module contains the stateless kernel for Zstandard block compression.
//!
//! Each compressed block is one complete zstd frame produced by the bulk API,
//! which always records the frame's content size. That header field is what
//! `uncompressed_length` reads, so frames from a streaming encoder without a
//! pledged size are reported as malformed.

use std::io::{self, Read};

use zstd::bulk;
use zstd::stream::read::Decoder;
use zstd::zstd_safe;

use crate::error::{BridgeError, CodecOp};
use crate::traits::BlockCodec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new(3)
    }
}

//==================================================================================
// 1. Core Logic
//==================================================================================

fn content_size(input: &[u8]) -> Result<u64, BridgeError> {
    match zstd_safe::get_frame_content_size(input) {
        Ok(Some(n)) => Ok(n),
        Ok(None) => Err(BridgeError::codec(
            CodecOp::UncompressedLength,
            "frame does not record its content size",
        )),
        Err(_) => Err(BridgeError::codec(
            CodecOp::UncompressedLength,
            "not a zstd frame header",
        )),
    }
}

/// Stream-decodes into a sink and counts, so the header's claimed size is never
/// allocated. Reading one byte past the claim is enough to spot an overlong frame.
fn validate(input: &[u8]) -> bool {
    let declared = match content_size(input) {
        Ok(n) => n,
        Err(_) => return false,
    };
    let mut decoder = match Decoder::with_buffer(input) {
        Ok(decoder) => decoder,
        Err(_) => return false,
    };
    let mut bounded = (&mut decoder).take(declared.saturating_add(1));
    matches!(io::copy(&mut bounded, &mut io::sink()), Ok(n) if n == declared)
}

//==================================================================================
// 2. Public API
//==================================================================================

impl BlockCodec for ZstdCodec {
    fn max_compressed_length(&self, input_len: usize) -> usize {
        zstd_safe::compress_bound(input_len)
    }

    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, BridgeError> {
        bulk::compress_to_buffer(input, output, self.level)
            .map_err(|e| BridgeError::codec(CodecOp::Compress, e))
    }

    fn uncompressed_length(&self, input: &[u8]) -> Result<usize, BridgeError> {
        let size = content_size(input)?;
        usize::try_from(size).map_err(|_| {
            BridgeError::codec(
                CodecOp::UncompressedLength,
                format!("content size {} does not fit in memory", size),
            )
        })
    }

    fn uncompress(&self, input: &[u8], output: &mut [u8]) -> Result<(), BridgeError> {
        let expected = output.len();
        let written = bulk::decompress_to_buffer(input, output)
            .map_err(|e| BridgeError::codec(CodecOp::Uncompress, e))?;
        if written != expected {
            return Err(BridgeError::codec(
                CodecOp::Uncompress,
                format!("decoded {} bytes, header declared {}", written, expected),
            ));
        }
        Ok(())
    }

    fn is_valid_compressed_buffer(&self, input: &[u8]) -> bool {
        validate(input)
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn compress_vec(codec: &ZstdCodec, input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; codec.max_compressed_length(input.len())];
        let n = codec.compress(input, &mut out).unwrap();
        out.truncate(n);
        out
    }

    #[test]
    fn test_zstd_roundtrip_simple_text() {
        let codec = ZstdCodec::default();
        let original =
            b"hello world, this is a test of zstd compression. hello world, this is a test.";
        let compressed = compress_vec(&codec, original);
        assert_eq!(codec.uncompressed_length(&compressed).unwrap(), original.len());

        let mut decoded = vec![0u8; original.len()];
        codec.uncompress(&compressed, &mut decoded).unwrap();
        assert_eq!(&decoded[..], &original[..]);
        assert!(codec.is_valid_compressed_buffer(&compressed));
    }

    #[test]
    fn test_zstd_roundtrip_highly_compressible_data() {
        let codec = ZstdCodec::new(5);
        let original = vec![42u8; 10_000];
        let compressed = compress_vec(&codec, &original);
        assert!(compressed.len() < 50);

        let mut decoded = vec![0u8; original.len()];
        codec.uncompress(&compressed, &mut decoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_zstd_invalid_data() {
        let codec = ZstdCodec::default();
        let invalid_bytes = [1u8, 2, 3, 4, 5];
        assert!(codec.uncompressed_length(&invalid_bytes).is_err());
        assert!(!codec.is_valid_compressed_buffer(&invalid_bytes));
    }

    #[test]
    fn test_zstd_header_claiming_2gib_is_invalid() {
        // Frame header with a 4-byte content size of 0x7FFF0000 and no blocks.
        let header = [0x28u8, 0xB5, 0x2F, 0xFD, 0xA0, 0x00, 0x00, 0xFF, 0x7F];
        let codec = ZstdCodec::default();
        assert_eq!(codec.uncompressed_length(&header).unwrap(), 0x7FFF_0000);
        assert!(!codec.is_valid_compressed_buffer(&header));
    }

    #[test]
    fn test_zstd_trailing_garbage_is_invalid() {
        let codec = ZstdCodec::default();
        let mut framed = compress_vec(&codec, b"trailing trailing trailing");
        assert!(codec.is_valid_compressed_buffer(&framed));
        framed.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(!codec.is_valid_compressed_buffer(&framed));
    }
}
