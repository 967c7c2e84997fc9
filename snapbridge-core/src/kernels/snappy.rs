//! This module contains the stateless kernel for Snappy raw block compression.
//!
//! It is a safe, panic-free wrapper around the `snap` crate's raw (unframed)
//! encoder and decoder. The wire format is entirely owned by `snap`.

use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};

use crate::error::{BridgeError, CodecOp};
use crate::traits::BlockCodec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnappyCodec;

//==================================================================================
// 1. Core Logic
//==================================================================================

fn compress_into(input: &[u8], output: &mut [u8]) -> Result<usize, BridgeError> {
    Encoder::new()
        .compress(input, output)
        .map_err(|e| BridgeError::codec(CodecOp::Compress, e))
}

fn decompress_into(input: &[u8], output: &mut [u8]) -> Result<(), BridgeError> {
    let written = Decoder::new()
        .decompress(input, output)
        .map_err(|e| BridgeError::codec(CodecOp::Uncompress, e))?;
    if written != output.len() {
        return Err(BridgeError::codec(
            CodecOp::Uncompress,
            format!("decoded {} bytes, header declared {}", written, output.len()),
        ));
    }
    Ok(())
}

/// Checks the element stream against the length header without producing any
/// output, so a header claiming gigabytes costs nothing.
fn validate(input: &[u8]) -> bool {
    let declared = match decompress_len(input) {
        Ok(n) => n,
        Err(_) => return false,
    };
    let body = match input.iter().position(|b| b & 0x80 == 0) {
        Some(last) => &input[last + 1..],
        None => return false,
    };
    walk_elements(body, declared) == Some(declared)
}

/// Total length produced by a well-formed element stream, or `None` as soon
/// as a tag is truncated, a copy reaches before the start, or `limit` is passed.
fn walk_elements(body: &[u8], limit: usize) -> Option<usize> {
    let mut pos = 0;
    let mut produced = 0usize;
    while pos < body.len() {
        let tag = body[pos];
        pos += 1;
        let (len, offset) = match tag & 0b11 {
            0b00 => {
                let mut len = (tag >> 2) as usize;
                if len >= 60 {
                    let extra = len - 59;
                    let bytes = body.get(pos..pos + extra)?;
                    len = bytes.iter().rev().fold(0, |acc, &b| (acc << 8) | b as usize);
                    pos += extra;
                }
                let len = len.checked_add(1)?;
                if body.len() - pos < len {
                    return None;
                }
                pos += len;
                (len, None)
            }
            0b01 => {
                let low = *body.get(pos)? as usize;
                pos += 1;
                let len = 4 + ((tag >> 2) & 0b111) as usize;
                (len, Some(((tag as usize >> 5) << 8) | low))
            }
            0b10 => {
                let bytes = body.get(pos..pos + 2)?;
                pos += 2;
                let offset = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
                ((tag >> 2) as usize + 1, Some(offset))
            }
            _ => {
                let bytes = body.get(pos..pos + 4)?;
                pos += 4;
                let offset = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
                ((tag >> 2) as usize + 1, Some(offset))
            }
        };
        if let Some(offset) = offset {
            if offset == 0 || offset > produced {
                return None;
            }
        }
        produced = produced.checked_add(len).filter(|&n| n <= limit)?;
    }
    Some(produced)
}

//==================================================================================
// 2. Public API
//==================================================================================

impl BlockCodec for SnappyCodec {
    fn max_compressed_length(&self, input_len: usize) -> usize {
        max_compress_len(input_len)
    }

    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, BridgeError> {
        compress_into(input, output)
    }

    fn uncompressed_length(&self, input: &[u8]) -> Result<usize, BridgeError> {
        decompress_len(input).map_err(|e| BridgeError::codec(CodecOp::UncompressedLength, e))
    }

    fn uncompress(&self, input: &[u8], output: &mut [u8]) -> Result<(), BridgeError> {
        decompress_into(input, output)
    }

    fn is_valid_compressed_buffer(&self, input: &[u8]) -> bool {
        validate(input)
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
