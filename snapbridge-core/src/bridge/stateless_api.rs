// In: src/bridge/stateless_api.rs

//! Owned-slice convenience functions for callers that already hold Rust data.
//!
//! Nothing here touches a host: inputs are plain slices, outputs are freshly
//! allocated vectors, so there is nothing to pin. The functions use Snappy
//! unless a codec is passed explicitly to a `*_with` variant.

use bytemuck::Pod;

use crate::bridge::entry::supports_bit_shuffle;
use crate::error::{BridgeError, CodecOp};
use crate::kernels::{bitshuffle, bitunshuffle, SnappyCodec};
use crate::traits::BlockCodec;
use crate::types::BitShuffleType;

//==================================================================================
// 1. Bytes
//==================================================================================

pub fn compress(input: &[u8]) -> Result<Vec<u8>, BridgeError> {
    compress_with(&SnappyCodec, input)
}

pub fn compress_with<C: BlockCodec + ?Sized>(codec: &C, input: &[u8]) -> Result<Vec<u8>, BridgeError> {
    let mut out = vec![0u8; max_compressed_length_with(codec, input.len())?];
    let n = codec.compress(input, &mut out)?;
    out.truncate(n);
    Ok(out)
}

pub fn uncompress(input: &[u8]) -> Result<Vec<u8>, BridgeError> {
    uncompress_with(&SnappyCodec, input)
}

pub fn uncompress_with<C: BlockCodec + ?Sized>(codec: &C, input: &[u8]) -> Result<Vec<u8>, BridgeError> {
    let mut out = vec![0u8; declared_length(codec, input)?];
    codec.uncompress(input, &mut out)?;
    Ok(out)
}

pub fn compress_str(text: &str) -> Result<Vec<u8>, BridgeError> {
    compress(text.as_bytes())
}

/// Decompresses and decodes as UTF-8.
pub fn uncompress_string(input: &[u8]) -> Result<String, BridgeError> {
    String::from_utf8(uncompress(input)?)
        .map_err(|e| BridgeError::InvalidInput(format!("decompressed data is not UTF-8: {}", e)))
}

pub fn max_compressed_length(input_len: usize) -> Result<usize, BridgeError> {
    max_compressed_length_with(&SnappyCodec, input_len)
}

fn max_compressed_length_with<C: BlockCodec + ?Sized>(
    codec: &C,
    input_len: usize,
) -> Result<usize, BridgeError> {
    crate::bridge::dispatch::max_compressed_length(codec, input_len)
}

pub fn uncompressed_length(input: &[u8]) -> Result<usize, BridgeError> {
    SnappyCodec.uncompressed_length(input)
}

pub fn is_valid_compressed_buffer(input: &[u8]) -> bool {
    SnappyCodec.is_valid_compressed_buffer(input)
}

/// Header length, reported as an uncompress failure since the caller asked to decode.
fn declared_length<C: BlockCodec + ?Sized>(codec: &C, input: &[u8]) -> Result<usize, BridgeError> {
    codec.uncompressed_length(input).map_err(|e| match e {
        BridgeError::CodecFailure { reason, .. } => BridgeError::CodecFailure {
            op: CodecOp::Uncompress,
            reason,
        },
        other => other,
    })
}

//==================================================================================
// 2. Typed values
//==================================================================================

/// Compresses the native-endian bytes of `values`.
pub fn compress_typed<T: Pod>(values: &[T]) -> Result<Vec<u8>, BridgeError> {
    compress(bytemuck::cast_slice(values))
}

pub fn uncompress_typed<T: Pod>(input: &[u8]) -> Result<Vec<T>, BridgeError> {
    let len = declared_length(&SnappyCodec, input)?;
    let mut out = zeroed_elements::<T>(len)?;
    SnappyCodec.uncompress(input, bytemuck::cast_slice_mut(&mut out))?;
    Ok(out)
}

/// Bit-shuffles `values`. Without a shuffle transform the bytes are copied as-is.
pub fn shuffle_typed<T: Pod>(values: &[T]) -> Result<Vec<u8>, BridgeError> {
    let bytes: &[u8] = bytemuck::cast_slice(values);
    if !supports_bit_shuffle() {
        return Ok(bytes.to_vec());
    }
    let mut out = vec![0u8; bytes.len()];
    bitshuffle(bytes, &mut out, values.len(), std::mem::size_of::<T>())?;
    Ok(out)
}

pub fn unshuffle_typed<T: Pod>(input: &[u8]) -> Result<Vec<T>, BridgeError> {
    let mut out = zeroed_elements::<T>(input.len())?;
    if !supports_bit_shuffle() {
        bytemuck::cast_slice_mut(&mut out).copy_from_slice(input);
        return Ok(out);
    }
    let n = out.len();
    bitunshuffle(input, bytemuck::cast_slice_mut(&mut out), n, std::mem::size_of::<T>())?;
    Ok(out)
}

/// Bit-shuffles raw bytes holding elements of type `ty`.
pub fn shuffle_bytes(input: &[u8], ty: BitShuffleType) -> Result<Vec<u8>, BridgeError> {
    transform_bytes(input, ty, bitshuffle)
}

pub fn unshuffle_bytes(input: &[u8], ty: BitShuffleType) -> Result<Vec<u8>, BridgeError> {
    transform_bytes(input, ty, bitunshuffle)
}

fn transform_bytes(
    input: &[u8],
    ty: BitShuffleType,
    kernel: fn(&[u8], &mut [u8], usize, usize) -> Result<usize, BridgeError>,
) -> Result<Vec<u8>, BridgeError> {
    let size = ty.type_size();
    if input.len() % size != 0 {
        return Err(BridgeError::InvalidInput(format!(
            "{} bytes is not a whole number of {} elements",
            input.len(),
            ty
        )));
    }
    let mut out = vec![0u8; input.len()];
    kernel(input, &mut out, input.len() / size, size)?;
    Ok(out)
}

/// A zeroed `Vec<T>` covering exactly `byte_len` bytes.
fn zeroed_elements<T: Pod>(byte_len: usize) -> Result<Vec<T>, BridgeError> {
    let size = std::mem::size_of::<T>();
    if size == 0 || byte_len % size != 0 {
        return Err(BridgeError::InvalidInput(format!(
            "{} bytes is not a whole number of {}-byte elements",
            byte_len, size
        )));
    }
    Ok(vec![T::zeroed(); byte_len / size])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::ZstdCodec;

    #[test]
    fn test_compress_roundtrip_string() {
        let text = "Hello bridge! Hello bridge! Hello bridge! Hello bridge!";
        let compressed = compress_str(text).unwrap();
        assert!(compressed.len() < text.len());
        assert!(is_valid_compressed_buffer(&compressed));
        assert_eq!(uncompressed_length(&compressed).unwrap(), text.len());
        assert_eq!(uncompress_string(&compressed).unwrap(), text);
    }

    #[test]
    fn test_uncompress_string_rejects_invalid_utf8() {
        let compressed = compress(&[0xff, 0xfe, 0xfd]).unwrap();
        assert!(matches!(
            uncompress_string(&compressed),
            Err(BridgeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_typed_roundtrip() {
        let values: Vec<f64> = (0..500).map(|i| i as f64 * 0.25).collect();
        let compressed = compress_typed(&values).unwrap();
        let restored: Vec<f64> = uncompress_typed(&compressed).unwrap();
        assert_eq!(restored, values);
    }

    #[test]
    fn test_uncompress_typed_rejects_partial_element() {
        let compressed = compress(&[1, 2, 3, 4, 5]).unwrap();
        let result: Result<Vec<i32>, _> = uncompress_typed(&compressed);
        assert!(matches!(result, Err(BridgeError::InvalidInput(_))));
    }

    #[test]
    fn test_uncompress_garbage_is_uncompress_failure() {
        let result = uncompress(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(
            result,
            Err(BridgeError::CodecFailure {
                op: CodecOp::Uncompress,
                ..
            })
        ));
    }

    #[test]
    fn test_shuffle_typed_roundtrip_and_improves_compression() {
        let values: Vec<i32> = (0..4096).map(|i| i * 3).collect();
        let shuffled = shuffle_typed(&values).unwrap();
        assert_eq!(shuffled.len(), values.len() * 4);
        let restored: Vec<i32> = unshuffle_typed(&shuffled).unwrap();
        assert_eq!(restored, values);

        let plain = compress_typed(&values).unwrap();
        let after_shuffle = compress(&shuffled).unwrap();
        assert!(after_shuffle.len() < plain.len());
    }

    #[test]
    fn test_shuffle_bytes_by_type() {
        let longs: Vec<i64> = vec![1, -1, 42, i64::MAX, 0, 7, 8, 9, 10];
        let bytes: &[u8] = bytemuck::cast_slice(&longs);
        let shuffled = shuffle_bytes(bytes, BitShuffleType::Long).unwrap();
        assert_eq!(shuffle_typed(&longs).unwrap(), shuffled);
        assert_eq!(unshuffle_bytes(&shuffled, BitShuffleType::Long).unwrap(), bytes);
        assert!(shuffle_bytes(&bytes[..5], BitShuffleType::Short).is_err());
    }

    #[test]
    fn test_explicit_codec() {
        let codec = ZstdCodec::new(1);
        let data = vec![9u8; 2048];
        let compressed = compress_with(&codec, &data).unwrap();
        assert_eq!(uncompress_with(&codec, &compressed).unwrap(), data);
    }
}
