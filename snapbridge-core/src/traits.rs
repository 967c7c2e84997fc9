//! This module defines the seams between the bridge and the external codecs.

use crate::error::BridgeError;

/// A block compression codec, treated as a black box by the dispatcher.
///
/// Implementations are stateless: every method may be called from any thread
/// on disjoint buffers without coordination.
pub trait BlockCodec {
    /// Upper bound on the compressed size of `input_len` bytes, or 0 if the
    /// codec cannot compress an input that large.
    fn max_compressed_length(&self, input_len: usize) -> usize;

    /// Compresses `input` into `output` and returns the compressed length.
    /// `output` is at least `max_compressed_length(input.len())` bytes.
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, BridgeError>;

    /// Reads the decoded length from the compressed header. O(1) for Snappy.
    fn uncompressed_length(&self, input: &[u8]) -> Result<usize, BridgeError>;

    /// Decodes `input` into `output`, which is exactly `uncompressed_length(input)` bytes.
    fn uncompress(&self, input: &[u8], output: &mut [u8]) -> Result<(), BridgeError>;

    /// `false` is an ordinary answer here, never an error.
    fn is_valid_compressed_buffer(&self, input: &[u8]) -> bool;
}
