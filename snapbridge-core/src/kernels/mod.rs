//! The codec kernels the bridge dispatches to.
//!
//! Each kernel works on plain slices and knows nothing about hosts, pinning or
//! error codes beyond returning a `BridgeError`.

pub mod bitshuffle;
pub mod snappy;
pub mod zstd;

use crate::config::{BridgeConfig, CodecKind};
use crate::error::BridgeError;
use crate::traits::BlockCodec;

pub use self::bitshuffle::{bitshuffle, bitunshuffle};
pub use self::snappy::SnappyCodec;
pub use self::zstd::ZstdCodec;

/// The codec selected by a `BridgeConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyCodec {
    Snappy(SnappyCodec),
    Zstd(ZstdCodec),
}

impl AnyCodec {
    pub fn from_config(config: &BridgeConfig) -> Self {
        match config.codec {
            CodecKind::Snappy => AnyCodec::Snappy(SnappyCodec),
            CodecKind::Zstd => AnyCodec::Zstd(ZstdCodec::new(config.zstd_level)),
        }
    }

    fn inner(&self) -> &dyn BlockCodec {
        match self {
            AnyCodec::Snappy(c) => c,
            AnyCodec::Zstd(c) => c,
        }
    }
}

impl Default for AnyCodec {
    fn default() -> Self {
        AnyCodec::Snappy(SnappyCodec)
    }
}

impl BlockCodec for AnyCodec {
    fn max_compressed_length(&self, input_len: usize) -> usize {
        self.inner().max_compressed_length(input_len)
    }

    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, BridgeError> {
        self.inner().compress(input, output)
    }

    fn uncompressed_length(&self, input: &[u8]) -> Result<usize, BridgeError> {
        self.inner().uncompressed_length(input)
    }

    fn uncompress(&self, input: &[u8], output: &mut [u8]) -> Result<(), BridgeError> {
        self.inner().uncompress(input, output)
    }

    fn is_valid_compressed_buffer(&self, input: &[u8]) -> bool {
        self.inner().is_valid_compressed_buffer(input)
    }
}
