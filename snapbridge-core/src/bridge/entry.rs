// In: src/bridge/entry.rs

//! The Entry Points. Each method is a thin composition of
//! parse raw arguments -> dispatch -> translate, and has the exact shape a
//! host binding calls: signed 32-bit offsets and lengths in, a plain value out,
//! errors delivered through `HostRuntime::raise_error`.

use log::debug;

use crate::bridge::dispatch::{self, ShuffleDirection, ShuffleRequest};
use crate::bridge::translate::translate;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BufferRole};
use crate::host::HostRuntime;
use crate::kernels::AnyCodec;
use crate::types::buffer::non_negative;
use crate::types::{BufferHandle, ElementSize, Window};
use crate::VERSION;

/// A host's view of the bridge: the host it raises errors into plus the
/// configuration every call reads.
pub struct Bridge<'h, H: HostRuntime + ?Sized> {
    host: &'h H,
    codec: AnyCodec,
    config: BridgeConfig,
}

impl<'h, H: HostRuntime + ?Sized> Bridge<'h, H> {
    pub fn new(host: &'h H, config: &BridgeConfig) -> Self {
        debug!("bridge created with {:?}", config);
        Self {
            host,
            codec: AnyCodec::from_config(config),
            config: config.clone(),
        }
    }

    pub fn with_defaults(host: &'h H) -> Self {
        Self::new(host, &BridgeConfig::default())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn codec(&self) -> &AnyCodec {
        &self.codec
    }

    //------------------------------------------------------------------------------
    // Compression family
    //------------------------------------------------------------------------------

    pub fn raw_compress(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        input_length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        let result = (|| -> Result<i32, BridgeError> {
            let window = Window::from_raw(input_offset, input_length)?;
            let out_offset = non_negative(output_offset, "output offset")?;
            let n = dispatch::raw_compress(self.host, &self.codec, input, window, output, out_offset)?;
            to_host_int(n)
        })();
        translate(self.host, result)
    }

    pub fn raw_uncompress(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        input_length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        let result = (|| -> Result<i32, BridgeError> {
            let window = Window::from_raw(input_offset, input_length)?;
            let out_offset = non_negative(output_offset, "output offset")?;
            let n =
                dispatch::raw_uncompress(self.host, &self.codec, input, window, output, out_offset)?;
            to_host_int(n)
        })();
        translate(self.host, result)
    }

    pub fn max_compressed_length(&self, source_bytes: i32) -> i32 {
        let result = (|| -> Result<i32, BridgeError> {
            let n = non_negative(source_bytes, "length")?;
            to_host_int(dispatch::max_compressed_length(&self.codec, n)?)
        })();
        translate(self.host, result)
    }

    pub fn uncompressed_length(&self, input: BufferHandle<'_, H>, offset: i32, length: i32) -> i32 {
        let result = (|| -> Result<i32, BridgeError> {
            let window = Window::from_raw(offset, length)?;
            to_host_int(dispatch::uncompressed_length(self.host, &self.codec, input, window)?)
        })();
        translate(self.host, result)
    }

    pub fn is_valid_compressed_buffer(
        &self,
        input: BufferHandle<'_, H>,
        offset: i32,
        length: i32,
    ) -> bool {
        let result = Window::from_raw(offset, length).and_then(|window| {
            dispatch::is_valid_compressed_buffer(self.host, &self.codec, input, window)
        });
        translate(self.host, result)
    }

    //------------------------------------------------------------------------------
    // Raw copy
    //------------------------------------------------------------------------------

    pub fn array_copy(
        &self,
        src: BufferHandle<'_, H>,
        offset: i32,
        length: i32,
        dest: BufferHandle<'_, H>,
        dest_offset: i32,
    ) {
        let result = (|| -> Result<(), BridgeError> {
            let window = Window::from_raw(offset, length)?;
            let dest_offset = non_negative(dest_offset, "destination offset")?;
            dispatch::array_copy(
                self.host,
                src,
                window,
                dest,
                dest_offset,
                self.config.allow_overlapping_copy,
            )
        })();
        translate(self.host, result)
    }

    //------------------------------------------------------------------------------
    // Bit-shuffle family
    //------------------------------------------------------------------------------

    pub fn bit_shuffle(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        type_size: i32,
        length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        self.shuffle(
            ShuffleDirection::Shuffle,
            input,
            input_offset,
            type_size,
            length,
            output,
            output_offset,
        )
    }

    pub fn bit_unshuffle(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        type_size: i32,
        length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        self.shuffle(
            ShuffleDirection::Unshuffle,
            input,
            input_offset,
            type_size,
            length,
            output,
            output_offset,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn shuffle(
        &self,
        direction: ShuffleDirection,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        type_size: i32,
        length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        let result = (|| -> Result<i32, BridgeError> {
            let request = ShuffleRequest {
                input_offset: non_negative(input_offset, "input offset")?,
                element_size: ElementSize::from_raw(type_size)?,
                length: non_negative(length, "length")?,
                output_offset: non_negative(output_offset, "output offset")?,
            };
            let n = dispatch::shuffle(
                self.host,
                direction,
                input,
                output,
                request,
                self.config.shuffle_remainder,
            )?;
            to_host_int(n)
        })();
        translate(self.host, result)
    }

    //------------------------------------------------------------------------------
    // Direct-only variants
    //------------------------------------------------------------------------------

    /// As [`Bridge::raw_compress`], but both buffers must be off-heap.
    pub fn compress_direct(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        input_length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        match require_direct(input, output) {
            Ok(()) => self.raw_compress(input, input_offset, input_length, output, output_offset),
            Err(e) => translate(self.host, Err(e)),
        }
    }

    pub fn uncompress_direct(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        input_length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        match require_direct(input, output) {
            Ok(()) => self.raw_uncompress(input, input_offset, input_length, output, output_offset),
            Err(e) => translate(self.host, Err(e)),
        }
    }

    pub fn shuffle_direct(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        type_size: i32,
        length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        match require_direct(input, output) {
            Ok(()) => self.bit_shuffle(input, input_offset, type_size, length, output, output_offset),
            Err(e) => translate(self.host, Err(e)),
        }
    }

    pub fn unshuffle_direct(
        &self,
        input: BufferHandle<'_, H>,
        input_offset: i32,
        type_size: i32,
        length: i32,
        output: BufferHandle<'_, H>,
        output_offset: i32,
    ) -> i32 {
        match require_direct(input, output) {
            Ok(()) => {
                self.bit_unshuffle(input, input_offset, type_size, length, output, output_offset)
            }
            Err(e) => translate(self.host, Err(e)),
        }
    }
}

//==================================================================================
// Host-independent queries
//==================================================================================

/// The fixed version string of this build.
pub fn native_library_version() -> &'static str {
    VERSION
}

/// The bit-shuffle transform is portable Rust, so it is always available.
pub fn supports_bit_shuffle() -> bool {
    true
}

fn require_direct<H: HostRuntime + ?Sized>(
    input: BufferHandle<'_, H>,
    output: BufferHandle<'_, H>,
) -> Result<(), BridgeError> {
    if !input.is_off_heap() {
        return Err(BridgeError::BufferUnavailable {
            role: BufferRole::Source,
        });
    }
    if !output.is_off_heap() {
        return Err(BridgeError::BufferUnavailable {
            role: BufferRole::Destination,
        });
    }
    Ok(())
}

fn to_host_int(n: usize) -> Result<i32, BridgeError> {
    i32::try_from(n)
        .map_err(|_| BridgeError::InvalidInput(format!("result {} does not fit in an i32", n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::host::test_host::{TestArray, TestDirect, TestHost};

    #[test]
    fn test_version_is_semver() {
        let parts: Vec<&str> = native_library_version().split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
        assert!(supports_bit_shuffle());
    }

    #[test]
    fn test_negative_arguments_raise_parsing_error() {
        let host = TestHost::new();
        let bridge = Bridge::with_defaults(&host);
        let src = TestArray::new(b"abc");
        let dst = TestArray::zeroed(64);

        let n = bridge.raw_compress(
            BufferHandle::HeapBacked(&src),
            -1,
            3,
            BufferHandle::HeapBacked(&dst),
            0,
        );
        assert_eq!(n, 0);
        assert_eq!(bridge.max_compressed_length(-5), 0);
        assert_eq!(host.raised(), vec![ErrorCode::ParsingError, ErrorCode::ParsingError]);
        // Argument errors are caught before any buffer is resolved.
        assert_eq!(host.pins(), 0);
    }

    #[test]
    fn test_direct_variants_reject_heap_buffers() {
        let host = TestHost::new();
        let bridge = Bridge::with_defaults(&host);
        let heap = TestArray::new(b"abcdefgh");
        let direct = TestDirect::zeroed(64);

        bridge.compress_direct(
            BufferHandle::HeapBacked(&heap),
            0,
            8,
            BufferHandle::OffHeap(&direct),
            0,
        );
        bridge.shuffle_direct(
            BufferHandle::OffHeap(&direct),
            0,
            4,
            8,
            BufferHandle::HeapBacked(&heap),
            0,
        );
        assert_eq!(
            host.raised(),
            vec![ErrorCode::NotADirectBuffer, ErrorCode::NotADirectBuffer]
        );
        assert_eq!(host.pins(), 0);
    }

    #[test]
    fn test_direct_roundtrip() {
        let host = TestHost::new();
        let bridge = Bridge::with_defaults(&host);
        let text = b"direct buffers never move, direct buffers never move";
        let src = TestDirect::new(text);
        let max = bridge.max_compressed_length(text.len() as i32);
        let compressed = TestDirect::zeroed(max as usize);
        let restored = TestDirect::zeroed(text.len());

        let n = bridge.compress_direct(
            BufferHandle::OffHeap(&src),
            0,
            text.len() as i32,
            BufferHandle::OffHeap(&compressed),
            0,
        );
        assert!(n > 0);
        let m = bridge.uncompress_direct(
            BufferHandle::OffHeap(&compressed),
            0,
            n,
            BufferHandle::OffHeap(&restored),
            0,
        );
        assert_eq!(m as usize, text.len());
        assert_eq!(restored.to_vec(), text);
        assert!(host.raised().is_empty());
    }

    #[test]
    fn test_overlapping_copy_follows_config() {
        let host = TestHost::new();
        let strict = BridgeConfig {
            allow_overlapping_copy: false,
            ..BridgeConfig::default()
        };
        let bridge = Bridge::new(&host, &strict);
        let array = TestArray::new(b"abcdefgh");
        bridge.array_copy(
            BufferHandle::HeapBacked(&array),
            0,
            4,
            BufferHandle::HeapBacked(&array),
            2,
        );
        assert_eq!(host.raised(), vec![ErrorCode::ParsingError]);
        assert_eq!(array.to_vec(), b"abcdefgh");
        host.assert_balanced();
    }
}
