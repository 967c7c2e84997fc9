// In: src/bridge/dispatch.rs

//! The Codec Dispatcher: one function per operation, all with the same shape.
//!
//!   resolve buffer(s) -> carve windows -> run the codec -> drop guards -> Result
//!
//! Every function here returns before the host is asked to raise anything, and
//! every `ResolvedBuffer` is a local whose drop releases its pin, so the pin
//! count is balanced on success, on codec failure and on resolution failure.

use log::{debug, trace};

use crate::bridge::resolver::{copy_window, resolve, resolve_pair, split_windows};
use crate::config::RemainderPolicy;
use crate::error::{BridgeError, BufferRole, CodecOp};
use crate::host::HostRuntime;
use crate::kernels::bitshuffle::{bitshuffle, bitunshuffle};
use crate::traits::BlockCodec;
use crate::types::{BufferHandle, ElementSize, Window};

//==================================================================================
// 1. Compression Family
//==================================================================================

/// Compresses `input_window` of `input` into `output` starting at `output_offset`.
///
/// The codec may use everything from `output_offset` to the end of the output
/// buffer. Callers size that space with `max_compressed_length`; if it is too
/// small the codec reports a `CodecFailure`.
pub fn raw_compress<H, C>(
    host: &H,
    codec: &C,
    input: BufferHandle<'_, H>,
    input_window: Window,
    output: BufferHandle<'_, H>,
    output_offset: usize,
) -> Result<usize, BridgeError>
where
    H: HostRuntime + ?Sized,
    C: BlockCodec + ?Sized,
{
    if codec.max_compressed_length(input_window.length) == 0 {
        return Err(BridgeError::InvalidInput(format!(
            "input of {} bytes is too large to compress",
            input_window.length
        )));
    }

    let (src, mut dst) = resolve_pair(host, input, output)?;
    if output_offset > dst.capacity() {
        return Err(BridgeError::InvalidInput(format!(
            "output offset {} exceeds buffer capacity {}",
            output_offset,
            dst.capacity()
        )));
    }
    let output_window = Window::new(output_offset, dst.capacity() - output_offset);
    let (src_bytes, dst_bytes) = split_windows(&src, input_window, &mut dst, output_window)?;

    let compressed = codec.compress(src_bytes, dst_bytes)?;
    trace!(
        "raw_compress: {} -> {} bytes (src pinned: {}, dst pinned: {})",
        input_window.length,
        compressed,
        src.is_pinned(),
        dst.is_pinned()
    );
    Ok(compressed)
}

/// Decompresses `input_window` of `input` into `output` at `output_offset`.
///
/// The reported length is the one read from the compressed header before
/// decoding; the decode only confirms it.
pub fn raw_uncompress<H, C>(
    host: &H,
    codec: &C,
    input: BufferHandle<'_, H>,
    input_window: Window,
    output: BufferHandle<'_, H>,
    output_offset: usize,
) -> Result<usize, BridgeError>
where
    H: HostRuntime + ?Sized,
    C: BlockCodec + ?Sized,
{
    let (src, mut dst) = resolve_pair(host, input, output)?;
    let compressed = src.window(input_window)?;

    let uncompressed_len = codec
        .uncompressed_length(compressed)
        .map_err(as_uncompress_failure)?;
    let output_window = Window::new(output_offset, uncompressed_len);
    // A header promising more than the destination holds is usually noise.
    if output_window.check_within(dst.capacity()).is_err()
        && !codec.is_valid_compressed_buffer(compressed)
    {
        return Err(BridgeError::codec(
            CodecOp::Uncompress,
            format!("corrupt input declaring {} bytes", uncompressed_len),
        ));
    }
    let (src_bytes, dst_bytes) = split_windows(&src, input_window, &mut dst, output_window)?;

    codec.uncompress(src_bytes, dst_bytes)?;
    trace!(
        "raw_uncompress: {} -> {} bytes",
        input_window.length,
        uncompressed_len
    );
    Ok(uncompressed_len)
}

/// A header that cannot be parsed is reported the same way as a body that
/// cannot be decoded when the caller asked for decompression.
fn as_uncompress_failure(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::CodecFailure { reason, .. } => BridgeError::CodecFailure {
            op: CodecOp::Uncompress,
            reason,
        },
        other => other,
    }
}

/// Pure function of the input size; touches no buffers.
pub fn max_compressed_length<C: BlockCodec + ?Sized>(
    codec: &C,
    source_bytes: usize,
) -> Result<usize, BridgeError> {
    match codec.max_compressed_length(source_bytes) {
        0 => Err(BridgeError::InvalidInput(format!(
            "input of {} bytes is too large to compress",
            source_bytes
        ))),
        n => Ok(n),
    }
}

pub fn uncompressed_length<H, C>(
    host: &H,
    codec: &C,
    input: BufferHandle<'_, H>,
    window: Window,
) -> Result<usize, BridgeError>
where
    H: HostRuntime + ?Sized,
    C: BlockCodec + ?Sized,
{
    let src = resolve(host, input, BufferRole::Source)?;
    codec.uncompressed_length(src.window(window)?)
}

/// `Ok(false)` is a normal answer. Only resolution and window errors fail.
pub fn is_valid_compressed_buffer<H, C>(
    host: &H,
    codec: &C,
    input: BufferHandle<'_, H>,
    window: Window,
) -> Result<bool, BridgeError>
where
    H: HostRuntime + ?Sized,
    C: BlockCodec + ?Sized,
{
    let src = resolve(host, input, BufferRole::Source)?;
    Ok(codec.is_valid_compressed_buffer(src.window(window)?))
}

//==================================================================================
// 2. Raw Copy
//==================================================================================

/// Copies `window` of `src` to `dest` at `dest_offset`. No codec involved.
pub fn array_copy<H: HostRuntime + ?Sized>(
    host: &H,
    src: BufferHandle<'_, H>,
    window: Window,
    dest: BufferHandle<'_, H>,
    dest_offset: usize,
    allow_overlap: bool,
) -> Result<(), BridgeError> {
    let (src_buf, mut dst_buf) = resolve_pair(host, src, dest)?;
    copy_window(&src_buf, window, &mut dst_buf, dest_offset, allow_overlap)
}

//==================================================================================
// 3. Bit-Shuffle Family
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleDirection {
    Shuffle,
    Unshuffle,
}

/// The parameters of one shuffle call, in host order.
#[derive(Debug, Clone, Copy)]
pub struct ShuffleRequest {
    pub input_offset: usize,
    pub element_size: ElementSize,
    pub length: usize,
    pub output_offset: usize,
}

/// Shuffles or unshuffles `length` bytes. Returns the bytes processed, which is
/// less than `length` only under `RemainderPolicy::Truncate`.
pub fn shuffle<H: HostRuntime + ?Sized>(
    host: &H,
    direction: ShuffleDirection,
    input: BufferHandle<'_, H>,
    output: BufferHandle<'_, H>,
    request: ShuffleRequest,
    policy: RemainderPolicy,
) -> Result<usize, BridgeError> {
    let elem_size = request.element_size.get();
    let n_elements = request.element_size.element_count(request.length, policy)?;
    let processed_len = n_elements * elem_size;

    let (src, mut dst) = resolve_pair(host, input, output)?;
    let (src_bytes, dst_bytes) = split_windows(
        &src,
        Window::new(request.input_offset, processed_len),
        &mut dst,
        Window::new(request.output_offset, processed_len),
    )?;

    let processed = match direction {
        ShuffleDirection::Shuffle => bitshuffle(src_bytes, dst_bytes, n_elements, elem_size),
        ShuffleDirection::Unshuffle => bitunshuffle(src_bytes, dst_bytes, n_elements, elem_size),
    }
    .map_err(|e| match e {
        BridgeError::InvalidInput(reason) => BridgeError::codec(
            match direction {
                ShuffleDirection::Shuffle => CodecOp::Shuffle,
                ShuffleDirection::Unshuffle => CodecOp::Unshuffle,
            },
            reason,
        ),
        other => other,
    })?;

    if processed_len != request.length {
        debug!(
            "{:?}: truncated {} trailing bytes (element size {})",
            direction,
            request.length - processed_len,
            elem_size
        );
    }
    Ok(processed)
}
