//! This module contains the pure, stateless kernel for bit-shuffling streams of
//! fixed-width elements.
//!
//! Bit-shuffling transposes an `n x (8 * elem_size)` bit matrix: the output
//! holds one bit-plane per bit position of an element, each plane `n / 8` bytes
//! long. Bit `k` of byte `j` of element `i` lands in plane `8 * j + k`, at bit
//! `i % 8` of byte `i / 8`. Typed data whose high bits are mostly constant then
//! compresses far better.
//!
//! Elements are processed in blocks whose element count is a multiple of 8.
//! The trailing `size % 8` elements are copied through unchanged. This module
//! is PURE RUST and panic-free for in-bounds inputs.

use crate::error::BridgeError;

/// Target block size in bytes.
const TARGET_BLOCK_SIZE_B: usize = 8192;
/// Block element counts are always a multiple of this.
const BLOCKED_MULT: usize = 8;
const MIN_RECOMMEND_BLOCK: usize = 128;

/// Number of elements per block for a given element size.
pub fn default_block_size(elem_size: usize) -> usize {
    let block = TARGET_BLOCK_SIZE_B / elem_size.max(1);
    let block = (block / BLOCKED_MULT) * BLOCKED_MULT;
    block.max(MIN_RECOMMEND_BLOCK)
}

//==================================================================================
// 1. Core Logic (The "Engine")
//==================================================================================

/// Transposes one block. `n` is a multiple of 8 and both slices are `n * elem_size` bytes.
fn trans_bit_elem(input: &[u8], output: &mut [u8], n: usize, elem_size: usize) {
    let plane_len = n / 8;
    output.fill(0);
    for (i, element) in input.chunks_exact(elem_size).enumerate() {
        let (byte_idx, bit) = (i / 8, i % 8);
        for (j, &byte) in element.iter().enumerate() {
            if byte == 0 {
                continue;
            }
            for k in 0..8 {
                if (byte >> k) & 1 == 1 {
                    output[(8 * j + k) * plane_len + byte_idx] |= 1 << bit;
                }
            }
        }
    }
}

/// Inverse of `trans_bit_elem`.
fn untrans_bit_elem(input: &[u8], output: &mut [u8], n: usize, elem_size: usize) {
    let plane_len = n / 8;
    output.fill(0);
    for (plane_idx, plane) in input.chunks_exact(plane_len).enumerate() {
        let (j, k) = (plane_idx / 8, plane_idx % 8);
        for (byte_idx, &byte) in plane.iter().enumerate() {
            if byte == 0 {
                continue;
            }
            for bit in 0..8 {
                if (byte >> bit) & 1 == 1 {
                    let i = byte_idx * 8 + bit;
                    output[i * elem_size + j] |= 1 << k;
                }
            }
        }
    }
}

/// Runs `kernel` over full blocks, then over the last block rounded down to a
/// multiple of 8 elements, then copies the leftover elements verbatim.
fn blocked_apply(
    input: &[u8],
    output: &mut [u8],
    size: usize,
    elem_size: usize,
    kernel: fn(&[u8], &mut [u8], usize, usize),
) -> usize {
    let block = default_block_size(elem_size);
    let mut done = 0;

    while size - done >= block {
        let range = done * elem_size..(done + block) * elem_size;
        kernel(&input[range.clone()], &mut output[range], block, elem_size);
        done += block;
    }

    let remaining = size - done;
    let last_block = remaining - remaining % BLOCKED_MULT;
    if last_block > 0 {
        let range = done * elem_size..(done + last_block) * elem_size;
        kernel(&input[range.clone()], &mut output[range], last_block, elem_size);
        done += last_block;
    }

    let tail = done * elem_size..size * elem_size;
    output[tail.clone()].copy_from_slice(&input[tail]);

    size * elem_size
}

fn checked_total(input: &[u8], output: &[u8], size: usize, elem_size: usize) -> Result<usize, BridgeError> {
    if elem_size == 0 {
        return Err(BridgeError::InvalidInput("element size must be positive".to_string()));
    }
    let total = size.checked_mul(elem_size).ok_or_else(|| {
        BridgeError::InvalidInput(format!("{} elements of {} bytes overflows", size, elem_size))
    })?;
    if input.len() < total || output.len() < total {
        return Err(BridgeError::InvalidInput(format!(
            "bit-shuffle of {} bytes needs input {} and output {} bytes to be large enough",
            total,
            input.len(),
            output.len()
        )));
    }
    Ok(total)
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Bit-shuffles `size` elements of `elem_size` bytes from `input` into `output`.
/// Returns the number of bytes processed (`size * elem_size`).
pub fn bitshuffle(
    input: &[u8],
    output: &mut [u8],
    size: usize,
    elem_size: usize,
) -> Result<usize, BridgeError> {
    checked_total(input, output, size, elem_size)?;
    Ok(blocked_apply(input, output, size, elem_size, trans_bit_elem))
}

/// The exact inverse of [`bitshuffle`] for the same `size` and `elem_size`.
pub fn bitunshuffle(
    input: &[u8],
    output: &mut [u8],
    size: usize,
    elem_size: usize,
) -> Result<usize, BridgeError> {
    checked_total(input, output, size, elem_size)?;
    Ok(blocked_apply(input, output, size, elem_size, untrans_bit_elem))
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(original: &[u8], elem_size: usize) {
        let size = original.len() / elem_size;
        let mut shuffled = vec![0u8; original.len()];
        let n = bitshuffle(original, &mut shuffled, size, elem_size).unwrap();
        assert_eq!(n, size * elem_size);

        let mut restored = vec![0u8; original.len()];
        bitunshuffle(&shuffled, &mut restored, size, elem_size).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_known_bit_planes_for_bytes() {
        // Bit 0 of every element set -> plane 0 is all ones.
        let input = [0x01u8; 8];
        let mut output = [0u8; 8];
        bitshuffle(&input, &mut output, 8, 1).unwrap();
        assert_eq!(output, [0xFF, 0, 0, 0, 0, 0, 0, 0]);

        // All bits of element 0 set -> bit 0 of every plane.
        let input = [0xFFu8, 0, 0, 0, 0, 0, 0, 0];
        bitshuffle(&input, &mut output, 8, 1).unwrap();
        assert_eq!(output, [0x01; 8]);
    }

    #[test]
    fn test_known_bit_planes_for_u16() {
        // Element 1 = 0x0100 (little-endian [0x00, 0x01]) -> plane 8 (byte 1, bit 0), bit 1.
        let mut input = [0u8; 16];
        input[2] = 0x00;
        input[3] = 0x01;
        let mut output = [0u8; 16];
        bitshuffle(&input, &mut output, 8, 2).unwrap();
        let mut expected = [0u8; 16];
        expected[8] = 0b0000_0010;
        assert_eq!(output, expected);
    }

    #[test]
    fn test_two_int_elements_are_copied_verbatim() {
        let mut original = Vec::new();
        original.extend_from_slice(&0x0011_2233u32.to_le_bytes());
        original.extend_from_slice(&0x4455_6677u32.to_le_bytes());
        let mut shuffled = vec![0u8; 8];
        bitshuffle(&original, &mut shuffled, 2, 4).unwrap();
        assert_eq!(shuffled, original);
        roundtrip(&original, 4);
    }

    #[test]
    fn test_roundtrip_all_element_sizes_with_tail() {
        let data: Vec<u8> = (0..(8 * 1203)).map(|i| (i * 31 % 256) as u8).collect();
        for elem_size in [1usize, 2, 4, 8] {
            // 1203 elements: several full blocks for small sizes, a partial block and a tail.
            let len = 1203 * elem_size;
            roundtrip(&data[..len], elem_size);
        }
    }

    #[test]
    fn test_roundtrip_odd_element_size() {
        let data: Vec<u8> = (0..(3 * 77)).map(|i| (i * 13 % 256) as u8).collect();
        roundtrip(&data, 3);
    }

    #[test]
    fn test_short_output_is_invalid_input() {
        let input = [0u8; 16];
        let mut output = [0u8; 8];
        let result = bitshuffle(&input, &mut output, 4, 4);
        assert!(matches!(result, Err(BridgeError::InvalidInput(_))));
    }

    #[test]
    fn test_default_block_size() {
        assert_eq!(default_block_size(1), 8192);
        assert_eq!(default_block_size(4), 2048);
        assert_eq!(default_block_size(3), 2728);
        assert_eq!(default_block_size(256), 128);
    }
}
