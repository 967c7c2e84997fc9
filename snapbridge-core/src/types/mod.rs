//! This module defines the small, strongly-typed values that flow through every
//! bridge call: buffer handles, offset/length windows and shuffle element sizes.
//!
//! None of these outlive a single entry-point invocation.

pub mod bitshuffle_type;
pub mod buffer;

// Re-export the main type(s) for easier access.
pub use bitshuffle_type::BitShuffleType;
pub use buffer::{BufferHandle, ElementSize, Window};
